//! Core types for chat dispatch
//!
//! This module contains the shared types used across the dispatcher and the
//! provider adapters.

mod cancellation;
mod message;
mod model;

pub use cancellation::CancellationToken;
pub use message::{Message, MessageRole};
pub use model::{ProviderKind, ProviderMetadata, UnknownProvider};
