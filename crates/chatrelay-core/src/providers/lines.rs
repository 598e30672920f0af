//! Incremental line decoding over a chunked response body
//!
//! Both streaming wire formats this crate speaks are line-delimited: the
//! OpenAI-style endpoint sends `data: {...}` frames, Ollama sends bare JSON
//! lines. Chunk boundaries do not respect line boundaries, so complete lines
//! are re-assembled here before they reach a provider's frame decoder.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, StreamExt};

use super::error::{ProviderError, ProviderResult};
use super::traits::StreamResponse;
use crate::types::CancellationToken;

/// Buffers body bytes and drains complete lines
///
/// Lines are returned without their terminator; a trailing `\r` is stripped
/// so CRLF bodies decode the same as LF bodies.
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append a chunk and return every line it completed
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            out.push(line);
        }
        out
    }

    /// Any trailing bytes that never saw a newline
    pub(crate) fn finish(self) -> Option<Vec<u8>> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf)
        }
    }
}

struct DecodeState<D, M> {
    provider: &'static str,
    body: Option<BoxStream<'static, Result<Vec<u8>, reqwest::Error>>>,
    lines: Option<LineBuffer>,
    pending: VecDeque<String>,
    done: bool,
    cancel: CancellationToken,
    decode: D,
    map_transport: M,
}

/// Turn a line-delimited response body into a delta stream
///
/// `decode` maps one complete line to an optional text delta (`None` for
/// lines that carry nothing, e.g. keep-alives or the `[DONE]` sentinel); a
/// decode error is terminal for the stream. `map_transport` classifies
/// mid-body network failures, which differ per provider. The cancellation
/// token is observed before every yielded item and while awaiting the next
/// body chunk.
pub(crate) fn decode_lines<D, M>(
    provider: &'static str,
    response: reqwest::Response,
    cancel: CancellationToken,
    decode: D,
    map_transport: M,
) -> StreamResponse
where
    D: Fn(&str) -> ProviderResult<Option<String>> + Send + 'static,
    M: Fn(reqwest::Error) -> ProviderError + Send + 'static,
{
    let body = response
        .bytes_stream()
        .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
        .boxed();

    let state = DecodeState {
        provider,
        body: Some(body),
        lines: Some(LineBuffer::new()),
        pending: VecDeque::new(),
        done: false,
        cancel,
        decode,
        map_transport,
    };

    let stream = stream::unfold(state, |mut st| async move {
        loop {
            if st.done {
                return None;
            }
            if st.cancel.is_cancelled() {
                st.done = true;
                return Some((Err(ProviderError::Cancelled), st));
            }
            if let Some(delta) = st.pending.pop_front() {
                return Some((Ok(delta), st));
            }

            let Some(body) = st.body.as_mut() else {
                st.done = true;
                return None;
            };

            let chunk = tokio::select! {
                _ = st.cancel.cancelled() => {
                    st.done = true;
                    return Some((Err(ProviderError::Cancelled), st));
                }
                chunk = body.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    let lines = match st.lines.as_mut() {
                        Some(buffer) => buffer.push(&bytes),
                        None => Vec::new(),
                    };
                    for raw in lines {
                        match decode_raw(st.provider, &raw, &st.decode) {
                            Ok(Some(delta)) => st.pending.push_back(delta),
                            Ok(None) => {}
                            Err(err) => {
                                st.done = true;
                                return Some((Err(err), st));
                            }
                        }
                    }
                }
                Some(Err(err)) => {
                    st.done = true;
                    return Some((Err((st.map_transport)(err)), st));
                }
                None => {
                    st.body = None;
                    // A final line without a newline still counts.
                    if let Some(tail) = st.lines.take().and_then(LineBuffer::finish) {
                        match decode_raw(st.provider, &tail, &st.decode) {
                            Ok(Some(delta)) => st.pending.push_back(delta),
                            Ok(None) => {}
                            Err(err) => {
                                st.done = true;
                                return Some((Err(err), st));
                            }
                        }
                    }
                }
            }
        }
    });

    Box::pin(stream)
}

fn decode_raw<D>(provider: &'static str, raw: &[u8], decode: &D) -> ProviderResult<Option<String>>
where
    D: Fn(&str) -> ProviderResult<Option<String>>,
{
    let line = std::str::from_utf8(raw)
        .map_err(|err| ProviderError::invalid_response(provider, format!("non-UTF-8 line: {err}")))?;
    decode(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split_within_one_chunk() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push(b"one\ntwo\n");
        assert_eq!(lines, vec![b"one".to_vec(), b"two".to_vec()]);
        assert!(buffer.finish().is_none());
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"{\"response\":").is_empty());
        let lines = buffer.push(b"\"hi\"}\n");
        assert_eq!(lines, vec![br#"{"response":"hi"}"#.to_vec()]);
    }

    #[test]
    fn test_crlf_terminators() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push(b"data: {}\r\n\r\n");
        assert_eq!(lines, vec![b"data: {}".to_vec(), b"".to_vec()]);
    }

    #[test]
    fn test_trailing_partial_line() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"no newline").is_empty());
        assert_eq!(buffer.finish(), Some(b"no newline".to_vec()));
    }
}
