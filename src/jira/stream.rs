//! Fixed-size re-chunking of an upstream byte stream.
//!
//! The returned stream owns its source. Dropping it on any exit path, normal
//! exhaustion, early abandonment by the consumer, or a mid-read error,
//! releases the underlying connection exactly once through `Drop`.

use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

use super::error::{JiraError, Result};

/// Attachment chunk size, matching the proxy's streaming granularity.
pub const CHUNK_SIZE: usize = 64 * 1024;

struct ChunkState<S> {
  source: Pin<Box<S>>,
  buffer: BytesMut,
  done: bool,
}

/// Re-chunk `source` into `chunk_size`-byte pieces (the final piece may be
/// shorter). Empty source chunks are absorbed; the output never contains an
/// empty chunk.
pub fn chunk_stream<S>(source: S, chunk_size: usize) -> impl Stream<Item = Result<Bytes>> + Send
where
  S: Stream<Item = Result<Bytes>> + Send + 'static,
{
  let state = ChunkState {
    source: Box::pin(source),
    buffer: BytesMut::new(),
    done: false,
  };

  futures::stream::try_unfold(state, move |mut state| async move {
    loop {
      if state.buffer.len() >= chunk_size {
        let chunk = state.buffer.split_to(chunk_size).freeze();
        return Ok(Some((chunk, state)));
      }
      if state.done {
        if state.buffer.is_empty() {
          return Ok(None);
        }
        let chunk = state.buffer.split().freeze();
        return Ok(Some((chunk, state)));
      }
      match state.source.next().await {
        Some(Ok(bytes)) => state.buffer.extend_from_slice(&bytes),
        Some(Err(e)) => return Err(e),
        None => state.done = true,
      }
    }
  })
}

/// Classify a failure while reading attachment bytes mid-stream.
pub fn stream_error(e: reqwest::Error) -> JiraError {
  if e.is_timeout() {
    JiraError::Timeout
  } else {
    JiraError::upstream("Attachment stream interrupted")
  }
}
