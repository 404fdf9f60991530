//! Streaming PUT fan-out.
//!
//! A single client body is copied into one pipe per replica. Each pipe is
//! a bounded channel of one chunk, so the copy cannot run ahead of the
//! slowest replica: back-pressure propagates from the backends straight to
//! the client source. Every pipe is closed exactly once when the copy
//! ends, whether the source finished, the source failed, or a replica
//! stopped reading; backends always observe EOF rather than a hung
//! connection.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// Write end of one replica's body pipe.
pub struct PipeWriter {
    chunk_tx: mpsc::Sender<std::io::Result<Bytes>>,
}

impl PipeWriter {
    async fn write(&self, chunk: Bytes) -> bool {
        self.chunk_tx.send(Ok(chunk)).await.is_ok()
    }
}

fn pipe_channel() -> (PipeWriter, mpsc::Receiver<std::io::Result<Bytes>>) {
    let (chunk_tx, chunk_rx) = mpsc::channel(1);
    (PipeWriter { chunk_tx }, chunk_rx)
}

/// A body pipe: the returned [`reqwest::Body`] streams whatever is written
/// into the paired [`PipeWriter`], and reaches EOF when the writer drops.
pub fn body_pipe() -> (PipeWriter, reqwest::Body) {
    let (writer, chunk_rx) = pipe_channel();
    (writer, reqwest::Body::wrap_stream(ReceiverStream::new(chunk_rx)))
}

/// Copy `source` into every pipe in lock step: each chunk is delivered to
/// all pipes before the next chunk is read. A pipe whose reader has gone
/// away aborts the whole transfer. All pipes are closed on return.
pub async fn copy_to_pipes<R>(mut source: R, pipes: Vec<PipeWriter>)
where
    R: AsyncRead + Unpin,
{
    if pipes.is_empty() {
        return;
    }

    let mut buf = BytesMut::with_capacity(COPY_CHUNK_SIZE);
    loop {
        buf.reserve(COPY_CHUNK_SIZE);
        match source.read_buf(&mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let chunk = buf.split().freeze();
                for pipe in &pipes {
                    if !pipe.write(chunk.clone()).await {
                        // a replica stopped consuming; abandon the transfer
                        return;
                    }
                }
            }
            Err(error) => {
                tracing::warn!("source read failed during put fan-out: {}", error);
                break;
            }
        }
    }
    // dropping the writers closes every pipe and the backends see EOF
}
