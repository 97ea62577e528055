use futures_util::StreamExt;
use jobwatch_core::wire::{ChunkBuffer, FrameDecoder, WireProtocol};
use tokio_util::sync::CancellationToken;
use watch_logging::{watch_debug, watch_wire};

use crate::{ChunkStream, StreamError};

/// How a pumped stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpOutcome {
    /// A terminal frame was delivered; the rest of the body is ignored.
    Terminated,
    Cancelled,
    Failed(StreamError),
}

/// Reads `chunks` until a terminal frame, cancellation, or failure.
///
/// Every decoded frame goes to `on_frame`, terminal frames included.
/// Malformed lines are logged and skipped.
pub async fn pump<P, F>(mut chunks: ChunkStream, token: CancellationToken, mut on_frame: F) -> PumpOutcome
where
    P: WireProtocol,
    F: FnMut(P::Frame),
{
    let decoder = FrameDecoder::<P>::new();
    let mut buffer = ChunkBuffer::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => {
                watch_debug!("{} stream cancelled", P::NAME);
                return PumpOutcome::Cancelled;
            }
            next = chunks.next() => next,
        };

        match next {
            Some(Ok(bytes)) => {
                for line in buffer.feed(&bytes) {
                    match decoder.decode_line(&line) {
                        Ok(None) => {}
                        Ok(Some(frame)) => {
                            let terminal = P::is_terminal(&frame);
                            on_frame(frame);
                            if terminal {
                                return PumpOutcome::Terminated;
                            }
                        }
                        Err(err) => watch_wire!("skipping {} line: {err}", P::NAME),
                    }
                }
            }
            Some(Err(err)) => return PumpOutcome::Failed(err),
            None => {
                let error = match buffer.finish() {
                    Some(leftover) => StreamError::Truncated(leftover.len()),
                    None => StreamError::ClosedEarly,
                };
                return PumpOutcome::Failed(error);
            }
        }
    }
}
