//! Wire codec shared by the progress and answer streams.
mod chunk_buffer;
mod decoder;
mod frame;

pub use chunk_buffer::ChunkBuffer;
pub use decoder::{
    AnswerProtocol, FrameDecoder, MalformedFrame, ProgressProtocol, WireProtocol, DATA_PREFIX,
};
pub use frame::{AnswerFrame, ProgressFrame, ResultItem, ResultOrigin, StatusValue};
