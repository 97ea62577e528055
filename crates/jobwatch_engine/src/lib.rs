//! Jobwatch engine: HTTP streams, control calls, and effect execution.
mod control;
mod endpoints;
mod engine;
mod pump;
mod source;
mod types;

pub use control::{ControlClient, ReqwestControl};
pub use endpoints::{EngineConfig, Endpoints};
pub use engine::EngineHandle;
pub use pump::{pump, PumpOutcome};
pub use source::{ByteSource, ChunkStream, ReqwestSource, StreamRequest};
pub use types::{ControlError, EngineError, EngineEvent, StreamError};
