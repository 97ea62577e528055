use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{AnswerFrame, ProgressFrame, StatusValue};

/// Prefix marking a candidate frame line.
pub const DATA_PREFIX: &str = "data: ";

/// A frame vocabulary that can travel over the shared line codec.
pub trait WireProtocol {
    type Frame: DeserializeOwned + fmt::Debug + Send + 'static;

    /// Short name used in diagnostics.
    const NAME: &'static str;

    /// Every `type` tag this protocol understands.
    const FRAME_TYPES: &'static [&'static str];

    /// Whether the stream ends after this frame.
    fn is_terminal(frame: &Self::Frame) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressProtocol;

impl WireProtocol for ProgressProtocol {
    type Frame = ProgressFrame;
    const NAME: &'static str = "progress";
    const FRAME_TYPES: &'static [&'static str] = &["log", "progress", "status"];

    fn is_terminal(frame: &ProgressFrame) -> bool {
        matches!(
            frame,
            ProgressFrame::Status {
                value: StatusValue::Finished | StatusValue::Error | StatusValue::Cancelled
            }
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerProtocol;

impl WireProtocol for AnswerProtocol {
    type Frame = AnswerFrame;
    const NAME: &'static str = "answer";
    const FRAME_TYPES: &'static [&'static str] = &["ping", "sources", "answer", "done", "error"];

    fn is_terminal(frame: &AnswerFrame) -> bool {
        matches!(frame, AnswerFrame::Done | AnswerFrame::Error { .. })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MalformedFrame {
    #[error("line does not start with `data: `")]
    MissingPrefix,
    #[error("{protocol} frame is not valid JSON: {message}")]
    InvalidJson {
        protocol: &'static str,
        message: String,
    },
    #[error("{protocol} frame has no string `type` field")]
    MissingType { protocol: &'static str },
    #[error("{protocol} frame has unknown type `{frame_type}`")]
    UnknownType {
        protocol: &'static str,
        frame_type: String,
    },
    #[error("{protocol} `{frame_type}` frame has invalid fields: {message}")]
    InvalidFields {
        protocol: &'static str,
        frame_type: String,
        message: String,
    },
}

/// Decodes single `data: ` lines into frames of protocol `P`.
pub struct FrameDecoder<P> {
    _protocol: PhantomData<P>,
}

impl<P> Default for FrameDecoder<P> {
    fn default() -> Self {
        Self {
            _protocol: PhantomData,
        }
    }
}

impl<P> fmt::Debug for FrameDecoder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FrameDecoder")
    }
}

impl<P: WireProtocol> FrameDecoder<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one raw stream line.
    ///
    /// Lines that are not data frames (comments, `event:` fields, blank
    /// keep-alives) are not errors: they yield `Ok(None)`.
    pub fn decode_line(&self, line: &str) -> Result<Option<P::Frame>, MalformedFrame> {
        if !line.starts_with(DATA_PREFIX) {
            return Ok(None);
        }
        self.decode(line).map(Some)
    }

    /// Decodes a line already known to be a data frame; anything else is
    /// [`MalformedFrame::MissingPrefix`].
    pub fn decode(&self, line: &str) -> Result<P::Frame, MalformedFrame> {
        let payload = line
            .strip_prefix(DATA_PREFIX)
            .ok_or(MalformedFrame::MissingPrefix)?;

        let value: Value =
            serde_json::from_str(payload.trim()).map_err(|err| MalformedFrame::InvalidJson {
                protocol: P::NAME,
                message: err.to_string(),
            })?;

        let frame_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(MalformedFrame::MissingType {
                protocol: P::NAME,
            })?
            .to_owned();

        if !P::FRAME_TYPES.contains(&frame_type.as_str()) {
            return Err(MalformedFrame::UnknownType {
                protocol: P::NAME,
                frame_type,
            });
        }

        serde_json::from_value(value).map_err(|err| MalformedFrame::InvalidFields {
            protocol: P::NAME,
            frame_type,
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{ResultItem, ResultOrigin};
    use pretty_assertions::assert_eq;

    fn progress(line: &str) -> Result<ProgressFrame, MalformedFrame> {
        FrameDecoder::<ProgressProtocol>::new().decode(line)
    }

    fn answer(line: &str) -> Result<AnswerFrame, MalformedFrame> {
        FrameDecoder::<AnswerProtocol>::new().decode(line)
    }

    #[test]
    fn decodes_progress_frames() {
        assert_eq!(
            progress(r#"data: {"type":"log","message":"start"}"#),
            Ok(ProgressFrame::Log {
                message: "start".into()
            })
        );
        assert_eq!(
            progress(r#"data: {"type":"progress","current":1,"total":3,"message":"Progress update"}"#),
            Ok(ProgressFrame::Progress {
                current: 1,
                total: 3
            })
        );
        assert_eq!(
            progress(r#"data: {"type":"status","message":"finished"}"#),
            Ok(ProgressFrame::Status {
                value: StatusValue::Finished
            })
        );
    }

    #[test]
    fn decodes_answer_frames() {
        assert_eq!(answer(r#"data: {"type":"ping"}"#), Ok(AnswerFrame::Ping));
        assert_eq!(answer(r#"data: {"type":"done"}"#), Ok(AnswerFrame::Done));
        assert_eq!(
            answer(r#"data: {"type":"answer","content":"Hel"}"#),
            Ok(AnswerFrame::AnswerFragment {
                content: "Hel".into()
            })
        );
        assert_eq!(
            answer(r#"data: {"type":"error","message":"model offline"}"#),
            Ok(AnswerFrame::Error {
                message: "model offline".into()
            })
        );
    }

    #[test]
    fn sources_carry_explicit_origin() {
        let line = r##"data: {"type":"sources","data":[
            {"title":"Thread","url":"https://forum.example/t/1","snippet":"s1"},
            {"title":"Manual","url":"#","snippet":"s2","filename":"manual.pdf","page":12},
            {"title":"Tagged","url":"#","snippet":"s3","origin":"forum","filename":"x.pdf"}
        ]}"##
            .replace('\n', "");
        let Ok(AnswerFrame::Sources { items }) = answer(&line) else {
            panic!("expected sources frame");
        };
        assert_eq!(
            items[0],
            ResultItem::forum("Thread", "https://forum.example/t/1", "s1")
        );
        assert_eq!(items[1], ResultItem::document("Manual", "manual.pdf", Some(12), "s2"));
        assert_eq!(items[2].origin, ResultOrigin::Forum);
    }

    #[test]
    fn malformed_frames_are_classified() {
        assert_eq!(
            progress(r#"{"type":"log","message":"x"}"#),
            Err(MalformedFrame::MissingPrefix)
        );
        assert!(matches!(
            progress("data: {not json"),
            Err(MalformedFrame::InvalidJson { .. })
        ));
        assert_eq!(
            progress(r#"data: {"message":"x"}"#),
            Err(MalformedFrame::MissingType {
                protocol: "progress"
            })
        );
        assert_eq!(
            progress(r#"data: {"type":"answer","content":"x"}"#),
            Err(MalformedFrame::UnknownType {
                protocol: "progress",
                frame_type: "answer".into()
            })
        );
        assert!(matches!(
            progress(r#"data: {"type":"status","message":"paused"}"#),
            Err(MalformedFrame::InvalidFields { .. })
        ));
        assert!(matches!(
            progress(r#"data: {"type":"progress","current":-1,"total":3}"#),
            Err(MalformedFrame::InvalidFields { .. })
        ));
    }

    #[test]
    fn non_data_lines_are_skipped_without_error() {
        let decoder = FrameDecoder::<ProgressProtocol>::new();
        assert_eq!(decoder.decode_line(r#"{"type":"log","message":"x"}"#), Ok(None));
        assert_eq!(decoder.decode_line(": keep-alive"), Ok(None));
        assert_eq!(decoder.decode_line("event: progress"), Ok(None));
        assert_eq!(decoder.decode_line(""), Ok(None));
        assert_eq!(
            decoder.decode_line(r#"data: {"type":"log","message":"x"}"#),
            Ok(Some(ProgressFrame::Log {
                message: "x".into()
            }))
        );
        assert!(decoder.decode_line("data: {not json").is_err());
    }

    #[test]
    fn terminal_frames_are_recognised() {
        assert!(ProgressProtocol::is_terminal(&ProgressFrame::Status {
            value: StatusValue::Error
        }));
        assert!(!ProgressProtocol::is_terminal(&ProgressFrame::Status {
            value: StatusValue::Running
        }));
        assert!(AnswerProtocol::is_terminal(&AnswerFrame::Done));
        assert!(!AnswerProtocol::is_terminal(&AnswerFrame::Ping));
    }
}
