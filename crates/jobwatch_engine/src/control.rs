use jobwatch_core::{JobId, JobKind};
use serde::Deserialize;
use url::Url;
use watch_logging::watch_debug;

use crate::{ControlError, EngineConfig, EngineError, Endpoints};

/// Fire-and-forget job control. Success only means the server took the request.
#[async_trait::async_trait]
pub trait ControlClient: Send + Sync {
    async fn begin_job(&self, kind: JobKind, job_id: JobId) -> Result<(), ControlError>;
    async fn stop_job(&self, kind: JobKind, job_id: JobId) -> Result<(), ControlError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestControl {
    client: reqwest::Client,
    endpoints: Endpoints,
}

/// Body shape shared by the control endpoints.
#[derive(Debug, Deserialize)]
struct ControlReply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ReqwestControl {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.control_timeout)
            .build()
            .map_err(|err| EngineError::Client(err.to_string()))?;
        Ok(Self {
            client,
            endpoints: Endpoints::new(&config.base_url)?,
        })
    }

    async fn post(&self, url: Result<Url, url::ParseError>) -> Result<(), ControlError> {
        let url = url.map_err(|err| ControlError::InvalidUrl(err.to_string()))?;
        let response = self
            .client
            .post(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ControlError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        watch_debug!("POST {url} -> {status}");
        check_reply(&body)
    }
}

/// A 2xx reply can still be a refusal: `{"status": "error", "message": ...}`.
fn check_reply(body: &[u8]) -> Result<(), ControlError> {
    let Ok(reply) = serde_json::from_slice::<ControlReply>(body) else {
        return Ok(());
    };
    if reply.status.as_deref() == Some("error") {
        return Err(ControlError::Rejected(
            reply
                .message
                .unwrap_or_else(|| "request refused".to_string()),
        ));
    }
    Ok(())
}

fn map_reqwest_error(err: reqwest::Error) -> ControlError {
    if err.is_timeout() {
        return ControlError::Timeout;
    }
    ControlError::Transport(err.to_string())
}

#[async_trait::async_trait]
impl ControlClient for ReqwestControl {
    async fn begin_job(&self, kind: JobKind, job_id: JobId) -> Result<(), ControlError> {
        self.post(self.endpoints.begin(kind, job_id)).await
    }

    async fn stop_job(&self, kind: JobKind, job_id: JobId) -> Result<(), ControlError> {
        self.post(self.endpoints.stop(kind, job_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::{check_reply, ControlError};

    #[test]
    fn error_status_body_is_a_rejection() {
        assert_eq!(
            check_reply(br#"{"status":"error","message":"Task already running for this source"}"#),
            Err(ControlError::Rejected(
                "Task already running for this source".to_string()
            ))
        );
        assert_eq!(
            check_reply(br#"{"status":"error"}"#),
            Err(ControlError::Rejected("request refused".to_string()))
        );
    }

    #[test]
    fn other_bodies_are_accepted() {
        assert_eq!(check_reply(br#"{"status":"started","message":"ok"}"#), Ok(()));
        assert_eq!(check_reply(b""), Ok(()));
        assert_eq!(check_reply(b"[1,2]"), Ok(()));
    }
}
