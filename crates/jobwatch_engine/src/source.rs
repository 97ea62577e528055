use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use jobwatch_core::{JobId, JobKind, SearchRequest};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use watch_logging::watch_debug;

use crate::endpoints::SearchRequestBody;
use crate::{EngineConfig, EngineError, Endpoints, StreamError};

/// Raw body chunks of one subscription. Dropping the stream closes it.
pub type ChunkStream = BoxStream<'static, Result<Bytes, StreamError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRequest {
    Progress { kind: JobKind, job_id: JobId },
    Answer(SearchRequest),
}

#[async_trait::async_trait]
pub trait ByteSource: Send + Sync {
    async fn open(&self, request: &StreamRequest) -> Result<ChunkStream, StreamError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestSource {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl ReqwestSource {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| EngineError::Client(err.to_string()))?;
        Ok(Self {
            client,
            endpoints: Endpoints::new(&config.base_url)?,
        })
    }

    fn build_request(&self, request: &StreamRequest) -> Result<reqwest::RequestBuilder, StreamError> {
        let invalid = |err: url::ParseError| StreamError::InvalidUrl(err.to_string());
        match request {
            StreamRequest::Progress { kind, job_id } => {
                let url = self.endpoints.progress(*kind, *job_id).map_err(invalid)?;
                Ok(self.client.get(url).header(ACCEPT, "text/event-stream"))
            }
            StreamRequest::Answer(search) => {
                let url = self.endpoints.answer().map_err(invalid)?;
                let body = serde_json::to_vec(&SearchRequestBody::from(search))
                    .map_err(|err| StreamError::Body(err.to_string()))?;
                Ok(self
                    .client
                    .post(url)
                    .header(CONTENT_TYPE, "application/json")
                    .header(ACCEPT, "text/event-stream")
                    .body(body))
            }
        }
    }
}

#[async_trait::async_trait]
impl ByteSource for ReqwestSource {
    async fn open(&self, request: &StreamRequest) -> Result<ChunkStream, StreamError> {
        let response = self
            .build_request(request)?
            .send()
            .await
            .map_err(|err| StreamError::Connect(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::HttpStatus(status.as_u16()));
        }
        watch_debug!("opened stream {request:?} ({status})");

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|err| StreamError::Read(err.to_string())))
            .boxed())
    }
}
