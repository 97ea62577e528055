use std::time::Duration;

use jobwatch_core::{JobId, JobKind, SearchRequest};
use serde::Serialize;
use url::Url;

use crate::EngineError;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to begin/stop calls only; streams stay open as long as the job runs.
    pub control_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            control_timeout: Duration::from_secs(30),
        }
    }
}

/// URL layout of the job service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Result<Self, EngineError> {
        let mut base = Url::parse(base_url).map_err(|err| EngineError::BaseUrl {
            url: base_url.to_string(),
            message: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(EngineError::BaseUrl {
                url: base_url.to_string(),
                message: "not a base url".to_string(),
            });
        }
        // `join` replaces the last segment unless the path ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn begin(&self, kind: JobKind, job_id: JobId) -> Result<Url, url::ParseError> {
        match kind {
            JobKind::Crawl => {
                let mut url = self.base.join("crawler/run")?;
                url.query_pairs_mut()
                    .append_pair("source_id", &job_id.to_string());
                Ok(url)
            }
            JobKind::Index => self.base.join(&format!("pdf/{job_id}/index")),
        }
    }

    pub fn progress(&self, kind: JobKind, job_id: JobId) -> Result<Url, url::ParseError> {
        match kind {
            JobKind::Crawl => self.base.join(&format!("crawler/logs/{job_id}")),
            JobKind::Index => self
                .base
                .join(&format!("pdf/indexing/progress/{job_id}")),
        }
    }

    /// Both kinds share the stop endpoint; job ids live in one server-side registry.
    pub fn stop(&self, _kind: JobKind, job_id: JobId) -> Result<Url, url::ParseError> {
        self.base.join(&format!("crawler/stop/{job_id}"))
    }

    pub fn answer(&self) -> Result<Url, url::ParseError> {
        self.base.join("search/stream")
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchRequestBody<'a> {
    query: &'a str,
    limit: u32,
    llm_provider: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_filter: Option<&'static str>,
}

impl<'a> From<&'a SearchRequest> for SearchRequestBody<'a> {
    fn from(request: &'a SearchRequest) -> Self {
        Self {
            query: &request.query,
            limit: request.options.effective_limit(),
            llm_provider: request.options.provider.wire_name(),
            source_filter: request.options.origin_filter.wire_name(),
        }
    }
}
