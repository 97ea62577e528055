use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which backend, if any, summarizes the search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryProvider {
    /// Results only, no generated answer.
    #[default]
    None,
    Local,
    Cloud,
    DeepSeek,
}

impl SummaryProvider {
    pub fn summarizes(self) -> bool {
        self != SummaryProvider::None
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            SummaryProvider::None => "none",
            SummaryProvider::Local => "local",
            SummaryProvider::Cloud => "cloud",
            SummaryProvider::DeepSeek => "deepseek",
        }
    }
}

/// Restricts results to one origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginFilter {
    #[default]
    All,
    Documents,
    Forum,
}

impl OriginFilter {
    /// Value of the request's `source_filter` field; `None` means omit it.
    pub fn wire_name(self) -> Option<&'static str> {
        match self {
            OriginFilter::All => None,
            OriginFilter::Documents => Some("pdf"),
            OriginFilter::Forum => Some("forum"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} `{value}` (expected one of: {expected})")]
pub struct ParseOptionError {
    what: &'static str,
    value: String,
    expected: &'static str,
}

impl FromStr for SummaryProvider {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "null" | "off" => Ok(SummaryProvider::None),
            "local" => Ok(SummaryProvider::Local),
            "cloud" => Ok(SummaryProvider::Cloud),
            "deepseek" => Ok(SummaryProvider::DeepSeek),
            _ => Err(ParseOptionError {
                what: "provider",
                value: s.to_string(),
                expected: "none, local, cloud, deepseek",
            }),
        }
    }
}

impl FromStr for OriginFilter {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(OriginFilter::All),
            "documents" | "pdf" => Ok(OriginFilter::Documents),
            "forum" => Ok(OriginFilter::Forum),
            _ => Err(ParseOptionError {
                what: "filter",
                value: s.to_string(),
                expected: "all, documents, forum",
            }),
        }
    }
}

impl fmt::Display for SummaryProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl fmt::Display for OriginFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginFilter::All => f.write_str("all"),
            OriginFilter::Documents => f.write_str("documents"),
            OriginFilter::Forum => f.write_str("forum"),
        }
    }
}

/// Per-search configuration, passed explicitly with every search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub limit: u32,
    pub provider: SummaryProvider,
    pub origin_filter: OriginFilter,
}

impl SearchOptions {
    pub const MIN_LIMIT: u32 = 1;
    pub const MAX_LIMIT: u32 = 50;
    pub const DEFAULT_LIMIT: u32 = 10;

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(Self::MIN_LIMIT, Self::MAX_LIMIT);
        self
    }

    pub fn with_provider(mut self, provider: SummaryProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_origin_filter(mut self, origin_filter: OriginFilter) -> Self {
        self.origin_filter = origin_filter;
        self
    }

    /// Limit clamped into the accepted range, for values read from storage.
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(Self::MIN_LIMIT, Self::MAX_LIMIT)
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            provider: SummaryProvider::default(),
            origin_filter: OriginFilter::default(),
        }
    }
}
