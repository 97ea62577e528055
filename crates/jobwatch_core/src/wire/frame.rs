use serde::Deserialize;

/// Frames carried by a job's progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressFrame {
    Log {
        message: String,
    },
    Progress {
        current: u64,
        total: u64,
    },
    /// The producer puts the status value in the `message` field.
    Status {
        #[serde(rename = "message")]
        value: StatusValue,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusValue {
    Running,
    Finished,
    Error,
    Cancelled,
}

/// Frames carried by a search answer stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnswerFrame {
    Ping,
    Sources {
        #[serde(rename = "data")]
        items: Vec<ResultItem>,
    },
    #[serde(rename = "answer")]
    AnswerFragment {
        content: String,
    },
    Done,
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrigin {
    Forum,
    Document,
}

/// One search hit. `origin` is always explicit once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "WireResultItem")]
pub struct ResultItem {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub origin: ResultOrigin,
    pub document_name: Option<String>,
    pub page_number: Option<u32>,
}

impl ResultItem {
    pub fn forum(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            origin: ResultOrigin::Forum,
            document_name: None,
            page_number: None,
        }
    }

    pub fn document(
        title: impl Into<String>,
        document_name: impl Into<String>,
        page_number: Option<u32>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: "#".to_string(),
            snippet: snippet.into(),
            origin: ResultOrigin::Document,
            document_name: Some(document_name.into()),
            page_number,
        }
    }
}

#[derive(Deserialize)]
struct WireResultItem {
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    origin: Option<ResultOrigin>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    page: Option<u32>,
}

impl From<WireResultItem> for ResultItem {
    fn from(wire: WireResultItem) -> Self {
        // Older producers only mark documents by sending a filename.
        let origin = wire.origin.unwrap_or(if wire.filename.is_some() {
            ResultOrigin::Document
        } else {
            ResultOrigin::Forum
        });
        Self {
            title: wire.title,
            url: wire.url,
            snippet: wire.snippet,
            origin,
            document_name: wire.filename,
            page_number: wire.page,
        }
    }
}
