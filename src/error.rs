//! Typed errors for the analysis pipeline.
//!
//! Library code returns these `thiserror` enums; binaries and bootstrap code
//! wrap them in `anyhow` with context.

use thiserror::Error;

/// Failure of a single content fetch. Never fatal on its own.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Extraction service answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, TLS or body read failure
    #[error("{0}")]
    Transport(String),

    /// Per-fetch deadline expired
    #[error("timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Run was cancelled while the fetch was in flight
    #[error("cancelled")]
    Cancelled,
}

/// Failure of one LLM call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM client is disabled")]
    Disabled,

    #[error("LLM provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM transport error: {0}")]
    Transport(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("LLM call timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("LLM call cancelled")]
    Cancelled,
}

/// Model output that could not be turned into a typed value.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// The agent itself reported a failure via an `error` field
    #[error("agent reported error: {0}")]
    AgentReported(String),

    #[error("invalid field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl DecodeError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Why a step-level LLM exchange failed: the call or the decode.
#[derive(Debug, Error)]
pub enum StepFailure {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Run-fatal errors returned by the workflow.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("All URL fetches failed")]
    AllFetchesFailed { attempted: usize },

    #[error("All URL analyses failed")]
    AllAnalysesFailed { attempted: usize },

    #[error("quick metadata step failed: {0}")]
    QuickMetadata(#[source] StepFailure),

    #[error("combine step failed: {0}")]
    Combine(#[source] StepFailure),

    #[error("{step} step timed out")]
    Timeout { step: &'static str },

    #[error("workflow cancelled")]
    Cancelled,

    /// Orchestrator bookkeeping violated (e.g. a step recorded twice)
    #[error("workflow state error: {0}")]
    State(String),
}

impl PipelineError {
    /// Short machine-friendly label used for metrics and run history.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::AllFetchesFailed { .. } => "all_fetches_failed",
            Self::AllAnalysesFailed { .. } => "all_analyses_failed",
            Self::QuickMetadata(_) => "quick_metadata_failed",
            Self::Combine(_) => "combine_failed",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::State(_) => "state",
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
