use http::StatusCode;
use thiserror::Error;
use ultra_core::HttpError;

use crate::result::PipelineFailureReason;

/// Terminal pipeline-level failure, distinct from a per-model
/// [`ultra_core::ModelOutput`] failure: this is raised only when the
/// engine itself cannot produce a result, not when an individual adapter
/// call fails.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("every Initial-stage model call failed")]
    InitialAllFailed,
    #[error("Ultra-stage synthesis failed for every candidate synthesizer")]
    SynthesisFailed,
    #[error("pipeline exceeded its total execution deadline")]
    DeadlineExceeded,
}

impl PipelineError {
    #[must_use]
    pub const fn reason(&self) -> PipelineFailureReason {
        match self {
            Self::InitialAllFailed => PipelineFailureReason::InitialAllFailed,
            Self::SynthesisFailed => PipelineFailureReason::SynthesisFailed,
            Self::DeadlineExceeded => PipelineFailureReason::DeadlineExceeded,
        }
    }
}

impl From<PipelineFailureReason> for PipelineError {
    fn from(reason: PipelineFailureReason) -> Self {
        match reason {
            PipelineFailureReason::InitialAllFailed => Self::InitialAllFailed,
            PipelineFailureReason::SynthesisFailed => Self::SynthesisFailed,
            PipelineFailureReason::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

impl HttpError for PipelineError {
    // initial_all_failed is allowed to surface as either 200 status=error
    // or 502; we pick 200 since the body already carries a full envelope
    // (partial artifacts, correlation_id) that a bare 502 would obscure.
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InitialAllFailed => StatusCode::OK,
            Self::SynthesisFailed => StatusCode::BAD_GATEWAY,
            Self::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_type(&self) -> &str {
        self.reason().as_str()
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}
