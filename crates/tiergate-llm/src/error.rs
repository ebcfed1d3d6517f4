use std::time::Duration;

use http::StatusCode;
use thiserror::Error;
use tiergate_core::HttpError;
use tiergate_routing::Tier;

/// Errors that can occur while forwarding a completion
#[derive(Debug, Error)]
pub enum LlmError {
    /// Backend unreachable, returned a non-2xx status, or sent an unparseable body
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Transport or framing failure after the stream started
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Backend did not answer within the forwarding timeout
    #[error("upstream timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Client sent a malformed or invalid request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Both the routed tier and the fallback tier failed
    #[error("tier {primary} failed and fallback tier {fallback} also failed: {source}")]
    FallbackExhausted {
        primary: Tier,
        fallback: Tier,
        #[source]
        source: Box<LlmError>,
    },

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HttpError for LlmError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Streaming(_) | Self::FallbackExhausted { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Upstream(_) => "upstream_error",
            Self::Streaming(_) => "streaming_error",
            Self::Timeout(_) => "timeout_error",
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::FallbackExhausted { .. } | Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::FallbackExhausted { primary, fallback, .. } => {
                format!("request failed on tier {primary} and on fallback tier {fallback}")
            }
            Self::Internal(_) => "an internal error occurred".to_owned(),
            other => other.to_string(),
        }
    }
}
