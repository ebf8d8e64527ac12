/// Error handling for the swap workflow
///
/// Every fallible step returns `SwapError`. Calls into the aggregation service
/// return `AggregatorError` first so call sites are forced to tell a
/// service-reported error apart from a transport failure.
use serde::Deserialize;
use thiserror::Error;

// =============================================================================
// MAIN ERROR TYPE
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("Invalid amount '{amount}': {reason}")] InvalidAmount {
        amount: String,
        reason: String,
    },

    #[error("Quote unavailable: {0}")] QuoteUnavailable(String),

    #[error("Authorization failed: {0}")] AuthorizationFailed(String),

    #[error("Transaction build failed: {0}")] TransactionBuildFailed(String),

    #[error("Submission failed: {0}")] SubmissionFailed(String),

    #[error("No signer available: connect an account first")] NoSignerAvailable,

    #[error("A swap is already in progress")] SwapInProgress,

    #[error("Unknown token: {0}")] UnknownToken(String),

    #[error("Network error: {0}")] Network(String),

    #[error("Parse error: {0}")] Parse(String),

    #[error("Configuration error: {0}")] Configuration(String),

    #[error("Invalid state transition: {from} -> {to}")] InvalidStateTransition {
        from: String,
        to: String,
    },
}

pub type SwapResult<T> = std::result::Result<T, SwapError>;

impl SwapError {
    pub fn invalid_amount(amount: impl Into<String>, reason: impl Into<String>) -> Self {
        SwapError::InvalidAmount {
            amount: amount.into(),
            reason: reason.into(),
        }
    }

    pub fn network_error(message: impl Into<String>) -> Self {
        SwapError::Network(message.into())
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        SwapError::Parse(message.into())
    }

    pub fn configuration_error(message: impl Into<String>) -> Self {
        SwapError::Configuration(message.into())
    }

    /// Errors that abort an attempt and carry a reason for the user.
    ///
    /// `NoSignerAvailable` is a precondition (the action is disabled) and
    /// `InvalidStateTransition` is an internal bug, so neither counts.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            SwapError::NoSignerAvailable | SwapError::InvalidStateTransition { .. }
        )
    }

    /// Short reason string shown in notifications
    pub fn reason(&self) -> String {
        match self {
            SwapError::QuoteUnavailable(reason)
            | SwapError::AuthorizationFailed(reason)
            | SwapError::TransactionBuildFailed(reason)
            | SwapError::SubmissionFailed(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for SwapError {
    fn from(err: reqwest::Error) -> Self {
        SwapError::Network(format!("HTTP request failed: {}", err))
    }
}

impl From<serde_json::Error> for SwapError {
    fn from(err: serde_json::Error) -> Self {
        SwapError::Parse(format!("JSON: {}", err))
    }
}

// =============================================================================
// SERVICE PAYLOAD DISCRIMINATION
// =============================================================================

/// Structured error returned by the aggregation service in place of a result.
///
/// The service reports failures as `{"error": "..."}`; its SDK re-shapes them
/// to `{"message": "..."}`. Gateway errors carry both, in which case `message`
/// holds the detail and wins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ServiceErrorBody")]
pub struct ServiceError {
    pub message: String,
}

#[derive(Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl TryFrom<ServiceErrorBody> for ServiceError {
    type Error = String;

    fn try_from(body: ServiceErrorBody) -> Result<Self, Self::Error> {
        body.message
            .or(body.error)
            .map(|message| ServiceError { message })
            .ok_or_else(|| "no error or message field".to_string())
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A service response body: either the error shape or the success shape.
///
/// The error variant is tried first, so a body is only a success when it does
/// not carry an error field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServicePayload<T> {
    Error(ServiceError),
    Ok(T),
}

impl<T> ServicePayload<T> {
    pub fn into_result(self) -> Result<T, AggregatorError> {
        match self {
            ServicePayload::Ok(value) => Ok(value),
            ServicePayload::Error(err) => Err(AggregatorError::Service(err)),
        }
    }
}

/// Outcome of a failed aggregator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregatorError {
    /// The service answered with a structured error payload
    Service(ServiceError),
    /// The call itself failed (connection, unreadable body, unexpected shape)
    Transport(SwapError),
}

impl AggregatorError {
    pub fn transport(message: impl Into<String>) -> Self {
        AggregatorError::Transport(SwapError::network_error(message))
    }

    /// Map into the domain error, using `on_service` for service-reported failures
    pub fn into_swap_error(self, on_service: fn(String) -> SwapError) -> SwapError {
        match self {
            AggregatorError::Service(err) => on_service(err.message),
            AggregatorError::Transport(err) => err,
        }
    }
}

impl std::fmt::Display for AggregatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregatorError::Service(err) => write!(f, "Service error: {}", err),
            AggregatorError::Transport(err) => write!(f, "{}", err),
        }
    }
}

impl From<reqwest::Error> for AggregatorError {
    fn from(err: reqwest::Error) -> Self {
        AggregatorError::Transport(err.into())
    }
}
