use thiserror::Error;

/// Failures that stop a verification outright.
///
/// Everything else (scoring service down, search returning garbage) is
/// absorbed by the individual checkers and never reaches the caller.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("invalid image locator {locator}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("image unavailable at {locator}: {reason}")]
    ImageUnavailable { locator: String, reason: String },

    #[error("image at {locator} exceeds {limit} bytes")]
    ImageTooLarge { locator: String, limit: u64 },

    #[error("image at {locator} could not be decoded: {reason}")]
    ImageUndecodable { locator: String, reason: String },

    #[error("label detection failed: {0}")]
    LabelDetection(#[from] SignalError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type VerifyResult<T> = Result<T, VerifyError>;

/// Failure of one external signal source.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

pub type SignalResult<T> = Result<T, SignalError>;
