//! Confirmation emitter seam.

use caseta_core::VerificationRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("verification rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },
    #[error("could not reach the community API: {0}")]
    Transport(String),
}

/// Hands a finished verification record to the community API.
///
/// Retry/backoff and persistence guarantees live on the remote side; this
/// seam only reports acceptance or failure.
#[async_trait::async_trait]
pub trait ConfirmationEmitter {
    async fn emit(&self, record: &VerificationRecord) -> Result<(), SubmissionError>;
}
