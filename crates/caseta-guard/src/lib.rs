//! Guard-side verification flow.
//!
//! [`VerifyFlow`] drives a [`caseta_core::VerificationSession`] through its
//! event surface (scan, checklist toggles, photo capture, observations,
//! confirm/reset), talking to a camera through the [`EvidenceCapture`] seam
//! and to the community API through the [`ConfirmationEmitter`] seam.

pub mod capture;
pub mod emit;
pub mod flow;

pub use capture::{CaptureOutcome, EvidenceCapture};
pub use emit::{ConfirmationEmitter, SubmissionError};
pub use flow::{FlowError, VerifyFlow};
