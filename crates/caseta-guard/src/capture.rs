//! Evidence capture seam.

use caseta_core::{EvidenceKind, PhotoRef};

/// What a capture attempt came back with. Cancellation is an outcome, not
/// an error; a cancelled capture leaves the evidence slot as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured(PhotoRef),
    Cancelled,
}

/// A camera-like capability the flow asks for trunk/plate photos.
///
/// Implementations must resolve to exactly one of the two outcomes;
/// internal failures are reported as `Cancelled` (after logging), since the
/// flow has no third outcome to act on.
#[async_trait::async_trait]
pub trait EvidenceCapture {
    async fn capture(&mut self, kind: EvidenceKind) -> CaptureOutcome;
}
