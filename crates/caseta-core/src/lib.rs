pub mod model;
pub mod qr;
pub mod verify;

pub use model::{GuardWorker, SessionData, Visit, VisitDraft, WorkerDraft, WorkerVisit};
pub use qr::{ParseError, VisitPayload};
pub use verify::{
    ChecklistItem, ChecklistState, EvidenceKind, EvidenceSet, PhotoRef, ScanError,
    ValidationError, VerificationRecord, VerificationSession, VerifyStatus,
};
