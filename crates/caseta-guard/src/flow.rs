//! The verification flow controller.
//!
//! One `VerifyFlow` per guard screen/loop instance. All mutating methods
//! take `&mut self`, so a suspended capture or submission structurally
//! excludes a second one re-entering the session mid-flight.

use caseta_core::qr::EXPECTED_FORMAT;
use caseta_core::{
    ChecklistItem, EvidenceKind, ParseError, ScanError, ValidationError, VerificationRecord,
    VerificationSession, VerifyStatus, VisitPayload,
};
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::capture::{CaptureOutcome, EvidenceCapture};
use crate::emit::{ConfirmationEmitter, SubmissionError};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("{source}; {hint}", hint = EXPECTED_FORMAT)]
    Parse {
        #[from]
        source: ParseError,
    },
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Drives one [`VerificationSession`] against a camera and the API.
pub struct VerifyFlow<C, E> {
    session: VerificationSession,
    camera: C,
    emitter: E,
}

impl<C: EvidenceCapture, E: ConfirmationEmitter> VerifyFlow<C, E> {
    /// A fresh `Pending` flow, as every screen mount starts one.
    pub fn new(camera: C, emitter: E) -> Self {
        Self {
            session: VerificationSession::new(),
            camera,
            emitter,
        }
    }

    pub fn session(&self) -> &VerificationSession {
        &self.session
    }

    /// Feed raw scanned text through the pass grammar into the session.
    ///
    /// A parse failure leaves the session exactly where it was — the
    /// scanner stays active and the error spells out the expected format.
    pub fn scan(&mut self, raw: &str) -> Result<VerifyStatus, FlowError> {
        let payload = VisitPayload::parse(raw).inspect_err(|e| {
            warn!(error = %e, "scan rejected");
        })?;
        Ok(self.session.record_scan(payload)?)
    }

    pub fn toggle(&mut self, item: ChecklistItem) {
        self.session.toggle(item);
    }

    pub fn observe(&mut self, text: impl Into<String>) {
        self.session.set_observations(text);
    }

    /// Ask the camera for a photo and attach it on success. A cancelled
    /// capture leaves the slot holding whatever it held before.
    pub async fn capture(&mut self, kind: EvidenceKind) -> CaptureOutcome {
        let outcome = self.camera.capture(kind).await;
        match &outcome {
            CaptureOutcome::Captured(photo) => {
                info!(kind = kind.as_str(), photo = photo.as_str(), "evidence captured");
                self.session.attach_evidence(kind, photo.clone());
            }
            CaptureOutcome::Cancelled => {
                info!(kind = kind.as_str(), "capture cancelled");
            }
        }
        outcome
    }

    pub fn can_confirm(&self) -> bool {
        self.session.can_confirm()
    }

    /// Confirm the session: validate, submit the record, then start over.
    ///
    /// Validation failures and rejected submissions both leave the session
    /// in its current state so the guard can correct and retry; only an
    /// accepted submission resets to `Pending`.
    pub async fn finish(&mut self) -> Result<VerificationRecord, FlowError> {
        let saved = self.session.clone();
        let record = self.session.finish(Utc::now())?;
        if let Err(e) = self.emitter.emit(&record).await {
            warn!(error = %e, "submission failed; keeping session");
            self.session = saved;
            return Err(e.into());
        }
        info!(
            visitor = %record.payload.visitor_name,
            status = record.status.as_str(),
            "verification submitted"
        );
        Ok(record)
    }

    /// Abandon the current session and start a fresh one.
    pub fn reset(&mut self) {
        self.session.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caseta_core::PhotoRef;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct ScriptedCamera {
        outcomes: VecDeque<CaptureOutcome>,
    }

    impl ScriptedCamera {
        fn new(outcomes: impl IntoIterator<Item = CaptureOutcome>) -> Self {
            Self {
                outcomes: outcomes.into_iter().collect(),
            }
        }
    }

    #[async_trait::async_trait]
    impl EvidenceCapture for ScriptedCamera {
        async fn capture(&mut self, _kind: EvidenceKind) -> CaptureOutcome {
            self.outcomes.pop_front().unwrap_or(CaptureOutcome::Cancelled)
        }
    }

    /// Records every accepted submission; can be told to reject.
    #[derive(Default)]
    struct FakeApi {
        rejecting: AtomicBool,
        accepted: Mutex<Vec<VerificationRecord>>,
    }

    #[async_trait::async_trait]
    impl ConfirmationEmitter for &FakeApi {
        async fn emit(&self, record: &VerificationRecord) -> Result<(), SubmissionError> {
            if self.rejecting.load(Ordering::SeqCst) {
                return Err(SubmissionError::Rejected {
                    status: 503,
                    detail: "maintenance window".into(),
                });
            }
            self.accepted.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    const PASS_ON_FOOT: &str = "Casa: 12\nVisitante: Ana\nVehículo: No\n";
    const PASS_WITH_CAR: &str = "Casa: 12\nVisitante: Ana\nVehículo: ABC-123\n";

    fn flow<'a>(
        camera: ScriptedCamera,
        api: &'a FakeApi,
    ) -> VerifyFlow<ScriptedCamera, &'a FakeApi> {
        VerifyFlow::new(camera, api)
    }

    fn check_all<C: EvidenceCapture, E: ConfirmationEmitter>(f: &mut VerifyFlow<C, E>) {
        f.toggle(ChecklistItem::PeopleMatch);
        f.toggle(ChecklistItem::VehicleMatch);
        f.toggle(ChecklistItem::Authorized);
    }

    #[tokio::test]
    async fn bad_scan_keeps_scanner_active_and_names_the_format() {
        let api = FakeApi::default();
        let mut f = flow(ScriptedCamera::new([]), &api);
        let err = f.scan("garbage text").unwrap_err();
        assert!(err.to_string().contains("Casa:"), "got: {err}");
        assert_eq!(f.session().status(), VerifyStatus::Pending);
    }

    #[tokio::test]
    async fn full_on_foot_verification_submits_and_resets() {
        let api = FakeApi::default();
        let mut f = flow(ScriptedCamera::new([]), &api);
        f.scan(PASS_ON_FOOT).unwrap();
        check_all(&mut f);
        f.observe("sin novedades");
        let record = f.finish().await.unwrap();

        assert_eq!(record.status, VerifyStatus::InProgress);
        assert_eq!(f.session().status(), VerifyStatus::Pending);
        let accepted = api.accepted.lock().unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].observations, "sin novedades");
    }

    #[tokio::test]
    async fn vehicle_pass_needs_both_captures() {
        let api = FakeApi::default();
        let camera = ScriptedCamera::new([
            CaptureOutcome::Captured(PhotoRef::new("trunk.jpg")),
            CaptureOutcome::Captured(PhotoRef::new("plate.jpg")),
        ]);
        let mut f = flow(camera, &api);
        f.scan(PASS_WITH_CAR).unwrap();
        check_all(&mut f);

        assert!(!f.can_confirm());
        f.capture(EvidenceKind::Trunk).await;
        assert!(!f.can_confirm());
        f.capture(EvidenceKind::Plate).await;
        assert!(f.can_confirm());

        f.finish().await.unwrap();
        assert_eq!(api.accepted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_capture_keeps_prior_photo() {
        let api = FakeApi::default();
        let camera = ScriptedCamera::new([
            CaptureOutcome::Captured(PhotoRef::new("first.jpg")),
            CaptureOutcome::Cancelled,
        ]);
        let mut f = flow(camera, &api);
        f.scan(PASS_WITH_CAR).unwrap();

        f.capture(EvidenceKind::Trunk).await;
        let outcome = f.capture(EvidenceKind::Trunk).await;
        assert_eq!(outcome, CaptureOutcome::Cancelled);
        assert_eq!(
            f.session().evidence().get(EvidenceKind::Trunk).map(PhotoRef::as_str),
            Some("first.jpg")
        );
    }

    #[tokio::test]
    async fn cancelled_capture_on_empty_slot_stays_empty() {
        let api = FakeApi::default();
        let mut f = flow(ScriptedCamera::new([CaptureOutcome::Cancelled]), &api);
        f.scan(PASS_WITH_CAR).unwrap();
        f.capture(EvidenceKind::Plate).await;
        assert!(f.session().evidence().get(EvidenceKind::Plate).is_none());
    }

    #[tokio::test]
    async fn premature_finish_names_the_missing_category() {
        let api = FakeApi::default();
        let mut f = flow(ScriptedCamera::new([]), &api);
        f.scan(PASS_ON_FOOT).unwrap();
        let err = f.finish().await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::Validation(ValidationError::Checklist { .. })
        ));
        // Nothing was submitted and the session is still live.
        assert!(api.accepted.lock().unwrap().is_empty());
        assert_eq!(f.session().status(), VerifyStatus::InProgress);
    }

    #[tokio::test]
    async fn rejected_submission_keeps_session_for_retry() {
        let api = FakeApi::default();
        api.rejecting.store(true, Ordering::SeqCst);
        let mut f = flow(ScriptedCamera::new([]), &api);
        f.scan(PASS_ON_FOOT).unwrap();
        check_all(&mut f);
        f.observe("intento uno");

        let err = f.finish().await.unwrap_err();
        assert!(matches!(err, FlowError::Submission(_)));
        assert_eq!(f.session().status(), VerifyStatus::InProgress);
        assert_eq!(f.session().observations(), "intento uno");

        // Backend recovers; the very same session submits cleanly.
        api.rejecting.store(false, Ordering::SeqCst);
        let record = f.finish().await.unwrap();
        assert_eq!(record.observations, "intento uno");
        assert_eq!(f.session().status(), VerifyStatus::Pending);
    }

    #[tokio::test]
    async fn scan_after_completed_is_rejected() {
        let api = FakeApi::default();
        let mut f = flow(ScriptedCamera::new([]), &api);
        f.scan(PASS_ON_FOOT).unwrap();
        f.scan(PASS_ON_FOOT).unwrap();
        let err = f.scan(PASS_ON_FOOT).unwrap_err();
        assert!(matches!(err, FlowError::Scan(ScanError::SessionComplete)));
        f.reset();
        assert_eq!(f.scan(PASS_ON_FOOT).unwrap(), VerifyStatus::InProgress);
    }
}
