//! Gate-side visit verification state machine.
//!
//! A [`VerificationSession`] tracks one visit across its two scan events:
//! the first scan records the entry (`Pending` → `InProgress`), the second
//! the exit (`InProgress` → `Completed`). Between scans the guard works
//! through a three-item checklist and, when the pass names a vehicle,
//! captures trunk and plate photos. [`VerificationSession::finish`] turns a
//! fully-confirmed session into a [`VerificationRecord`] and starts over.
//!
//! The session mutates only through named transitions; status never moves
//! backwards except through a full reset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::qr::VisitPayload;

/// Where a session stands between scan events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyStatus {
    /// No pass scanned yet.
    #[default]
    Pending,
    /// Entry recorded; visitor is inside.
    InProgress,
    /// Exit recorded.
    Completed,
}

impl VerifyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

/// One of the three manual confirmations the guard performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistItem {
    PeopleMatch,
    VehicleMatch,
    Authorized,
}

impl ChecklistItem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PeopleMatch => "people match",
            Self::VehicleMatch => "vehicle match",
            Self::Authorized => "authorized",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistState {
    pub people_match: bool,
    pub vehicle_match: bool,
    pub authorized: bool,
}

impl ChecklistState {
    /// Flip exactly one item. No cross-field validation happens here.
    pub fn toggle(&mut self, item: ChecklistItem) {
        match item {
            ChecklistItem::PeopleMatch => self.people_match = !self.people_match,
            ChecklistItem::VehicleMatch => self.vehicle_match = !self.vehicle_match,
            ChecklistItem::Authorized => self.authorized = !self.authorized,
        }
    }

    pub fn complete(&self) -> bool {
        self.people_match && self.vehicle_match && self.authorized
    }

    pub fn missing(&self) -> Vec<ChecklistItem> {
        let mut items = Vec::new();
        if !self.people_match {
            items.push(ChecklistItem::PeopleMatch);
        }
        if !self.vehicle_match {
            items.push(ChecklistItem::VehicleMatch);
        }
        if !self.authorized {
            items.push(ChecklistItem::Authorized);
        }
        items
    }
}

/// Opaque reference to a captured photo (a file path or remote URI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Which evidence slot a photo fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Trunk,
    Plate,
}

impl EvidenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trunk => "trunk photo",
            Self::Plate => "plate photo",
        }
    }
}

/// Photos backing the vehicle checks. Required in full exactly when the
/// scanned pass names a real vehicle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSet {
    pub trunk: Option<PhotoRef>,
    pub plate: Option<PhotoRef>,
}

impl EvidenceSet {
    /// Attach a photo, replacing any prior reference for that slot.
    pub fn attach(&mut self, kind: EvidenceKind, photo: PhotoRef) {
        match kind {
            EvidenceKind::Trunk => self.trunk = Some(photo),
            EvidenceKind::Plate => self.plate = Some(photo),
        }
    }

    pub fn get(&self, kind: EvidenceKind) -> Option<&PhotoRef> {
        match kind {
            EvidenceKind::Trunk => self.trunk.as_ref(),
            EvidenceKind::Plate => self.plate.as_ref(),
        }
    }

    pub fn complete(&self) -> bool {
        self.trunk.is_some() && self.plate.is_some()
    }

    pub fn missing(&self) -> Vec<EvidenceKind> {
        let mut kinds = Vec::new();
        if self.trunk.is_none() {
            kinds.push(EvidenceKind::Trunk);
        }
        if self.plate.is_none() {
            kinds.push(EvidenceKind::Plate);
        }
        kinds
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("verification already completed; reset before scanning another pass")]
    SessionComplete,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no pass has been scanned yet")]
    NotStarted,
    #[error("checklist incomplete: {}", checklist_names(.missing))]
    Checklist { missing: Vec<ChecklistItem> },
    #[error("vehicle evidence incomplete: {}", evidence_names(.missing))]
    Evidence { missing: Vec<EvidenceKind> },
}

fn checklist_names(items: &[ChecklistItem]) -> String {
    items.iter().map(ChecklistItem::as_str).collect::<Vec<_>>().join(", ")
}

fn evidence_names(kinds: &[EvidenceKind]) -> String {
    kinds.iter().map(EvidenceKind::as_str).collect::<Vec<_>>().join(", ")
}

/// The record handed to the community API when a session is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub payload: VisitPayload,
    /// Session status at confirmation time: `in_progress` marks an entry,
    /// `completed` an exit.
    pub status: VerifyStatus,
    pub checklist: ChecklistState,
    pub evidence: EvidenceSet,
    pub observations: String,
    pub processed_at: DateTime<Utc>,
}

/// One guard's verification of one visit, from first scan to confirmation.
///
/// Owned by a single flow/screen instance for its lifetime; every mount
/// starts a fresh `Pending` session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationSession {
    status: VerifyStatus,
    payload: Option<VisitPayload>,
    checklist: ChecklistState,
    evidence: EvidenceSet,
    observations: String,
}

impl VerificationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> VerifyStatus {
        self.status
    }

    pub fn payload(&self) -> Option<&VisitPayload> {
        self.payload.as_ref()
    }

    pub fn checklist(&self) -> &ChecklistState {
        &self.checklist
    }

    pub fn evidence(&self) -> &EvidenceSet {
        &self.evidence
    }

    pub fn observations(&self) -> &str {
        &self.observations
    }

    /// Record a successful scan, advancing the status exactly one step.
    ///
    /// The stored payload is replaced with the newly scanned one; the
    /// emitted record carries whatever the latest scan said. Scanning a
    /// `Completed` session is rejected without mutation: the guard must
    /// reset before the next visit.
    pub fn record_scan(&mut self, payload: VisitPayload) -> Result<VerifyStatus, ScanError> {
        let next = match self.status {
            VerifyStatus::Pending => VerifyStatus::InProgress,
            VerifyStatus::InProgress => VerifyStatus::Completed,
            VerifyStatus::Completed => return Err(ScanError::SessionComplete),
        };
        tracing::info!(
            visitor = %payload.visitor_name,
            house = %payload.house_id,
            status = next.as_str(),
            "scan recorded"
        );
        self.payload = Some(payload);
        self.status = next;
        Ok(next)
    }

    pub fn toggle(&mut self, item: ChecklistItem) {
        self.checklist.toggle(item);
    }

    pub fn set_observations(&mut self, text: impl Into<String>) {
        self.observations = text.into();
    }

    /// Attach captured evidence, replacing any prior photo for that slot.
    pub fn attach_evidence(&mut self, kind: EvidenceKind, photo: PhotoRef) {
        self.evidence.attach(kind, photo);
    }

    /// Whether the pass requires trunk/plate photos (it names a vehicle).
    pub fn vehicle_present(&self) -> bool {
        self.payload
            .as_ref()
            .is_some_and(|p| p.vehicle.is_some())
    }

    /// Pure confirmability predicate: all three checklist items confirmed,
    /// and both photos present whenever the pass names a vehicle.
    pub fn can_confirm(&self) -> bool {
        let evidence_ok = !self.vehicle_present() || self.evidence.complete();
        self.checklist.complete() && evidence_ok
    }

    /// Confirm the session, producing the record to submit.
    ///
    /// On a validation failure the session is left untouched and the error
    /// names the missing requirement category. On success the session
    /// resets to a fresh `Pending` state.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<VerificationRecord, ValidationError> {
        if self.payload.is_none() {
            return Err(ValidationError::NotStarted);
        }
        let missing = self.checklist.missing();
        if !missing.is_empty() {
            return Err(ValidationError::Checklist { missing });
        }
        if self.vehicle_present() {
            let missing = self.evidence.missing();
            if !missing.is_empty() {
                return Err(ValidationError::Evidence { missing });
            }
        }

        let finished = std::mem::take(self);
        match finished.payload {
            Some(payload) => Ok(VerificationRecord {
                payload,
                status: finished.status,
                checklist: finished.checklist,
                evidence: finished.evidence,
                observations: finished.observations,
                processed_at: now,
            }),
            // Validated non-empty above.
            None => Err(ValidationError::NotStarted),
        }
    }

    /// Unconditionally return to `Pending`, clearing all fields.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
