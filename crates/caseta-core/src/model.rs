//! Wire models for the community API.
//!
//! The backend speaks camelCase JSON and local (zone-less) timestamps, so
//! date fields here are `NaiveDateTime`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An authenticated session as returned by the login endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub token: String,
    pub id: String,
    pub username: String,
    /// Server-side role name, e.g. "resident" or "guard". Kept as text:
    /// the vocabulary belongs to the backend.
    pub role: String,
}

/// A scheduled visit, as listed for a resident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: i64,
    pub visitor_name: String,
    pub date_time: NaiveDateTime,
    #[serde(default)]
    pub num_people: Option<u32>,
    #[serde(default)]
    pub vehicle_plate: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Base64 data URI of the generated QR image, once the backend has
    /// issued the pass.
    #[serde(default)]
    pub qr_code: Option<String>,
}

impl Visit {
    pub fn has_qr(&self) -> bool {
        self.qr_code.as_deref().is_some_and(|qr| !qr.is_empty())
    }

    pub fn is_past(&self, now: NaiveDateTime) -> bool {
        self.date_time < now
    }
}

/// Body for creating or updating a visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitDraft {
    pub visitor_name: String,
    pub vehicle_plate: Option<String>,
    pub num_people: u32,
    pub description: Option<String>,
    /// Access password printed on the pass.
    pub password: String,
    pub date_time: NaiveDateTime,
}

/// A registered service-worker visit, with its identity-document photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerVisit {
    pub id: i64,
    pub worker_name: String,
    pub age: u32,
    pub address: String,
    pub date_time: NaiveDateTime,
    #[serde(default)]
    pub ine_photo: Option<String>,
}

/// Fields for registering a worker; the ID-document photo travels as a
/// separate multipart part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerDraft {
    pub worker_name: String,
    pub age: u32,
    pub address: String,
    pub date_time: NaiveDateTime,
}

/// A worker row as the guard-side roster lists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardWorker {
    pub worker_name: String,
    pub age: u32,
    pub address: String,
    pub visit_date: NaiveDateTime,
    pub house_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn visit_parses_server_json() {
        let json = r#"{
            "id": 41,
            "visitorName": "Ana Torres",
            "dateTime": "2026-06-03T10:00:00",
            "numPeople": 3,
            "vehiclePlate": "ABC-123",
            "description": "Comida familiar",
            "qrCode": "data:image/png;base64,iVBORw0KGgo="
        }"#;
        let visit: Visit = serde_json::from_str(json).unwrap();
        assert_eq!(visit.id, 41);
        assert_eq!(visit.visitor_name, "Ana Torres");
        assert_eq!(visit.date_time, dt(2026, 6, 3, 10, 0));
        assert!(visit.has_qr());
    }

    #[test]
    fn visit_tolerates_missing_optionals() {
        let json = r#"{"id": 7, "visitorName": "Luis", "dateTime": "2026-06-03T10:00:00"}"#;
        let visit: Visit = serde_json::from_str(json).unwrap();
        assert_eq!(visit.num_people, None);
        assert!(!visit.has_qr());
    }

    #[test]
    fn null_qr_code_means_no_pass_yet() {
        let json =
            r#"{"id": 7, "visitorName": "Luis", "dateTime": "2026-06-03T10:00:00", "qrCode": null}"#;
        let visit: Visit = serde_json::from_str(json).unwrap();
        assert!(!visit.has_qr());
    }

    #[test]
    fn is_past_compares_against_given_now() {
        let json = r#"{"id": 7, "visitorName": "Luis", "dateTime": "2026-06-03T10:00:00"}"#;
        let visit: Visit = serde_json::from_str(json).unwrap();
        assert!(visit.is_past(dt(2026, 6, 3, 10, 1)));
        assert!(!visit.is_past(dt(2026, 6, 3, 9, 59)));
    }

    #[test]
    fn draft_serializes_camel_case_without_timezone() {
        let draft = VisitDraft {
            visitor_name: "Ana Torres".into(),
            vehicle_plate: Some("ABC-123".into()),
            num_people: 3,
            description: None,
            password: "4821".into(),
            date_time: dt(2026, 6, 3, 10, 0),
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["visitorName"], "Ana Torres");
        assert_eq!(json["dateTime"], "2026-06-03T10:00:00");
    }

    #[test]
    fn session_round_trips() {
        let json = r#"{"token": "abc.def.ghi", "id": "9", "username": "ana", "role": "resident"}"#;
        let session: SessionData = serde_json::from_str(json).unwrap();
        assert_eq!(session.role, "resident");
        let back = serde_json::to_string(&session).unwrap();
        let again: SessionData = serde_json::from_str(&back).unwrap();
        assert_eq!(session, again);
    }

    #[test]
    fn guard_worker_parses_roster_row() {
        let json = r#"{
            "workerName": "Pedro",
            "age": 34,
            "address": "Calle 5 #20",
            "visitDate": "2026-06-04T08:30:00",
            "houseNumber": "12B"
        }"#;
        let row: GuardWorker = serde_json::from_str(json).unwrap();
        assert_eq!(row.house_number, "12B");
        assert_eq!(row.visit_date, dt(2026, 6, 4, 8, 30));
    }
}
