//! QR payload grammar for visit passes.
//!
//! A visit pass encodes its key fields as a plain-text, line-oriented blob.
//! Each line carries one exact Spanish label followed by its value:
//!
//! ```text
//! Casa: 12
//! Visitante: Ana Torres
//! Fecha y Hora: lunes 3 de junio, 10:00
//! Vehículo: ABC-123
//! Clave de acceso: 4821
//! Personas: 3
//! Descripción: Comida familiar
//! ```
//!
//! Labels are case- and punctuation-sensitive. Lines matching no known label
//! are preserved verbatim on the payload rather than silently dropped, so a
//! newer pass with extra lines still round-trips through an older client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const LABEL_HOUSE: &str = "Casa:";
const LABEL_VISITOR: &str = "Visitante:";
const LABEL_DATE: &str = "Fecha y Hora:";
const LABEL_VEHICLE: &str = "Vehículo:";
const LABEL_ACCESS_KEY: &str = "Clave de acceso:";
const LABEL_PEOPLE: &str = "Personas:";
const LABEL_DESCRIPTION: &str = "Descripción:";

/// Human-readable description of the expected pass format, for surfacing
/// when a scan cannot be parsed.
pub const EXPECTED_FORMAT: &str = "expected a visit pass with `Casa:` and `Visitante:` lines \
     (optionally `Fecha y Hora:`, `Vehículo:`, `Clave de acceso:`, `Personas:`, `Descripción:`)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("pass is missing a required `{0}` line")]
    MissingField(&'static str),
    #[error("`Personas:` value is not a number: {0:?}")]
    BadPeopleCount(String),
}

/// A visit pass parsed from scanned QR text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitPayload {
    pub house_id: String,
    pub visitor_name: String,
    /// Free-form display text; never parsed to a date type.
    pub visit_date: String,
    /// `None` when the pass carries no vehicle (absent label, empty value,
    /// "no", or "ninguno", case-insensitive).
    pub vehicle: Option<String>,
    pub access_key: Option<String>,
    pub people_count: Option<u32>,
    pub description: Option<String>,
    /// Lines matching no known label, kept verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unrecognized: Vec<String>,
}

impl VisitPayload {
    /// Parse scanned QR text into a payload.
    ///
    /// Blank lines are skipped; duplicate labels keep the last occurrence.
    /// Fails when `Casa:` or `Visitante:` is absent or empty after all
    /// lines, or when `Personas:` carries a non-numeric value.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let mut house_id = None;
        let mut visitor_name = None;
        let mut visit_date = None;
        let mut vehicle = None;
        let mut access_key = None;
        let mut people_count = None;
        let mut description = None;
        let mut unrecognized = Vec::new();

        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(v) = value_of(line, LABEL_HOUSE) {
                house_id = non_empty(v);
            } else if let Some(v) = value_of(line, LABEL_VISITOR) {
                visitor_name = non_empty(v);
            } else if let Some(v) = value_of(line, LABEL_DATE) {
                visit_date = non_empty(v);
            } else if let Some(v) = value_of(line, LABEL_VEHICLE) {
                vehicle = normalize_vehicle(v);
            } else if let Some(v) = value_of(line, LABEL_ACCESS_KEY) {
                access_key = non_empty(v);
            } else if let Some(v) = value_of(line, LABEL_PEOPLE) {
                let v = v.trim();
                people_count = match v.parse::<u32>() {
                    Ok(n) => Some(n),
                    Err(_) => return Err(ParseError::BadPeopleCount(v.to_string())),
                };
            } else if let Some(v) = value_of(line, LABEL_DESCRIPTION) {
                description = non_empty(v);
            } else {
                unrecognized.push(line.to_string());
            }
        }

        let house_id = house_id.ok_or(ParseError::MissingField(LABEL_HOUSE))?;
        let visitor_name = visitor_name.ok_or(ParseError::MissingField(LABEL_VISITOR))?;

        if !unrecognized.is_empty() {
            tracing::debug!(count = unrecognized.len(), "pass carried unrecognized lines");
        }

        Ok(Self {
            house_id,
            visitor_name,
            visit_date: visit_date.unwrap_or_default(),
            vehicle,
            access_key,
            people_count,
            description,
            unrecognized,
        })
    }

    /// Compose the payload back into the tagged-line pass format.
    ///
    /// Absent optional fields are omitted except the vehicle, which is
    /// written as `Vehículo: Ninguno` so the guard-side display always
    /// answers the vehicle question. Unrecognized lines are appended last.
    pub fn to_qr_text(&self) -> String {
        let mut out = String::new();
        push_line(&mut out, LABEL_HOUSE, &self.house_id);
        push_line(&mut out, LABEL_VISITOR, &self.visitor_name);
        if !self.visit_date.is_empty() {
            push_line(&mut out, LABEL_DATE, &self.visit_date);
        }
        push_line(&mut out, LABEL_VEHICLE, self.vehicle.as_deref().unwrap_or("Ninguno"));
        if let Some(key) = &self.access_key {
            push_line(&mut out, LABEL_ACCESS_KEY, key);
        }
        if let Some(n) = self.people_count {
            push_line(&mut out, LABEL_PEOPLE, &n.to_string());
        }
        if let Some(desc) = &self.description {
            push_line(&mut out, LABEL_DESCRIPTION, desc);
        }
        for line in &self.unrecognized {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Match one exact label prefix, returning the rest of the line.
fn value_of<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.strip_prefix(label)
}

fn non_empty(v: &str) -> Option<String> {
    let v = v.trim();
    (!v.is_empty()).then(|| v.to_string())
}

/// "no" and "ninguno" are how the resident app spells "no vehicle".
fn normalize_vehicle(v: &str) -> Option<String> {
    let v = v.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("no") || v.eq_ignore_ascii_case("ninguno") {
        None
    } else {
        Some(v.to_string())
    }
}

fn push_line(out: &mut String, label: &str, value: &str) {
    out.push_str(label);
    out.push(' ');
    out.push_str(value);
    out.push('\n');
}
