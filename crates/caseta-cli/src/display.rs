//! Terminal rendering: vertical cards for visits, workers, and the live
//! verification session.

use caseta_core::{
    ChecklistState, EvidenceKind, EvidenceSet, GuardWorker, VerificationSession, Visit,
    VisitPayload, WorkerVisit,
};
use chrono::NaiveDateTime;

const DATE_FMT: &str = "%d/%m/%Y";
const TIME_FMT: &str = "%H:%M";

// ── Visits ──

/// Print one visit as a vertical card.
pub fn print_visit_card(visit: &Visit, now: NaiveDateTime) {
    let tag = if visit.is_past(now) { " (pasada)" } else { "" };
    println!("=== VISITA #{}{tag} ===", visit.id);
    row("Visitante", &visit.visitor_name);
    row("Fecha", &visit.date_time.format(DATE_FMT).to_string());
    row("Hora", &visit.date_time.format(TIME_FMT).to_string());
    if let Some(n) = visit.num_people {
        row("Personas", &n.to_string());
    }
    row("Vehículo", visit.vehicle_plate.as_deref().unwrap_or("Ninguno"));
    if let Some(desc) = &visit.description {
        row("Descripción", desc);
    }
    row("Código QR", if visit.has_qr() { "generado" } else { "pendiente" });
    println!();
}

// ── Workers ──

pub fn print_worker_card(worker: &WorkerVisit) {
    println!("=== TRABAJADOR #{} ===", worker.id);
    row("Nombre", &worker.worker_name);
    row("Edad", &worker.age.to_string());
    row("Dirección", &worker.address);
    row("Fecha", &worker.date_time.format(DATE_FMT).to_string());
    row("Hora", &worker.date_time.format(TIME_FMT).to_string());
    row(
        "Identificación",
        if worker.ine_photo.is_some() { "registrada" } else { "pendiente" },
    );
    println!();
}

pub fn print_roster_card(row_data: &GuardWorker) {
    println!("=== TRABAJADOR ===");
    row("Nombre", &row_data.worker_name);
    row("Edad", &row_data.age.to_string());
    row("Dirección", &row_data.address);
    row("Casa", &row_data.house_number);
    row("Fecha", &row_data.visit_date.format(DATE_FMT).to_string());
    row("Hora", &row_data.visit_date.format(TIME_FMT).to_string());
    println!();
}

// ── Verification ──

/// Print a scanned pass the way the guard reads it.
pub fn print_payload_card(payload: &VisitPayload) {
    println!("=== PASE ESCANEADO ===");
    row("Casa", &payload.house_id);
    row("Visitante", &payload.visitor_name);
    if !payload.visit_date.is_empty() {
        row("Fecha y Hora", &payload.visit_date);
    }
    row("Vehículo", payload.vehicle.as_deref().unwrap_or("Ninguno"));
    if let Some(key) = &payload.access_key {
        row("Clave de acceso", key);
    }
    if let Some(n) = payload.people_count {
        row("Personas", &n.to_string());
    }
    if let Some(desc) = &payload.description {
        row("Descripción", desc);
    }
    for line in &payload.unrecognized {
        row("(sin etiqueta)", line);
    }
    println!();
}

/// Print the live session: status, checklist, and evidence slots.
pub fn print_session(session: &VerificationSession) {
    println!("--- Sesión: {} ---", status_label(session));
    print_checklist(session.checklist());
    if session.vehicle_present() {
        print_evidence(session.evidence());
    }
    if !session.observations().is_empty() {
        row("Observaciones", session.observations());
    }
    let verdict = if session.can_confirm() { "listo para confirmar" } else { "incompleto" };
    println!("  => {verdict}");
    println!();
}

fn status_label(session: &VerificationSession) -> &'static str {
    use caseta_core::VerifyStatus::*;
    match session.status() {
        Pending => "esperando escaneo",
        InProgress => "entrada registrada",
        Completed => "salida registrada",
    }
}

fn print_checklist(checklist: &ChecklistState) {
    println!("  [{}] personas coinciden", mark(checklist.people_match));
    println!("  [{}] vehículo coincide", mark(checklist.vehicle_match));
    println!("  [{}] autorizado", mark(checklist.authorized));
}

fn print_evidence(evidence: &EvidenceSet) {
    for kind in [EvidenceKind::Trunk, EvidenceKind::Plate] {
        let slot = match kind {
            EvidenceKind::Trunk => "foto de cajuela",
            EvidenceKind::Plate => "foto de placas",
        };
        match evidence.get(kind) {
            Some(photo) => println!("  [x] {slot}: {}", photo.as_str()),
            None => println!("  [ ] {slot}"),
        }
    }
}

fn mark(done: bool) -> &'static str {
    if done { "x" } else { " " }
}

fn row(label: &str, value: &str) {
    println!("  {label:<16} {value}");
}
