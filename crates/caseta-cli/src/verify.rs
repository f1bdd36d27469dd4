//! Interactive gate verification loop.
//!
//! Mirrors the guard screen: scan a pass, work the checklist, capture
//! trunk/plate photos when the pass names a vehicle, then confirm. The
//! loop keeps running across visits; recoverable errors print their
//! message and leave the session where it was.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use caseta_api::{ApiError, CommunityApi};
use caseta_core::{ChecklistItem, EvidenceKind, PhotoRef, VerificationRecord};
use caseta_guard::{
    CaptureOutcome, ConfirmationEmitter, EvidenceCapture, FlowError, SubmissionError, VerifyFlow,
};
use tracing::warn;

use crate::display;

/// Camera stand-in: asks for a photo file path on stdin. An empty answer
/// or an unreadable path cancels the capture.
pub struct PromptCapture;

#[async_trait::async_trait]
impl EvidenceCapture for PromptCapture {
    async fn capture(&mut self, kind: EvidenceKind) -> CaptureOutcome {
        let slot = match kind {
            EvidenceKind::Trunk => "foto de cajuela",
            EvidenceKind::Plate => "foto de placas",
        };
        let answer = match read_line(&format!("Ruta de {slot} (vacío = cancelar): ")) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "stdin read failed during capture");
                return CaptureOutcome::Cancelled;
            }
        };
        let answer = answer.trim();
        if answer.is_empty() {
            return CaptureOutcome::Cancelled;
        }
        if !Path::new(answer).is_file() {
            println!("No existe el archivo {answer}; captura cancelada.");
            return CaptureOutcome::Cancelled;
        }
        CaptureOutcome::Captured(PhotoRef::new(answer))
    }
}

/// Submits confirmed records through the community API.
pub struct ApiEmitter<'a> {
    api: &'a CommunityApi,
}

#[async_trait::async_trait]
impl ConfirmationEmitter for ApiEmitter<'_> {
    async fn emit(&self, record: &VerificationRecord) -> Result<(), SubmissionError> {
        self.api.submit_verification(record).await.map_err(|e| match e {
            ApiError::Server { status, body } => SubmissionError::Rejected {
                status,
                detail: body,
            },
            other => SubmissionError::Transport(other.to_string()),
        })
    }
}

/// Run the verification loop until the guard quits.
pub async fn run(api: &CommunityApi, qr_file: Option<PathBuf>) -> anyhow::Result<()> {
    let mut flow = VerifyFlow::new(PromptCapture, ApiEmitter { api });

    println!("Verificación de accesos. Comandos:");
    println!("  e <archivo> escanear pase desde archivo   p  pegar pase (línea vacía termina)");
    println!("  1/2/3       personas / vehículo / autorizado");
    println!("  t / l       foto de cajuela / de placas    o <texto>  observaciones");
    println!("  v           ver sesión                     c  confirmar");
    println!("  r           reiniciar                      q  salir");
    println!();

    if let Some(path) = qr_file {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading QR text from {}", path.display()))?;
        scan(&mut flow, &raw);
    }

    loop {
        let line = read_line("> ")?;
        let line = line.trim();
        let (cmd, rest) = match line.split_once(' ') {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        match cmd {
            "" => continue,
            "e" => {
                if rest.is_empty() {
                    println!("Uso: e <archivo>");
                    continue;
                }
                match std::fs::read_to_string(rest) {
                    Ok(raw) => scan(&mut flow, &raw),
                    Err(e) => println!("No se pudo leer {rest}: {e}"),
                }
            }
            "p" => {
                let raw = read_until_blank()?;
                scan(&mut flow, &raw);
            }
            "1" => flow.toggle(ChecklistItem::PeopleMatch),
            "2" => flow.toggle(ChecklistItem::VehicleMatch),
            "3" => flow.toggle(ChecklistItem::Authorized),
            "t" => {
                flow.capture(EvidenceKind::Trunk).await;
            }
            "l" => {
                flow.capture(EvidenceKind::Plate).await;
            }
            "o" => flow.observe(rest),
            "v" => display::print_session(flow.session()),
            "c" => match flow.finish().await {
                Ok(record) => {
                    println!(
                        "Verificación registrada: {} ({}).",
                        record.payload.visitor_name,
                        record.status.as_str()
                    );
                }
                Err(e) => print_flow_error(&e),
            },
            "r" => {
                flow.reset();
                println!("Sesión reiniciada.");
            }
            "q" => break,
            other => println!("Comando desconocido: {other}"),
        }
    }

    Ok(())
}

fn scan<C, E>(flow: &mut VerifyFlow<C, E>, raw: &str)
where
    C: EvidenceCapture,
    E: ConfirmationEmitter,
{
    match flow.scan(raw) {
        Ok(_) => {
            if let Some(payload) = flow.session().payload() {
                display::print_payload_card(payload);
            }
            display::print_session(flow.session());
        }
        Err(e) => print_flow_error(&e),
    }
}

fn print_flow_error(e: &FlowError) {
    println!("No se pudo completar: {e}");
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

/// Read pasted pass text, terminated by the first blank line.
fn read_until_blank() -> io::Result<String> {
    println!("Pega el contenido del pase:");
    let mut raw = String::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        raw.push_str(&line);
        raw.push('\n');
    }
    Ok(raw)
}
