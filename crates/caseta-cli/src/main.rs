//! caseta: community visitor management from the terminal.

mod display;
mod verify;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use caseta_api::CommunityApi;
use caseta_core::{VisitDraft, VisitPayload, WorkerDraft};
use caseta_store::SessionStore;
use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "caseta", version, about = "Residential community visitor management")]
struct Cli {
    /// Base URL of the community API.
    #[arg(long, env = "CASETA_API_URL", default_value = "http://localhost:8080", global = true)]
    api_url: String,

    /// Session file path; defaults to the platform data directory.
    #[arg(long, env = "CASETA_SESSION_FILE", global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in as a resident (email) or guard (10-digit phone number).
    Login {
        identifier: String,
        /// Prompted when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Show who is logged in.
    Whoami,
    /// Resident: manage visits.
    #[command(subcommand)]
    Visit(VisitCmd),
    /// Resident: manage worker visits.
    #[command(subcommand)]
    Worker(WorkerCmd),
    /// Guard: list registered workers community-wide.
    Roster,
    /// Guard: interactive gate verification.
    Verify {
        /// Read the first scan from a file instead of pasting it.
        #[arg(long)]
        qr_file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum VisitCmd {
    /// List your visits, newest first.
    List,
    /// Show one visit; with --house, also preview its pass text.
    Show {
        id: i64,
        #[arg(long)]
        house: Option<String>,
    },
    Create(VisitArgs),
    Edit {
        id: i64,
        #[command(flatten)]
        args: VisitArgs,
    },
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct VisitArgs {
    #[arg(long)]
    visitor: String,
    /// Visit date and time, e.g. 2026-06-03T10:00.
    #[arg(long)]
    date: String,
    #[arg(long, default_value_t = 1)]
    people: u32,
    /// Vehicle plates; omit when the visitor comes on foot.
    #[arg(long)]
    plate: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Access password printed on the pass.
    #[arg(long)]
    password: String,
}

#[derive(Subcommand)]
enum WorkerCmd {
    List,
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        address: String,
        /// Visit date and time, e.g. 2026-06-03T08:00.
        #[arg(long)]
        date: String,
        /// ID-document photo to attach.
        #[arg(long)]
        photo: PathBuf,
    },
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("caseta v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let store = match &cli.session_file {
        Some(path) => SessionStore::new(path.clone()),
        None => SessionStore::at_default_path()?,
    };

    match cli.command {
        Command::Login { identifier, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Contraseña: ")?,
            };
            let mut api = CommunityApi::new(cli.api_url);
            let session = api
                .login(identifier.trim(), password.trim())
                .await
                .context("login failed")?;
            store.save(&session)?;
            println!("Sesión iniciada como {} ({}).", session.username, session.role);
        }
        Command::Logout => {
            store.clear()?;
            println!("Sesión cerrada.");
        }
        Command::Whoami => match store.load()? {
            Some(s) => println!("{} ({}), id {}", s.username, s.role, s.id),
            None => println!("Nadie ha iniciado sesión."),
        },
        Command::Visit(cmd) => visit_command(cmd, authed_api(&cli.api_url, &store)?).await?,
        Command::Worker(cmd) => worker_command(cmd, authed_api(&cli.api_url, &store)?).await?,
        Command::Roster => {
            let api = authed_api(&cli.api_url, &store)?;
            let roster = api.guard_roster().await?;
            if roster.is_empty() {
                println!("No hay trabajadores registrados.");
            }
            for row in &roster {
                display::print_roster_card(row);
            }
        }
        Command::Verify { qr_file } => {
            let api = authed_api(&cli.api_url, &store)?;
            verify::run(&api, qr_file).await?;
        }
    }

    Ok(())
}

/// Build a client from the stored session, or explain how to get one.
fn authed_api(api_url: &str, store: &SessionStore) -> anyhow::Result<CommunityApi> {
    let session = store
        .load()?
        .context("no session; run `caseta login` first")?;
    Ok(CommunityApi::new(api_url.to_string()).with_token(session.token))
}

async fn visit_command(cmd: VisitCmd, api: CommunityApi) -> anyhow::Result<()> {
    let now = Local::now().naive_local();
    match cmd {
        VisitCmd::List => {
            let mut visits = api.list_visits().await?;
            visits.sort_by(|a, b| b.date_time.cmp(&a.date_time));
            if visits.is_empty() {
                println!("No tienes visitas registradas.");
            }
            for visit in &visits {
                display::print_visit_card(visit, now);
            }
        }
        VisitCmd::Show { id, house } => {
            let visits = api.list_visits().await?;
            let visit = visits
                .iter()
                .find(|v| v.id == id)
                .with_context(|| format!("no visit with id {id}"))?;
            display::print_visit_card(visit, now);
            if let Some(house) = house {
                println!("{}", pass_preview(visit, &house).to_qr_text());
            }
        }
        VisitCmd::Create(args) => {
            let visit = api.create_visit(&visit_draft(args)?).await?;
            println!("Visita registrada:");
            display::print_visit_card(&visit, now);
        }
        VisitCmd::Edit { id, args } => {
            api.update_visit(id, &visit_draft(args)?).await?;
            println!("Visita {id} actualizada.");
        }
        VisitCmd::Delete { id, yes } => {
            if yes || confirm(&format!("¿Eliminar la visita {id}?"))? {
                api.delete_visit(id).await?;
                println!("Visita {id} eliminada.");
            }
        }
    }
    Ok(())
}

async fn worker_command(cmd: WorkerCmd, api: CommunityApi) -> anyhow::Result<()> {
    match cmd {
        WorkerCmd::List => {
            let workers = api.list_workers().await?;
            if workers.is_empty() {
                println!("No tienes trabajadores registrados.");
            }
            for worker in &workers {
                display::print_worker_card(worker);
            }
        }
        WorkerCmd::Register { name, age, address, date, photo } => {
            let draft = WorkerDraft {
                worker_name: name,
                age,
                address,
                date_time: parse_datetime(&date)?,
            };
            let bytes = std::fs::read(&photo)
                .with_context(|| format!("reading photo {}", photo.display()))?;
            let photo_name = photo
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "ine.jpg".to_string());
            api.register_worker(&draft, &photo_name, bytes).await?;
            println!("Trabajador registrado.");
        }
        WorkerCmd::Delete { id, yes } => {
            if yes || confirm(&format!("¿Eliminar el trabajador {id}?"))? {
                api.delete_worker(id).await?;
                println!("Trabajador {id} eliminado.");
            }
        }
    }
    Ok(())
}

fn visit_draft(args: VisitArgs) -> anyhow::Result<VisitDraft> {
    Ok(VisitDraft {
        visitor_name: args.visitor,
        vehicle_plate: args.plate.filter(|p| !p.trim().is_empty()),
        num_people: args.people,
        description: args.description,
        password: args.password,
        date_time: parse_datetime(&args.date)?,
    })
}

/// Preview the pass text the backend will encode for this visit.
fn pass_preview(visit: &caseta_core::Visit, house: &str) -> VisitPayload {
    VisitPayload {
        house_id: house.to_string(),
        visitor_name: visit.visitor_name.clone(),
        visit_date: visit.date_time.format("%d/%m/%Y %H:%M").to_string(),
        vehicle: visit.vehicle_plate.clone().filter(|p| !p.trim().is_empty()),
        access_key: None,
        people_count: visit.num_people,
        description: visit.description.clone(),
        unrecognized: Vec::new(),
    }
}

fn parse_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .with_context(|| format!("invalid date {s:?}; expected YYYY-MM-DDTHH:MM"))
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    let answer = prompt(&format!("{question} [s/N] "))?;
    Ok(matches!(answer.as_str(), "s" | "S" | "si" | "sí"))
}
