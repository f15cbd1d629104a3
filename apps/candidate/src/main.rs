use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{FormInput, HttpSubmissionTransport, SubmissionController, SubmissionOutcome};
use shared::domain::ViewerRole;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod surface;

use config::load_settings;
use surface::TerminalSurface;

#[derive(Parser, Debug)]
#[command(about = "Submit a candidate profile and render the scored results")]
struct Args {
    /// TOML file with `personal`, `work`, `knowledge`, `skills` and
    /// `certifications` tables.
    #[arg(long)]
    form: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    /// Start in the recruiter view.
    #[arg(long)]
    recruiter: bool,
    /// Write the rendered markup here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// After the results are shown, read `recruiter`, `candidate`, `toggle`
    /// or `quit` lines from stdin.
    #[arg(long)]
    interactive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoleCommand {
    Set(ViewerRole),
    Toggle,
    Quit,
}

impl RoleCommand {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "recruiter" | "r" => Some(Self::Set(ViewerRole::Recruiter)),
            "candidate" | "c" => Some(Self::Set(ViewerRole::Candidate)),
            "toggle" | "t" => Some(Self::Toggle),
            "quit" | "q" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url.clone() {
        settings.server_url = server_url;
    }
    if args.recruiter {
        settings.recruiter_view = true;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let raw_form = tokio::fs::read_to_string(&args.form)
        .await
        .with_context(|| format!("failed to read form file '{}'", args.form.display()))?;
    let form: FormInput = toml::from_str(&raw_form)
        .with_context(|| format!("invalid form file '{}'", args.form.display()))?;

    let transport =
        HttpSubmissionTransport::from_server_url(&settings.server_url, &settings.submit_path)?;
    info!(endpoint = %transport.endpoint(), "using submission endpoint");

    let controller = SubmissionController::new(
        Arc::new(transport),
        Arc::new(TerminalSurface::new(args.output.clone())),
        ViewerRole::from_toggle(settings.recruiter_view),
    );

    // Failures were already reported through the surface.
    let outcome = controller.submit_form(&form).await;
    if !outcome.is_displayed() {
        return Ok(exit_code_for(&outcome));
    }

    if args.interactive {
        run_role_commands(&controller).await?;
    }

    Ok(ExitCode::SUCCESS)
}

fn exit_status(outcome: &SubmissionOutcome) -> u8 {
    if outcome.is_displayed() {
        0
    } else {
        1
    }
}

fn exit_code_for(outcome: &SubmissionOutcome) -> ExitCode {
    ExitCode::from(exit_status(outcome))
}

async fn run_role_commands(controller: &SubmissionController) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match RoleCommand::parse(&line) {
            Some(RoleCommand::Set(role)) => {
                controller.set_role(role).await;
            }
            Some(RoleCommand::Toggle) => {
                let role = controller.toggle_role().await;
                info!(?role, "role toggled");
            }
            Some(RoleCommand::Quit) => break,
            None if line.trim().is_empty() => {}
            None => warn!(command = line.trim(), "unknown command"),
        }
    }
    Ok(())
}
