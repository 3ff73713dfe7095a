// Module declarations
mod config;
mod session;
mod state;
mod types;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam::channel::unbounded;
use session::{CountdownAlarm, SessionController, SessionState};
use state::ControlState;
use std::ops::ControlFlow;
use std::path::PathBuf;

/// Meteor-M LRPT weather-image receiver control shell
#[derive(Parser, Debug)]
#[command(name = "lrpt-rx", version, disable_version_flag = true)]
struct Cli {
    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Satellite profile to load (defaults to the first one discovered)
    #[arg(short = 's', long)]
    satellite: Option<String>,

    /// Profile directory (defaults to ~/glrpt)
    #[arg(short = 'd', long)]
    profile_dir: Option<PathBuf>,

    /// Receive session duration in seconds, overriding the profile
    #[arg(short = 't', long)]
    duration: Option<u32>,
}

fn main() -> Result<()> {
    // Fault handlers first: a crash during startup still gets a diagnostic
    session::install_fault_handlers();

    let cli = Cli::parse();

    // Initialize logging
    env_logger::init();
    log::info!("lrpt-rx v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli) {
        log::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    // Initialize shared control state
    let state = ControlState::new_shared();

    let profile_dir = cli
        .profile_dir
        .unwrap_or_else(config::default_profile_dir);
    state.write().profile_dir = profile_dir.clone();

    // Discover per-satellite profiles; each registered name would feed the
    // frontend's satellite selection menu
    let profiles = config::find_profiles(&profile_dir, cli.satellite.as_deref(), |name| {
        log::debug!("registered satellite profile {name}");
    })?;

    let satellite = profiles
        .active
        .clone()
        .context("no active satellite profile")?;
    let path = profiles.profile_path(&satellite);
    state.write().satellite_name = satellite.clone();

    // Load the active profile; on failure the control state is unusable
    // and no session may be armed
    let (notify_tx, notify_rx) = unbounded();
    config::load_profile(&path, &state, &notify_tx)
        .with_context(|| format!("failed to load profile {}", path.display()))?;
    for notification in notify_rx.try_iter() {
        log::info!("frontend notified: {notification:?}");
    }

    // Signals become queued events; the loop below is their only consumer
    let (event_tx, event_rx) = unbounded();
    let listener = session::spawn_listener(event_tx)?;

    let alarm = CountdownAlarm::new(|| session::schedule_alarm(1));
    let mut controller = SessionController::new(state.clone(), Box::new(alarm));
    controller.arm(cli.duration);
    session::schedule_alarm(1);

    // Event loop: apply queued events until the session completes or a
    // fatal notification arrives
    loop {
        let event = event_rx.recv()?;
        match controller.handle_event(event) {
            ControlFlow::Continue(()) => {
                if controller.state() == SessionState::Idle {
                    break;
                }
            }
            ControlFlow::Break(kind) => {
                eprintln!("\n{}", kind.diagnostic());
                std::process::exit(1);
            }
        }
    }

    listener.close();
    log::info!("lrpt-rx shutting down");
    Ok(())
}
