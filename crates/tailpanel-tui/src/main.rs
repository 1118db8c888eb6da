// ABOUTME: Entry point for the tailpanel binary.
// ABOUTME: Parses CLI args and launches the panel or runs a one-shot command.

mod app;
mod cli;
mod tui;
mod ui;

use anyhow::{Context, Result};
use app::{Action, App};
use clap::{CommandFactory, Parser};
use cli::{Cli, Command, ConfigAction};
use std::sync::Arc;
use std::time::Duration;
use tailpanel_core::{non_interactive_escalation, Config, Job, Supervisor, WorkerHandle};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tui::event::{EventStream, TuiEvent};
use tui::Tui;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The panel owns the terminal, so its logs go to a file
    if cli.command.is_none() {
        tailpanel_log::init_file("tui");
    } else {
        tailpanel_log::init();
    }

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    cli.apply(&mut config);

    tracing::debug!(?config, "Loaded configuration");

    let result = match &cli.command {
        Some(Command::Version) => {
            println!("tailpanel {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Command::Completion { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "tailpanel", &mut std::io::stdout());
            Ok(())
        }
        Some(Command::Config { action }) => handle_config_command(action.as_ref(), &cli, &config),
        Some(command) => cli::oneshot::run(command, config).await,
        None => run_tui(config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn handle_config_command(action: Option<&ConfigAction>, cli: &Cli, config: &Config) -> Result<()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    match action {
        Some(ConfigAction::Path) => println!("{}", path.display()),
        Some(ConfigAction::Init { force }) => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config.save(&path)?;
            println!("Wrote {}", path.display());
        }
        None => {
            // Print effective config
            let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
            print!("{}", rendered);
        }
    }
    Ok(())
}

fn submit_all(worker: &WorkerHandle, app: &mut App, jobs: Vec<Job>) {
    for job in jobs {
        if worker.submit(job) {
            app.note_submitted(job);
        } else {
            tracing::warn!(?job, "Supervisor worker is gone; dropping job");
        }
    }
}

async fn run_tui(mut config: Config) -> Result<()> {
    // Raw mode leaves no way to answer a password prompt
    let escalation = non_interactive_escalation(&config.daemon.escalation);
    if escalation != config.daemon.escalation {
        tracing::info!(%escalation, "Using non-interactive escalation");
        config.daemon.escalation = escalation;
    }

    let (activity_tx, mut activity_rx) = mpsc::unbounded_channel();
    let supervisor = Supervisor::system(config.clone(), Arc::new(activity_tx));
    let (worker, mut worker_rx, worker_task) = WorkerHandle::spawn(supervisor);

    let mut app = App::new(
        config.daemon.process.clone(),
        config.behavior.stop_on_exit,
    );

    let mut tui = Tui::new().context("Failed to initialize terminal")?;
    let mut events = EventStream::new(Duration::from_millis(100));

    let mut refresh = tokio::time::interval(config.timing.refresh_interval());
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick fires immediately; startup already queues a refresh
    refresh.tick().await;

    let mut startup = Vec::new();
    if config.behavior.autostart {
        startup.push(Job::Start);
    }
    startup.push(Job::Refresh);
    submit_all(&worker, &mut app, startup);

    let mut forced = false;
    loop {
        tui.draw(|f| ui::render(f, &app))?;

        tokio::select! {
            Some(event) = events.next() => match event {
                TuiEvent::Key(key) => match app.handle_key(key) {
                    Some(Action::Quit) => {
                        forced = true;
                        break;
                    }
                    Some(Action::Submit(jobs)) => submit_all(&worker, &mut app, jobs),
                    None => {}
                },
                TuiEvent::Resize(_, _) => {}
                TuiEvent::Tick => app.tick(),
            },
            _ = refresh.tick() => {
                if let Some(job) = app.on_refresh_tick() {
                    submit_all(&worker, &mut app, vec![job]);
                }
            }
            Some(activity) = activity_rx.recv() => app.push_activity(activity),
            event = worker_rx.recv() => match event {
                Some(event) => {
                    if app.handle_worker_event(event) {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    tui.restore()?;

    if forced {
        // Leave a running stop sequence behind rather than block the user
        worker_task.abort();
    } else if let Err(e) = worker_task.await {
        tracing::warn!(error = %e, "Supervisor worker ended abnormally");
    }

    Ok(())
}
