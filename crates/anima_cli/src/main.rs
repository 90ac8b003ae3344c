use anima_core::{AnimaConfig, ActionChannel, Clock, Persona, SystemClock};
use anima_expression::{
    load_session, ActionSink, AutonomousScheduler, DetailOutcome, SchedulerParts,
};
use anima_memory::{FragmentCatalog, StateStore};
use anima_perception::ActivityPresenceProbe;
use anima_reasoning::build_generator;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

mod commands;
mod logging;
mod sensors;

use commands::{Command, HELP};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "anima.toml", env = "ANIMA_CONFIG")]
    config: PathBuf,

    /// Session state file (overrides the config)
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Directory she explores (overrides the config)
    #[arg(short, long)]
    watch_dir: Option<PathBuf>,

    /// Dialogue provider: template, mock or ollama
    #[arg(long)]
    provider: Option<String>,

    /// Structured JSON logs, and JSON output for /status
    #[arg(long)]
    log_json: bool,

    /// Write logs to daily rolling files here instead of stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Conversation only, no sensors
    #[arg(long)]
    no_sensors: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init_tracing(args.log_json, args.log_dir.as_deref());

    let mut config = AnimaConfig::load_or_default(&args.config);
    if let Some(state) = args.state {
        config.engine.state_path = Some(state);
    }
    if let Some(dir) = args.watch_dir {
        config.sensors.filesystem.watch_dir = Some(dir);
    }
    if let Some(provider) = args.provider {
        config.llm.provider = provider;
    }

    let persona = match &config.persona_path {
        Some(path) => Persona::load(path).await?,
        None => Persona::default(),
    };
    let catalog = match &config.catalog_path {
        Some(path) => FragmentCatalog::load(path).await?,
        None => FragmentCatalog::builtin(),
    };
    info!("Persona {}, {} memory fragments", persona.name, catalog.len());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = config.engine.state_path.clone().map(StateStore::new);
    let (ledger, tracker) = load_session(store.as_ref(), catalog, config.stages.clone(), clock.now())
        .await
        .context("Failed to load session")?;
    let generator = build_generator(&config.llm, config.engine.generation_timeout())?;

    let name = persona.name.clone();
    let mut scheduler = AutonomousScheduler::new(
        SchedulerParts {
            ledger,
            tracker,
            generator,
            persona,
            clock: clock.clone(),
        },
        &config,
    );
    if let Some(store) = store {
        scheduler = scheduler.with_store(store);
    }
    let scheduler = Arc::new(scheduler);

    let mut set = sensors::build_sensors(&config.sensors, clock, config.engine.poll_timeout());
    if args.no_sensors {
        set.sensors.clear();
    }
    info!("{} sensors active", set.sensors.len());

    let handle = scheduler.clone().spawn(set.sensors);
    let printer = tokio::spawn(print_actions(scheduler.sink().clone(), name.clone()));

    println!("{} is awake. Type /help for commands.", name);
    let session = repl(&scheduler, &set.presence, handle.subscribe(), args.log_json).await;

    let stopped = handle.shutdown().await;
    if let Err(e) = printer.await {
        warn!("Action printer ended abnormally: {}", e);
    }
    session?;
    stopped
}

/// What the user sees after offering a memory detail. Never the error text.
fn detail_reply(outcome: &DetailOutcome) -> &'static str {
    match outcome {
        DetailOutcome::Unlocked => "(something comes back to her)",
        DetailOutcome::Updated => "(she remembers it a little differently now)",
        DetailOutcome::Rejected(_) => "(she frowns, trying to place it... not yet)",
    }
}

async fn print_actions(sink: Arc<ActionSink>, name: String) {
    while let Some(action) = sink.recv().await {
        let time = action.emitted_at.with_timezone(&chrono::Local).format("%H:%M");
        match action.channel {
            ActionChannel::Speech => println!("[{}] {}: {}", time, name, action.rendered_payload),
            ActionChannel::Notification => println!("[{}] (!) {}", time, action.rendered_payload),
            ActionChannel::Expression => println!("[{}] {}", time, action.rendered_payload),
            ActionChannel::Status => println!("[{}] == {} ==", time, action.rendered_payload),
        }
        sink.complete(action.channel);
    }
}

async fn repl(
    scheduler: &AutonomousScheduler,
    presence: &ActivityPresenceProbe,
    mut stopping: watch::Receiver<bool>,
    json: bool,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            _ = stopping.wait_for(|stop| *stop) => {
                warn!("Scheduler stopped");
                break;
            }
        };
        // EOF
        let Some(line) = line else { break };
        presence.touch();

        let Some(command) = Command::parse(&line) else {
            continue;
        };
        match command {
            Command::Say(text) => {
                let outcome = scheduler.handle_user_message(&text).await?;
                if outcome.care {
                    println!("(she relaxes a little)");
                }
                if outcome.shared_task {
                    println!("(she looks pleased)");
                }
            }
            Command::Care(text) => {
                let outcome = scheduler.handle_user_message(&text).await?;
                if !outcome.care {
                    scheduler.acknowledge_care().await?;
                }
                println!("(she relaxes a little)");
            }
            Command::Detail { fragment_id, text } => {
                let outcome = scheduler.supply_memory_detail(&fragment_id, &text).await?;
                if let DetailOutcome::Rejected(reason) = &outcome {
                    warn!(fragment = %fragment_id, "Detail not accepted: {}", reason);
                }
                println!("{}", detail_reply(&outcome));
            }
            Command::Here => println!("(she notices you)"),
            Command::Status => {
                let status = scheduler.status().await;
                if json {
                    println!("{}", serde_json::to_string(&status)?);
                } else {
                    println!("{}", status);
                }
            }
            Command::Memories => {
                let tracker = scheduler.tracker().lock().await;
                for fragment in tracker.fragments() {
                    if fragment.is_unlocked() {
                        println!("[*] {:<22} {}", fragment.id, fragment.render());
                    } else if fragment.requires_user_detail && tracker.stage() >= fragment.stage_required {
                        println!("[ ] {:<22} waiting for your detail", fragment.id);
                    } else {
                        println!("[ ] {:<22} ({})", fragment.id, fragment.stage_required);
                    }
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_detail_stays_in_character() {
        let reason = "premature detail for fragment 'core_bond': requires stage trusting".to_string();
        let reply = detail_reply(&DetailOutcome::Rejected(reason));
        assert!(!reply.contains("premature"));
        assert!(!reply.contains("core_bond"));
        assert_ne!(reply, detail_reply(&DetailOutcome::Unlocked));
    }
}
