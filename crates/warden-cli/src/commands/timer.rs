use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use tokio::time::MissedTickBehavior;
use tracing::warn;
use warden_core::{
    Config, Database, Event, FocusSession, KvStore, MemoryStore, Phase, SideEffectDispatcher,
    SystemClock, TimerEngine, TimerView,
};

use crate::sinks::{DesktopNotifier, TerminalBell};

type Session = FocusSession<Box<dyn KvStore>, SystemClock>;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Emergency override: start a fresh focus block now
    Skip,
    /// Run the countdown in the terminal until interrupted
    Watch,
}

/// Open durable storage, falling back to memory so the countdown still runs.
fn open_store() -> Box<dyn KvStore> {
    match Database::open() {
        Ok(db) => Box::new(db),
        Err(e) => {
            warn!(error = %e, "database unavailable, timer state will not survive restart");
            Box::new(MemoryStore::new())
        }
    }
}

fn open_session(config: &Config) -> Session {
    let engine = TimerEngine::new(open_store(), SystemClock).with_key(config.storage.key.clone());
    let effects = SideEffectDispatcher::new(TerminalBell, DesktopNotifier::new())
        .configured(&config.notifications);
    FocusSession::new(engine, effects)
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "using default configuration");
        Config::default()
    })
}

fn print_json(event: &Event) -> warden_core::error::Result<()> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

pub fn run(action: TimerAction) -> warden_core::error::Result<()> {
    let config = load_config();
    let mut session = open_session(&config);
    session.initialize();

    match action {
        TimerAction::Status => {
            let tick = session.tick();
            print_json(&session.snapshot())?;
            if let Some(event) = tick.event {
                print_json(&event)?;
            }
        }
        TimerAction::Skip => {
            let (event, _) = session.skip();
            print_json(&event)?;
        }
        TimerAction::Watch => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(watch(session))?;
        }
    }
    Ok(())
}

async fn watch(mut session: Session) -> warden_core::error::Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut shown = session.view().phase;
    if shown == Phase::Break {
        print_break_banner();
    }

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let tick = session.tick();
                // An adopted external write changes phase without emitting
                // an event, so follow the rendered phase.
                let phase = tick.view.phase;
                if phase != shown {
                    println!();
                    if entered_break(shown, phase) {
                        print_break_banner();
                    }
                    shown = phase;
                }
                render(&tick.view)?;
            }
            _ = &mut ctrl_c => {
                println!();
                break;
            }
        }
    }
    Ok(())
}

fn render(view: &TimerView) -> std::io::Result<()> {
    let mut out = std::io::stdout();
    write!(out, "\r{} {}", view.phase, view.display())?;
    out.flush()
}

fn entered_break(shown: Phase, now: Phase) -> bool {
    shown != Phase::Break && now == Phase::Break
}

fn print_break_banner() {
    println!("Rest. The work can wait.");
    println!("(emergency override: `warden timer skip`)");
}
