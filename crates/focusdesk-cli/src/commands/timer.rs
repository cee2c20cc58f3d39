use clap::Subcommand;
use focusdesk_core::storage::KvStore;
use focusdesk_core::{
    AppSettings, BroadcastBus, ConfigStore, CurrentTask, CycleCounter, Event, EventBus,
    SqliteStore, TerminalNotifier, TimerDriver, TimerEngine, TimerMode,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the countdown in the foreground, printing events as JSON lines
    Run {
        /// Title of the task being worked on
        #[arg(long)]
        task: Option<String>,
        /// Mode to start in
        #[arg(long, default_value = "focus")]
        mode: TimerMode,
        /// Exit after the first completed countdown
        #[arg(long)]
        exit_on_complete: bool,
    },
    /// Print persisted configuration and cycle count as JSON
    Status,
}

pub fn run(action: TimerAction, settings: &AppSettings) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn KvStore> = Arc::new(SqliteStore::open()?);

    match action {
        TimerAction::Run {
            task,
            mode,
            exit_on_complete,
        } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_foreground(store, settings, task, mode, exit_on_complete))?;
        }
        TimerAction::Status => {
            let config = ConfigStore::open(Arc::clone(&store));
            let cycles = CycleCounter::new(Arc::clone(&store));
            let status = serde_json::json!({
                "config": config.current(),
                "cyclesCompleted": cycles.load(),
                "storageAvailable": store.is_available(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}

async fn run_foreground(
    store: Arc<dyn KvStore>,
    settings: &AppSettings,
    task: Option<String>,
    mode: TimerMode,
    exit_on_complete: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let bus = Arc::new(BroadcastBus::default());
    let mut events = bus.subscribe();

    let engine = TimerEngine::open(store, Arc::new(TerminalNotifier), bus.clone())
        .with_options(settings.engine_options());
    let driver = TimerDriver::spawn(engine, &bus, settings.driver_resolution());

    if let Some(title) = task {
        bus.publish(Event::current_task_changed(Some(CurrentTask {
            id: "cli".into(),
            title,
        })));
    }
    driver.with_engine(|engine| {
        engine.switch_mode(mode);
        engine.start();
    });

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event)?);
                    if exit_on_complete && matches!(event, Event::CycleCompleted { .. }) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "dropped timer events"),
                Err(RecvError::Closed) => break,
            },
            _ = &mut interrupted => {
                info!("interrupted");
                break;
            }
        }
    }

    let state = driver.state();
    driver.shutdown();
    info!(
        mode = %state.mode,
        remaining = state.time_remaining_seconds,
        cycles = state.cycles_completed,
        "timer stopped"
    );
    Ok(())
}
