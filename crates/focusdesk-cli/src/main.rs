use clap::{Parser, Subcommand};
use focusdesk_core::AppSettings;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusdesk", version, about = "Focusdesk CLI")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Timer configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Completed focus cycles
    Cycles {
        #[command(subcommand)]
        action: commands::cycles::CyclesAction,
    },
}

fn init_tracing(settings: &AppSettings, verbose: bool) {
    let level = if verbose { "debug" } else { settings.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("focusdesk={level},focusdesk_core={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let loaded = AppSettings::load();
    let settings = match &loaded {
        Ok(settings) => settings.clone(),
        Err(_) => AppSettings::default(),
    };
    init_tracing(&settings, cli.verbose);
    if let Err(e) = loaded {
        warn!(error = %e, "failed to load settings, using defaults");
    }

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, &settings),
        Commands::Config { action } => commands::config::run(action),
        Commands::Cycles { action } => commands::cycles::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
