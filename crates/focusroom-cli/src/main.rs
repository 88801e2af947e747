use clap::{CommandFactory, Parser, Subcommand};
use focusroom_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusroom", version, about = "Focusroom focus/break timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the timer or inspect its state
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Timer durations and sound toggles
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Session log
    Sessions {
        #[command(subcommand)]
        action: commands::sessions::SessionsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "focusroom", &mut std::io::stdout());
            Ok(())
        }
        command => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(async {
                match command {
                    Commands::Timer { action } => commands::timer::run(action, &config).await,
                    Commands::Settings { action } => commands::settings::run(action, &config).await,
                    Commands::Stats { action } => commands::stats::run(action, &config).await,
                    Commands::Sessions { action } => commands::sessions::run(action, &config).await,
                    Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
                }
            })
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default();
    init_logging(&config);

    if let Err(e) = run(cli, config) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
