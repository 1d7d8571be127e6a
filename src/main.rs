use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tripweaver")]
#[command(version, about = "Conversational trip itinerary planner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a trip from a free-form request
    Plan {
        #[arg(help = "Trip request, e.g. \"3 days of food and art in Barcelona\"")]
        request: String,
        #[arg(long, help = "Maximum trip length in days")]
        days_limit: Option<u32>,
        #[arg(long, short, help = "Keep the session open for follow-up instructions")]
        interactive: bool,
        #[arg(long, help = "Model override")]
        model: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mTripWeaver encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Plan {
            request,
            days_limit,
            interactive,
            model,
        } => {
            let config = tripweaver::config::ConfigLoader::load()?;
            let rt = Runtime::new()?;
            rt.block_on(tripweaver::cli::plan::run(
                tripweaver::cli::PlanOptions {
                    request,
                    days_limit,
                    interactive,
                    model,
                },
                config,
            ))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                tripweaver::cli::config_cmd::show(&format)?;
            }
            ConfigAction::Path => {
                tripweaver::cli::config_cmd::path()?;
            }
            ConfigAction::Init { force } => {
                tripweaver::cli::config_cmd::init(force)?;
            }
        },
    }

    Ok(())
}
