//! quizkit CLI: take timed quizzes and review results.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizkit", version, about = "Timed multiple-choice quizzes with an admin dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take the quiz in the terminal
    Take {
        /// Taker name (prompted for if omitted)
        #[arg(long)]
        name: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the admin dashboard
    Dashboard {
        /// Admin password (read from stdin if omitted)
        #[arg(long)]
        password: Option<String>,

        /// Output format: text, json, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Output file for the html format
        #[arg(long, default_value = "quizkit-dashboard.html")]
        output: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check the question bank
    Validate {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and seed the question bank
    Init,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizkit=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take { name, config } => commands::take::execute(name, config).await,
        Commands::Dashboard {
            password,
            format,
            output,
            config,
        } => commands::dashboard::execute(password, format, output, config),
        Commands::Validate { config } => commands::validate::execute(config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
