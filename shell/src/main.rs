use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use spamwatch::config::AppConfig;
use spamwatch::session::{CheckArgs, ContactArgs};
use spamwatch::{logging, repl, session, ReqwestTransport, Runtime};
use tokio::io::BufReader;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (default: ./spamwatch.toml if present)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session (default)
    Interactive,

    /// Check one message and print the verdict
    Check {
        /// Message to classify
        #[arg(short, long)]
        message: String,

        #[command(flatten)]
        contact: Contact,

        /// Resolve the visitor location first
        #[arg(long)]
        locate: bool,

        /// Write the map as GeoJSON to FILE
        #[arg(long, value_name = "FILE")]
        map: Option<PathBuf>,
    },

    /// Resolve and print the visitor location
    Locate {
        #[command(flatten)]
        contact: Contact,
    },
}

#[derive(Args)]
struct Contact {
    /// Contact email sent with the geolocation lookup
    #[arg(long)]
    email: Option<String>,

    /// Contact phone sent with the geolocation lookup
    #[arg(long)]
    phone: Option<String>,
}

impl From<Contact> for ContactArgs {
    fn from(contact: Contact) -> Self {
        Self {
            email: contact.email,
            phone: contact.phone,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    logging::init_logging(&config.logging)?;

    let settings = config.settings().context("invalid configuration")?;
    let transport = ReqwestTransport::new(&config.http)?;
    let mut runtime = Runtime::new(settings, transport);
    info!(
        classifier = %config.endpoints.classifier,
        geolocation = %config.endpoints.geolocation,
        "spamwatch ready"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Interactive => {
            let input = BufReader::new(tokio::io::stdin());
            repl::run(&mut runtime, input, &mut out).await?;
        }
        Commands::Check {
            message,
            contact,
            locate,
            map,
        } => {
            let args = CheckArgs {
                message,
                contact: contact.into(),
                locate,
                map,
            };
            session::run_check(&mut runtime, args, &mut out).await?;
        }
        Commands::Locate { contact } => {
            session::run_locate(&mut runtime, contact.into(), &mut out).await?;
        }
    }

    Ok(())
}
