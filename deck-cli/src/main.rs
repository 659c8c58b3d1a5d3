//! Portdeck
//!
//! Drives the serial bridge and websocket server panels against the
//! in-process host from the command line.

mod cli;
mod session;
mod settings;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Include all our crates in the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "portdeck=info,deck_gateway=info,deck_control=info,deck_host=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load();
    cli.apply(&mut settings);

    match cli.command {
        Command::Ports => session::list_ports(&settings).await,
        Command::Run(ref run) => {
            run.apply(&mut settings);
            session::run(&settings, run.duration()).await
        }
        Command::Config { save } => {
            if save {
                settings.save()?;
                tracing::info!("Settings saved");
            }
            if let Some(path) = Settings::settings_path() {
                println!("# {}", path.display());
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}
