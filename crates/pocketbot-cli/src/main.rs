mod daemon;
mod onboard;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pocketbot", about = "Personal SMS automation agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the agent polling loop
    Run,
    /// Run the interactive onboarding flow
    Onboard,
    /// Check configuration health
    Health,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            let config = pocketbot_config::load_config()?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(daemon::run(config))?;
        }
        Commands::Onboard => {
            onboard::run_onboarding()?;
        }
        Commands::Health => {
            let config = pocketbot_config::load_config()?;
            println!("pocketbot is healthy");
            println!(
                "  owner number: {}",
                if config.user.phone_number.is_empty() {
                    "(not set)"
                } else {
                    &config.user.phone_number
                }
            );
            println!("  llm mode: {:?}", config.llm.mode);
            println!("  onboarding complete: {}", config.onboarding.completed);
            println!("  data dir: {}", config.data_dir()?.display());
        }
    }

    Ok(())
}
