mod ask;
mod serve;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use delve_core::llm::Provider;
use delve_core::{search, Config, ResearchPipeline, SearchProvider, LLM};

use ask::AskOutput;

#[derive(Parser)]
#[command(name = "delve")]
#[command(version, about = "Streaming web research with search and LLM synthesis", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the research server
    Serve {
        /// Host to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Research a query in the terminal
    Ask {
        /// What you want to research
        #[arg(required = true)]
        query: Vec<String>,
        /// Print raw event-stream frames instead of formatted output
        #[arg(long)]
        json: bool,
    },
    /// Print the default configuration
    Config,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Credentials usually live in .env.local next to the server.
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = Config::load()?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let (search, llm) = build_providers(&config)?;
            serve::start_server(config, search, llm).await?;
        }
        Commands::Ask { query, json } => {
            let config = Config::load()?;
            let (search, llm) = build_providers(&config)?;
            let pipeline = ResearchPipeline::with_policy(search, llm, config.research.clone());

            let output = if json {
                AskOutput::Frames
            } else {
                AskOutput::Pretty
            };
            ask::run(pipeline, &query.join(" "), output).await?;
        }
        Commands::Config => {
            print!("{}", Config::default_config_string());
        }
    }

    Ok(())
}

/// Builds both providers once at startup from the loaded configuration.
fn build_providers(
    config: &Config,
) -> color_eyre::Result<(Arc<dyn SearchProvider>, Arc<dyn LLM>)> {
    let search: Arc<dyn SearchProvider> = Arc::from(search::from_config(&config.search)?);
    let llm: Arc<dyn LLM> = Arc::from(Provider::from_config(&config.llm)?.build_with(&config.llm)?);

    tracing::info!(
        search = %config.search.provider,
        llm = %config.llm.provider,
        model = %config.llm.model_or_default(),
        "providers ready"
    );
    Ok((search, llm))
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "delve_cli=debug,delve_core=debug,tower_http=debug"
    } else {
        "delve_cli=info,delve_core=info,tower_http=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
