use a2a::a2a::{A2aRelayClient, AgentCard, PeerRelay, AGENT_CARD_PATH};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "a2a-agents")]
#[command(about = "PrimeAgent / SecondaryAgent with agent-to-agent relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run PrimeAgent (coding assistant; `agent` switches a conversation to forwarding mode).
    Prime {
        /// Config file path (default: A2A_CONFIG_PATH or ~/.a2a-agents/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 3978)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Run SecondaryAgent (echo agent).
    Secondary {
        /// Config file path (default: A2A_CONFIG_PATH or ~/.a2a-agents/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 3979)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send one A2A message to a running agent and print its response.
    Send {
        /// Agent base URL (e.g. http://localhost:3979)
        #[arg(long, value_name = "URL")]
        url: String,

        /// agentId sent with the request
        #[arg(long, default_value = "a2a-cli")]
        agent_id: String,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,

        message: String,
    },

    /// Fetch and print an agent's card.
    Card {
        /// Agent base URL (e.g. http://localhost:3978)
        #[arg(long, value_name = "URL")]
        url: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("a2a-agents {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Prime { config, port }) => run_prime(config, port).await,
        Some(Commands::Secondary { config, port }) => run_secondary(config, port).await,
        Some(Commands::Send {
            url,
            agent_id,
            timeout,
            message,
        }) => run_send(&url, &agent_id, timeout, &message).await,
        Some(Commands::Card { url }) => run_card(&url).await,
        None => {
            println!("Run with --help for usage");
            Ok(())
        }
    };
    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run_prime(config_path: Option<std::path::PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, path) = a2a::config::load_config(config_path)?;
    if let Some(p) = port {
        config.prime.port = p;
    }
    log::info!(
        "starting PrimeAgent on {}:{} (config {})",
        config.prime.bind,
        config.prime.port,
        path.display()
    );
    a2a::gateway::run_prime(config).await
}

async fn run_secondary(config_path: Option<std::path::PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, path) = a2a::config::load_config(config_path)?;
    if let Some(p) = port {
        config.secondary.port = p;
    }
    log::info!(
        "starting SecondaryAgent on {}:{} (config {})",
        config.secondary.bind,
        config.secondary.port,
        path.display()
    );
    a2a::gateway::run_secondary(config).await
}

async fn run_send(url: &str, agent_id: &str, timeout: u64, message: &str) -> anyhow::Result<()> {
    let client = A2aRelayClient::new(Duration::from_secs(timeout.max(1)))?;
    let res = client.relay(url, message, agent_id).await?;
    if !res.agent_name.is_empty() {
        println!("{}:", res.agent_name);
    }
    println!("{}", res.response);
    Ok(())
}

async fn run_card(url: &str) -> anyhow::Result<()> {
    let card_url = format!("{}{}", url.trim().trim_end_matches('/'), AGENT_CARD_PATH);
    let res = reqwest_get(&card_url).await?;
    let card: AgentCard = serde_json::from_str(&res)
        .with_context(|| format!("parsing agent card from {}", card_url))?;
    println!("{}", serde_json::to_string_pretty(&card)?);
    Ok(())
}

async fn reqwest_get(url: &str) -> anyhow::Result<String> {
    let res = reqwest::get(url).await?;
    if !res.status().is_success() {
        anyhow::bail!("GET {} returned {}", url, res.status());
    }
    Ok(res.text().await?)
}
