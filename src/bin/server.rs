//! mcp-server-qdrant
//!
//! Entry point: loads configuration, builds the embedding provider and the
//! vector store connector, then serves the memory tools over stdio or SSE.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use mcp_server_qdrant::config::{self, Config, LogConfig, LogFormat};
use mcp_server_qdrant::embedding::create_provider;
use mcp_server_qdrant::mcp::{serve_sse, serve_stdio, McpServer};
use mcp_server_qdrant::qdrant::QdrantConnector;
use mcp_server_qdrant::tools::ToolRegistry;
use mcp_server_qdrant::{logging, VERSION};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Stdio,
    Sse,
}

#[derive(Parser, Debug)]
#[command(
    name = "mcp-server-qdrant",
    version = VERSION,
    about = "MCP server exposing semantic memory backed by Qdrant",
    long_about = None
)]
struct Args {
    /// Transport protocol to serve
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Log level (debug, info, warning, error, critical); overrides LOG_LEVEL
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON objects; overrides LOG_FORMAT
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(args.transport, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Layer CLI flags over file and environment, validate, install logging
fn load(args: &Args) -> anyhow::Result<Config> {
    let mut config = config::load_config().context("Failed to load configuration")?;

    if let Some(level) = &args.log_level {
        config.log.level = LogConfig::normalize_level(level);
    }
    if args.json_logs {
        config.log.format = LogFormat::Json;
    }

    let warnings = config::validate_config(&config).into_result()?;
    logging::init(&config.log)?;

    for warning in warnings {
        warn!("Configuration warning: {}", warning);
    }
    Ok(config)
}

async fn run(transport: Transport, config: Config) -> anyhow::Result<()> {
    info!(version = VERSION, transport = ?transport, "Starting mcp-server-qdrant");

    let provider = create_provider(&config.embedding)?;
    let connector = QdrantConnector::connect(&config.qdrant, provider)
        .await?
        .with_limits(config.tools.default_limit, config.tools.max_limit);

    let registry = ToolRegistry::with_memory_tools(Arc::new(connector), &config.tools);
    info!(tools = ?registry.names(), "Tools registered");
    let server = Arc::new(McpServer::new(Arc::new(registry)));

    match transport {
        Transport::Stdio => serve_stdio(server).await?,
        Transport::Sse => serve_sse(server, &config.server.host, config.server.port).await?,
    }

    info!("Server stopped");
    Ok(())
}
