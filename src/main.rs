//! MCP Server Entry Point
//!
//! Initializes logging, loads configuration, assembles the tool registry
//! and serves it over the configured transport. A registration conflict
//! aborts startup before any transport is opened.

use anyhow::Result;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt};

use cogito_mcp::core::{Config, McpServer, TransportService};
use cogito_mcp::domains::tools::{definitions::REGISTRARS, stage_tools};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config.logging.level, config.logging.with_timestamps);

    config.validate()?;

    info!("Starting {} v{}", config.server.name, config.server.version);

    let staging = stage_tools(REGISTRARS)?;
    let server = McpServer::new(config.clone(), &staging)?;

    for tool in server.list_tools() {
        info!(tool = tool.name(), "Registered tool");
    }
    info!("Server initialized with {} tool(s)", server.list_tools().len());

    let stopper = server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, stopping server");
                stopper.stop();
            }
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    let transport = TransportService::new(config.transport);
    server.serve(transport).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr so they never interleave with the stdio transport.
fn init_logging(level: &str, with_timestamps: bool) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if with_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
