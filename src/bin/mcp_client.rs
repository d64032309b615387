//! Command-line client for a running document MCP server.
//!
//! ```text
//! mcp_client health              # server health as JSON
//! mcp_client tools               # tool descriptors as JSON
//! mcp_client <prompt words...>   # prompt search, prints the result envelope
//! ```
//!
//! The server address comes from `MCP_SERVER_URL`, or from
//! `MCP_SERVER_HOST` and `MCP_SERVER_PORT`.

use anyhow::{Result, bail};
use tracing_subscriber::{EnvFilter, fmt};

use document_mcp_server::McpClient;

const USAGE: &str = "usage: mcp_client health | tools | <prompt>";

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let client = McpClient::from_env()?;

    let output = match args.first().map(String::as_str) {
        None => bail!(USAGE),
        Some("-h" | "--help") => {
            println!("{USAGE}");
            return Ok(());
        }
        Some("health") => client.health_check().await,
        Some("tools") => serde_json::to_value(client.list_tools().await)?,
        Some(_) => {
            let prompt = args.join(" ");
            serde_json::to_value(client.process_prompt(&prompt).await)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
