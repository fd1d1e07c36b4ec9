//! Link Relay CLI - operator commands against a running relay

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8080";

#[derive(Parser)]
#[command(name = "linkrelay-ctl")]
#[command(about = "Link Relay operator CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "LINKRELAY_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the relay answers
    Health,

    /// Show queue and dispatcher status
    Status,

    /// Change the sending interval (minutes)
    SetInterval {
        /// Positive whole number of minutes
        #[arg(allow_hyphen_values = true)]
        minutes: String,
    },

    /// Queue every accepted link found in the text
    Enqueue {
        /// Free text containing links
        text: String,
    },

    /// List links waiting to be sent, oldest first
    Pending {
        /// Show at most this many links
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Tabled)]
struct PendingRow {
    #[tabled(rename = "#")]
    position: usize,
    link: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to relay")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn link_list(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|links| {
            links
                .iter()
                .filter_map(|l| l.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Health => match call_rpc(&cli.rpc_url, "health.v1", json!({})).await {
            Ok(result) => {
                println!("{} {}", "✓".green(), result.as_str().unwrap_or_default());
            }
            Err(e) => {
                println!("{} {}", "✗".red(), e);
                std::process::exit(1);
            }
        },

        Commands::Status => {
            println!("{}", "Relay Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "relay.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Pending:".bold(), stats["queue_length"]);
                    println!(
                        "  {} {} minutes",
                        "Interval:".bold(),
                        stats["interval_minutes"]
                    );
                    println!(
                        "  {} {}",
                        "Dispatcher:".bold(),
                        stats["dispatcher_state"].as_str().unwrap_or("UNKNOWN")
                    );
                    println!();
                    println!("  {} {}", "Enqueued:".bold(), stats["enqueued_total"]);
                    println!("  {} {}", "Sent:".bold(), stats["sent_total"]);
                    println!("  {} {}", "Failed:".bold(), stats["failed_total"]);
                    println!("  {} {}", "Empty cycles:".bold(), stats["empty_cycles"]);
                    println!("  {} {}", "Busy cycles:".bold(), stats["busy_cycles"]);
                    if let Some(at) = stats["last_sent_at"].as_i64() {
                        println!("  {} {} (unix ms)", "Last sent:".bold(), at);
                    }
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::SetInterval { minutes } => {
            let params = json!({ "interval": minutes });
            let result = call_rpc(&cli.rpc_url, "relay.set_interval.v1", params).await?;

            println!(
                "{}",
                format!("✓ {}", result["message"].as_str().unwrap_or_default())
                    .green()
                    .bold()
            );
        }

        Commands::Enqueue { text } => {
            let result = call_rpc(&cli.rpc_url, "relay.enqueue.v1", json!({ "text": text })).await?;
            let links = link_list(&result["links"]);

            if links.is_empty() {
                println!("{}", "No supported links found".yellow());
            } else {
                println!(
                    "{}",
                    format!("✓ Queued {} link(s)", links.len()).green().bold()
                );
                for link in &links {
                    println!("  {} {}", "•".bold(), link);
                }
            }
            println!("  {} {}", "Queue length:".bold(), result["queue_length"]);
        }

        Commands::Pending { limit } => {
            let result = call_rpc(&cli.rpc_url, "relay.pending.v1", json!({ "limit": limit })).await?;
            let links = link_list(&result["links"]);

            if links.is_empty() {
                println!("{}", "Queue is empty".yellow());
                return Ok(());
            }

            let rows: Vec<PendingRow> = links
                .into_iter()
                .enumerate()
                .map(|(i, link)| PendingRow {
                    position: i + 1,
                    link,
                })
                .collect();

            println!(
                "{}",
                format!("{} of {} pending", rows.len(), result["total"]).cyan().bold()
            );
            println!();
            println!("{}", Table::new(rows));
        }
    }

    Ok(())
}
