use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "slotctl")]
#[command(about = "Inspect a running slotd instance", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show pool occupancy and credential status
    Health {
        #[arg(long, default_value = "/healthz")]
        path: String,
    },
    /// Issue a GET request and print the response
    Get { path: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let path = match &cli.command {
        Commands::Health { path } => path,
        Commands::Get { path } => path,
    };
    let res = client.get(format!("{}/{}", base, path.trim_start_matches('/'))).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let slot = res
        .headers()
        .get("x-worker-slot")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    eprintln!(
        "{} (request {}, slot {})",
        status,
        request_id.as_deref().unwrap_or("-"),
        slot.as_deref().unwrap_or("-"),
    );

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(status.is_success())
}
