use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(about = "Management CLI for integration-guard circuit breakers", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "GUARD_ADMIN_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Overall status and open circuits
    Status,
    /// Per-service breaker stats
    Breakers,
    /// Force a service's circuit open
    Open { service: String },
    /// Force a service's circuit closed
    Close { service: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = match &cli.command {
        Commands::Status => client.get(format!("{base}/health")).send().await?,
        Commands::Breakers => {
            client
                .get(format!("{base}/health/circuit-breakers"))
                .send()
                .await?
        }
        Commands::Open { service } => {
            client
                .post(format!("{base}/admin/circuit-breakers/{service}/open"))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Close { service } => {
            client
                .post(format!("{base}/admin/circuit-breakers/{service}/close"))
                .headers(headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: guard returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
