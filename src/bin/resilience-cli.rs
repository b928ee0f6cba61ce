use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "resilience-cli")]
#[command(about = "Drive the resilience demo endpoints", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// How many times to call the endpoint.
    #[arg(short = 'n', long, default_value_t = 1)]
    count: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-call retry
    Retry,
    /// Per-call retry through the service entry point
    RetryForService,
    /// Retry with the shared, once-configured policy
    RetryForService2,
    /// Circuit breaker with fallback, no retry
    CircuitBreaker,
    /// Retry inside the circuit breaker
    CircuitBreakerAndRetry,
    /// Show circuit breaker states
    Breakers,
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Retry => "/retry",
            Commands::RetryForService => "/retry-for-service",
            Commands::RetryForService2 => "/retry-for-service2",
            Commands::CircuitBreaker => "/circuit-breaker",
            Commands::CircuitBreakerAndRetry => "/circuit-breaker-and-retry",
            Commands::Breakers => "/breakers",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());

    if let Commands::Breakers = cli.command {
        let res = client.get(&url).send().await?;
        let json: Value = res.json().await?;
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    for i in 1..=cli.count {
        let started = std::time::Instant::now();
        let res = client.get(&url).send().await?;
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        println!(
            "#{:<3} {} {:>6}ms  {}",
            i,
            status.as_u16(),
            started.elapsed().as_millis(),
            body
        );
    }

    Ok(())
}
