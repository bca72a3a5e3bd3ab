use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "breach-cli")]
#[command(about = "Command line client for the breach lookup service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    url: String,

    /// Accept self-signed certificates.
    #[arg(short = 'k', long)]
    insecure: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SearchArgs {
    /// Text to look up.
    query: String,

    /// Match regardless of case.
    #[arg(short, long)]
    ignore_case: bool,

    /// Include values that merely contain the query.
    #[arg(short, long)]
    substring: bool,
}

impl SearchArgs {
    fn body(&self) -> Value {
        json!({
            "query_string": self.query,
            "ignore_case": self.ignore_case,
            "include_substring_matches": self.substring,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check the service is up
    Health,
    /// Show dataset row counts per source
    Stats,
    /// Look up a password
    Password(SearchArgs),
    /// Look up a username
    Username(SearchArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(cli.insecure)
        .build()?;
    let base = cli.url.trim_end_matches('/');

    let res = match &cli.command {
        Commands::Health => client.get(format!("{base}/health")).send().await?,
        Commands::Stats => client.get(format!("{base}/stats")).send().await?,
        Commands::Password(args) => {
            client
                .post(format!("{base}/password"))
                .json(&args.body())
                .send()
                .await?
        }
        Commands::Username(args) => {
            client
                .post(format!("{base}/username"))
                .json(&args.body())
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
