use clap::{Parser, Subcommand};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Send forms through a running form-relay", long_about = None)]
struct Cli {
    /// Base URL of the relay.
    #[arg(short, long, default_value = "http://localhost:8080")]
    relay: String,

    /// Path the relay endpoint is mounted on.
    #[arg(short, long, default_value = "/api/proxy")]
    path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the relay is up
    Health,
    /// Post a form to TARGET through the relay
    Send {
        /// Absolute URL of the upstream endpoint.
        target: String,

        /// Form fields as key=value.
        #[arg(value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Send this string as the body verbatim instead of FIELDS.
        #[arg(long, conflicts_with = "fields")]
        raw: Option<String>,
    },
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.relay.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Send { target, fields, raw } => {
            let url = format!("{}{}?url={}", base, cli.path, urlencoding::encode(&target));
            let request = match raw {
                Some(body) => client.post(url).header(CONTENT_TYPE, "text/plain").body(body),
                None => client.post(url).form(&fields),
            };
            print_response(request.send().await?).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await?;
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
