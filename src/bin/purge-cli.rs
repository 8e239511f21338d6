use std::process::ExitCode;

use clap::Parser;
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "purge-cli")]
#[command(about = "Purge a URL from the CDN cache through the edge proxy", long_about = None)]
struct Cli {
    /// Base URL of the edge proxy.
    #[arg(short, long, default_value = "https://localhost:8080")]
    proxy: String,

    /// Purge secret, when the proxy requires one.
    #[arg(short, long, env = "PURGE_SECRET")]
    token: Option<String>,

    /// Extra cache-key header, as `name=value`. Repeatable.
    #[arg(long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Absolute URL to purge.
    url: String,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected name=value, got `{raw}`")),
    }
}

fn purge_body(cli: &Cli) -> Value {
    let mut body = json!({ "url": cli.url });
    if !cli.headers.is_empty() {
        let headers: Map<String, Value> = cli
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        body["headers"] = Value::Object(headers);
    }
    if let Some(token) = &cli.token {
        body["token"] = Value::String(token.clone());
    }
    body
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/.purge", cli.proxy.trim_end_matches('/')))
        .json(&purge_body(&cli))
        .send()
        .await?;

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Error: proxy returned status {}", status);
        eprintln!("Response: {}", rendered);
        Ok(ExitCode::FAILURE)
    }
}
