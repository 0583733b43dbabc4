// Interactive client CLI: a thin menu over the router's HTTP
// surface, restoring the original `client.py` interaction loop.

use clap::Parser;
use std::io::{self, Write};

use dynamo_kv_store::config::ClientConfig;
use dynamo_kv_store::logging::init_tracing;
use dynamo_kv_store::types::{validate_key, validate_value};

#[derive(Parser)]
struct Args {
    #[arg(long, default_value = "client.yaml")]
    config: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = ClientConfig::load(&args.config)?;
    let base_url = format!("http://{}:{}", config.lb_host, config.lb_port);
    let http = reqwest::Client::new();

    loop {
        print_menu();
        let choice = prompt("choice> ")?;
        match choice.trim() {
            "1" => {
                let resp = http
                    .post(format!("{base_url}/init"))
                    .json(&serde_json::json!({ "server_list": config.server_list }))
                    .send()
                    .await?;
                let body: serde_json::Value = resp.json().await?;
                println!("init -> {body}");
            }
            "2" => {
                let key = prompt("key> ")?;
                if let Err(e) = validate_key(key.trim()) {
                    println!("invalid key: {e}");
                    continue;
                }
                let resp = http
                    .get(format!("{base_url}/get/{}", key.trim()))
                    .send()
                    .await?;
                let body: serde_json::Value = resp.json().await?;
                println!("get -> {body}");
            }
            "3" => {
                let key = prompt("key> ")?;
                let value = prompt("value> ")?;
                if let Err(e) = validate_key(key.trim()).and_then(|_| validate_value(value.trim())) {
                    println!("invalid input: {e}");
                    continue;
                }
                let resp = http
                    .post(format!("{base_url}/put"))
                    .json(&serde_json::json!({ "key": key.trim(), "value": value.trim() }))
                    .send()
                    .await?;
                let body: serde_json::Value = resp.json().await?;
                println!("put -> {body}");
            }
            "4" => {
                let resp = http.post(format!("{base_url}/destroy")).send().await?;
                let body: serde_json::Value = resp.json().await?;
                println!("shutdown -> {body}");
                break;
            }
            "5" => {
                let host = prompt("host> ")?;
                let port = prompt("port> ")?;
                let resp = http
                    .post(format!("{base_url}/toggle/{}/{}", host.trim(), port.trim()))
                    .send()
                    .await?;
                println!("toggle-server -> {}", resp.status());
            }
            _ => break,
        }
    }

    Ok(())
}

fn print_menu() {
    println!("\n1) init  2) get  3) put  4) shutdown  5) toggle-server  other) exit");
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
