// src/main.rs

//! The command-line entry point: executes one batch template and prints the
//! composite response as pretty JSON.

use anyhow::{Context, Result, bail};
use jsonbatch::config::Config;
use jsonbatch::core::dispatch::HttpDispatcher;
use jsonbatch::core::model::{BatchTemplate, Request};
use jsonbatch::{BatchEngine, JsonBuilder};
use std::env;
use std::fs;
use std::path::Path;
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) {
        println!("jsonbatch version {VERSION}");
        return Ok(());
    }

    // Determine the configuration path. It can be provided via a --config
    // flag; otherwise "config.toml" is used when present, and built-in
    // defaults when not.
    let config_path = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config = match config_path {
        Some(path) => match Config::from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load configuration from \"{path}\": {e}");
                std::process::exit(1);
            }
        },
        None if Path::new("config.toml").exists() => Config::from_file("config.toml")?,
        None => Config::default(),
    };

    // Setup logging with compact format and ANSI colors.
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .compact()
        .with_ansi(true)
        .init();

    // The template path is the first free argument.
    let mut free_args = Vec::new();
    let mut skip = false;
    for arg in &args[1..] {
        if skip {
            skip = false;
            continue;
        }
        match arg.as_str() {
            "--config" | "--request" => skip = true,
            _ => free_args.push(arg.clone()),
        }
    }
    let Some(template_path) = free_args.first() else {
        bail!("Usage: jsonbatch [--config config.toml] [--request request.json] template.json");
    };

    let template_text = fs::read_to_string(template_path)
        .with_context(|| format!("Failed to read template file at '{template_path}'"))?;
    let template = BatchTemplate::from_json(&template_text)?;

    // The original request is optional; an empty one is used when absent.
    let original = match args
        .iter()
        .position(|arg| arg == "--request")
        .and_then(|i| args.get(i + 1))
    {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read request file at '{path}'"))?;
            serde_json::from_str::<Request>(&text)
                .with_context(|| format!("Failed to parse request JSON from '{path}'"))?
        }
        None => Request::default(),
    };

    let dispatcher = HttpDispatcher::new(&config.http, &config.security)?;
    let engine = BatchEngine::new(JsonBuilder::standard(), dispatcher);

    match engine.execute(original, &template).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            error!("Batch execution failed: {}", e);
            Err(e.into())
        }
    }
}
