// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::api::{start_server, AnalyzeResponse};
use crate::config::DetectionConfig;
use crate::detection::{DetectionService, ImagePayload};

/// Detection relay CLI
#[derive(Parser, Debug)]
#[command(name = "detection-relay")]
#[command(version, about = "Fans captured images out to hosted object-detection models", long_about = None)]
pub struct Cli {
    /// TOML file listing the detection models (overrides DETECTION_MODELS)
    #[arg(short, long, global = true, env = "DETECTION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Upstream request timeout in seconds (default: none)
    #[arg(long, global = true)]
    pub upstream_timeout_secs: Option<u64>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve(ServeArgs),

    /// Analyze one image file and print the result as JSON
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Listen address, e.g. 0.0.0.0:8080
    #[arg(long, env = "BIND_ADDR")]
    pub bind: Option<String>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Encoded image file (JPEG, PNG, ...)
    pub image: PathBuf,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

impl Cli {
    /// Resolve configuration from the file, or the environment, plus CLI overrides
    pub fn load_config(&self) -> Result<DetectionConfig> {
        let mut config = match &self.config {
            Some(path) => DetectionConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => DetectionConfig::from_env(),
        };
        if self.upstream_timeout_secs.is_some() {
            config.upstream_timeout_secs = self.upstream_timeout_secs;
        }
        let bind = match &self.command {
            Some(Commands::Serve(args)) => args.bind.clone(),
            // Bare invocation serves too
            None => std::env::var("BIND_ADDR").ok(),
            Some(Commands::Analyze(_)) => None,
        };
        if let Some(bind) = bind {
            config.bind_addr = bind;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;

    if config.models.is_empty() {
        warn!("No detection models configured; analyses will return empty results");
    }
    for model in &config.models {
        info!("Model {} -> {}", model.id, model.endpoint());
    }

    let service = DetectionService::hosted(config.models.clone(), config.upstream_timeout())?;

    match cli.command {
        None | Some(Commands::Serve(_)) => start_server(&config, service).await,
        Some(Commands::Analyze(args)) => analyze_file(&service, args).await,
    }
}

async fn analyze_file(service: &DetectionService, args: AnalyzeArgs) -> Result<()> {
    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("reading {}", args.image.display()))?;
    let image = ImagePayload::from_bytes(&bytes)?;

    let start = std::time::Instant::now();
    let results = service.analyze(&image).await?;
    let response = AnalyzeResponse::new(
        uuid::Uuid::new_v4().to_string(),
        results,
        start.elapsed().as_millis() as u64,
    );

    let json = if args.compact {
        serde_json::to_string(&response)?
    } else {
        serde_json::to_string_pretty(&response)?
    };
    println!("{}", json);
    Ok(())
}
