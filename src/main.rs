// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use masq::backends::{Backends, ProviderFactory};
use masq::config::{load_and_validate_config, Credentials};
use masq::engine::{Job, PipelineComposer, TaskOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "masq=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <config.yaml|config.toml> <image> [--upscale-only] [provider ...]", args[0]);
        eprintln!("Example: {} config/masq.yaml photo.png lanczos_x2 lanczos_x4", args[0]);
        std::process::exit(1);
    }

    let config_path = Path::new(&args[1]);
    let image_path = Path::new(&args[2]);
    let upscale_only = args[3..].iter().any(|arg| arg == "--upscale-only");
    let requested: Vec<String> = args[3..]
        .iter()
        .filter(|arg| !arg.starts_with("--"))
        .cloned()
        .collect();

    let config = load_and_validate_config(config_path)?;
    let credentials = Credentials::from_env(&config);

    // Remote clients and model loaders are supplied by the embedding service;
    // standalone, only transform providers can be built.
    let factory = ProviderFactory::new(&config, Backends::default());
    let registry = Arc::new(factory.build_registry(&config, &credentials));

    let image = std::fs::read(image_path)
        .with_context(|| format!("failed to read image {}", image_path.display()))?;
    let composer = PipelineComposer::from_config(&config, Arc::clone(&registry), factory.transform_pool().clone());

    let result = if upscale_only {
        composer.run_upscale_only(Job::new(image), None).await?
    } else {
        // The pipeline resolves the request; the deadline only needs an upper bound.
        let longest = registry
            .catalog()
            .iter()
            .filter(|spec| spec.available)
            .map(|spec| spec.per_call_timeout)
            .max()
            .unwrap_or_default();
        let job = Job::new(image)
            .with_providers(requested.iter().cloned())
            .with_deadline(config.shotgun.batch_timeout(longest));
        composer.run_pipeline(job, &requested, true, None).await?
    };

    if let Some(stage1) = result.stage1() {
        if stage1.results().is_empty() {
            bail!("none of the requested providers are available");
        }
        for outcome in stage1.results() {
            print_outcome(outcome);
        }
    }
    for (source, round) in result.stage2() {
        println!("{} ->", source);
        for outcome in round.results() {
            print_outcome(outcome);
        }
    }
    println!("{}", serde_json::to_string_pretty(&result.summary())?);

    Ok(())
}

fn print_outcome(outcome: &TaskOutcome) {
    println!(
        "{:<24} {:<12} {:>8.0} ms",
        outcome.provider_id(),
        outcome.status().as_str(),
        outcome.elapsed().as_secs_f64() * 1000.0
    );
}
