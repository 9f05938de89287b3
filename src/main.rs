//! syncserve binary entry point

mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use syncserve::{
    CommandValidator, FileWatchService, ReadWriteHandler, SchemaSet, ServerConfig, TreeHandler,
};

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }

    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("sync root {} not accessible", cli.root.display()))?;

    let schemas = match &cli.schema {
        Some(path) => SchemaSet::load(path)
            .with_context(|| format!("failed to load schema {}", path.display()))?,
        None => SchemaSet::builtin(),
    };

    let watch = FileWatchService::with_timeouts(
        root.clone(),
        config.poll_timeout(),
        config.session_expiry(),
    );
    watch.start_sweeper(config.sweep_interval());

    let mut validator = CommandValidator::new(schemas, root.clone());
    validator.register(&ReadWriteHandler);
    validator.register(&TreeHandler::new(root.clone()));
    validator.register(&watch);

    info!(root = %root.display(), bind = %config.bind, "starting server");
    syncserve::server::serve(&config.bind, Arc::new(validator)).await?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
