mod cli;
mod server;

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use regsync_core::{ReconciliationEngine, ServiceTagger, TaskProjector};
use regsync_http::{ConsulClient, MarathonClient};
use regsync_model::AppId;
use regsync_observe::init_logger;
use regsync_prometheus::PrometheusMetrics;

use crate::cli::{Cli, Command};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logger(&cli.logger_config())?;
    info!(scheduler = %cli.scheduler, registry = %cli.registry, "regsyncd starting");

    let scheduler = Arc::new(MarathonClient::new(&cli.scheduler, cli.scheduler_http())?);
    let registry = Arc::new(ConsulClient::new(&cli.registry, cli.registry_http())?);
    let tagger = ServiceTagger::new(cli.tagger_config())?;
    let engine = ReconciliationEngine::new(scheduler, registry, TaskProjector::new(tagger));

    match cli.command() {
        Command::Run => run(&cli, engine).await,
        Command::Plan => plan(engine).await,
        Command::Inspect { app } => inspect(engine, &app).await,
    }
}

async fn run(cli: &Cli, mut engine: ReconciliationEngine) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    if let Some(addr) = cli.metrics_addr {
        let metrics = PrometheusMetrics::new()?;
        engine = engine.with_metrics(Arc::new(metrics.clone()));

        let token = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = server::serve(addr, metrics, token).await {
                error!(error = %e, "metrics endpoint failed");
            }
        });
    }

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            shutdown.cancel();
        }
    });

    let res = engine.supervise(cli.reconnect_policy(), cancel.clone()).await;
    cancel.cancel();
    res?;

    info!("regsyncd stopped");
    Ok(())
}

async fn plan(mut engine: ReconciliationEngine) -> anyhow::Result<()> {
    let plan = engine.plan().await?;

    for record in &plan.register {
        println!(
            "register    {} {} {}:{} {}",
            record.id,
            record.name,
            record.address,
            record.port,
            record.tags.join(",")
        );
    }
    for id in &plan.deregister {
        println!("deregister  {id}");
    }
    for id in &plan.unchanged {
        println!("unchanged   {id}");
    }
    info!(
        apps = plan.apps_found,
        register = plan.register.len(),
        deregister = plan.deregister.len(),
        unchanged = plan.unchanged.len(),
        "plan computed"
    );
    Ok(())
}

async fn inspect(engine: ReconciliationEngine, app: &AppId) -> anyhow::Result<()> {
    let view = engine.inspect(app).await?;

    if !view.eligible {
        println!("{}: no http health check, tasks are not registered", view.app_id);
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&view.records)?);
    for id in &view.skipped {
        println!("skipped {id}: cannot be projected");
    }
    Ok(())
}
