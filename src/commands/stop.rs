use devrun::Orchestrator;

pub async fn run_stop(orchestrator: &Orchestrator, services: Vec<String>) -> anyhow::Result<()> {
    let stopped = orchestrator.stop(&services).await;
    tracing::debug!(stopped, "Stop finished");
    Ok(())
}
