use devrun::output::Tone;
use devrun::service::EndReason;
use devrun::Orchestrator;
use tokio_util::sync::CancellationToken;

pub async fn run_start(orchestrator: &mut Orchestrator, services: Vec<String>) -> anyhow::Result<()> {
    if services.is_empty() {
        anyhow::bail!("No services given. Usage: devrun start <service>... [key=value]...");
    }

    // Ctrl+C aborts preparation as well as supervision.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let supervisors = tokio::select! {
        _ = cancel.cancelled() => {
            println!("\nStartup aborted");
            return Ok(());
        }
        started = orchestrator.start(&services, cancel.clone()) => started?,
    };
    if supervisors.is_empty() {
        return Ok(());
    }

    let reports = supervisors.wait().await;
    let console = &orchestrator.context().console;
    for report in &reports {
        tracing::debug!(
            service = %report.name,
            starts = report.starts,
            restarts = report.restarts,
            ended = %report.ended,
            "Supervisor finished"
        );
        if report.ended != EndReason::Cancelled {
            console.log(&[
                Tone::Cyan.text(&report.name),
                Tone::Red.text(format!("is no longer supervised ({})", report.ended)),
            ]);
        }
    }
    console.log(&[
        Tone::Magenta.text("Services"),
        Tone::Green.text(format!("Stopped ({} supervised)", reports.len())),
    ]);
    Ok(())
}
