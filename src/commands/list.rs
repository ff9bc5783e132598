use devrun::service::Service;
use devrun::Orchestrator;

pub fn run_list(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    let services = orchestrator.registry().services();
    if services.is_empty() {
        println!("No services registered.");
        return Ok(());
    }

    let width = services.iter().map(|s| s.name.len()).max().unwrap_or(0).max(4);
    println!("{:<width$}  {:<10}  PATH", "NAME", "ROLES", width = width);
    for service in services {
        let path = service
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not set)".to_string());
        println!(
            "{:<width$}  {:<10}  {}",
            service.name,
            roles(service),
            path,
            width = width
        );
    }
    Ok(())
}

fn roles(service: &Service) -> String {
    let kind = service.kind;
    let roles: Vec<&str> = [
        (kind.primary, "primary"),
        (kind.ion, "ion"),
        (kind.npm, "npm"),
    ]
    .into_iter()
    .filter_map(|(set, role)| set.then_some(role))
    .collect();
    if roles.is_empty() {
        "-".to_string()
    } else {
        roles.join(",")
    }
}
