use crate::config::Settings;
use crate::output::Console;
use crate::process::ProcessRunner;
use crate::prompt::InteractionGateway;
use std::sync::Arc;

/// Collaborators shared by every orchestration component for one run.
#[derive(Clone)]
pub struct Context {
    pub settings: Arc<Settings>,
    pub runner: Arc<dyn ProcessRunner>,
    pub gateway: Arc<dyn InteractionGateway>,
    pub console: Arc<dyn Console>,
}

impl Context {
    pub fn new(
        settings: Settings,
        runner: Arc<dyn ProcessRunner>,
        gateway: Arc<dyn InteractionGateway>,
        console: Arc<dyn Console>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            runner,
            gateway,
            console,
        }
    }
}
