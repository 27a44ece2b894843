use relay::providers::base::Provider;
use relay::systems::Toolbox;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn Provider>,
    pub toolbox: Arc<Toolbox>,
}

impl AppState {
    pub fn new(provider: Arc<dyn Provider>, toolbox: Arc<Toolbox>) -> Self {
        Self { provider, toolbox }
    }
}
