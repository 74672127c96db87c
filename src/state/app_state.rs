// Application state
// Store, gateways, live sessions and runtime configuration

use crate::compliance::StoreAuditSink;
use crate::gateway::{ImageGenerator, LlmGateway};
use crate::orchestrator::config::OrchestratorConfig;
use crate::orchestrator::Orchestrator;
use crate::services::DirectorService;
use crate::session::SessionRegistry;
use crate::store::Store;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Main application state
/// Cheap to clone; every field is shared
#[derive(Clone)]
pub struct AppState {
    /// Persistence
    pub store: Arc<Store>,
    /// Per-message orchestration
    pub director: DirectorService,
    /// LLM gateway used by direct role calls and matching
    pub gateway: Arc<dyn LlmGateway>,
    /// Image generation for the graphic design agent
    pub images: Arc<dyn ImageGenerator>,
    /// Live sessions and the activity feed
    pub sessions: Arc<SessionRegistry>,
    /// Runtime orchestrator settings
    pub config: Arc<RwLock<OrchestratorConfig>>,
}

impl AppState {
    /// Wire the services together
    pub fn new(
        store: Arc<Store>,
        gateway: Arc<dyn LlmGateway>,
        images: Arc<dyn ImageGenerator>,
        config: OrchestratorConfig,
        activity_capacity: usize,
    ) -> Self {
        let sessions = Arc::new(SessionRegistry::new(activity_capacity));
        let config = Arc::new(RwLock::new(config));
        let director = DirectorService::new(
            store.clone(),
            Orchestrator::with_gateway(gateway.clone()),
            sessions.clone(),
            Arc::new(StoreAuditSink::new(store.clone())),
            config.clone(),
        );

        Self {
            store,
            director,
            gateway,
            images,
            sessions,
            config,
        }
    }
}
