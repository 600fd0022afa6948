use crate::realtime::hub::RealtimeHub;
use crate::service::config_service::ConfigService;
use crate::service::status_service::StatusService;
use crate::service::AppServices;
use std::sync::Arc;

#[derive(Clone)]
pub struct RealtimeState {
    pub hub: RealtimeHub,
    pub config_service: Arc<ConfigService>,
    pub status_service: Arc<StatusService>,
}

impl RealtimeState {
    pub fn new(services: &AppServices) -> Self {
        Self {
            hub: services.hub.clone(),
            config_service: Arc::clone(&services.config),
            status_service: Arc::clone(&services.status),
        }
    }
}
