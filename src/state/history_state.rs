use crate::service::history_service::HistoryService;
use crate::service::AppServices;
use std::sync::Arc;

#[derive(Clone)]
pub struct HistoryState {
    pub history_service: Arc<HistoryService>,
}

impl HistoryState {
    pub fn new(services: &AppServices) -> Self {
        Self {
            history_service: Arc::clone(&services.history),
        }
    }
}
