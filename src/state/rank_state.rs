use crate::service::rank_service::RankService;
use crate::service::AppServices;
use std::sync::Arc;

#[derive(Clone)]
pub struct RankState {
    pub rank_service: Arc<RankService>,
}

impl RankState {
    pub fn new(services: &AppServices) -> Self {
        Self {
            rank_service: Arc::clone(&services.rank),
        }
    }
}
