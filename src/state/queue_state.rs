use crate::service::intake_service::IntakeService;
use crate::service::moderation_service::ModerationService;
use crate::service::playback_service::PlaybackService;
use crate::service::status_service::StatusService;
use crate::service::AppServices;
use std::sync::Arc;

#[derive(Clone)]
pub struct QueueState {
    pub intake_service: Arc<IntakeService>,
    pub moderation_service: Arc<ModerationService>,
    pub playback_service: Arc<PlaybackService>,
    pub status_service: Arc<StatusService>,
}

impl QueueState {
    pub fn new(services: &AppServices) -> Self {
        Self {
            intake_service: Arc::clone(&services.intake),
            moderation_service: Arc::clone(&services.moderation),
            playback_service: Arc::clone(&services.playback),
            status_service: Arc::clone(&services.status),
        }
    }
}
