pub mod config_service;
pub mod estimator;
pub mod history_service;
pub mod intake_service;
pub mod media_service;
pub mod moderation_service;
pub mod playback_service;
pub mod rank_service;
pub mod status_service;
pub mod sweep_service;

use crate::config::parameter::ServerSettings;
use crate::db::database::Database;
use crate::realtime::hub::RealtimeHub;
use crate::repository::history_repository::{HistoryRepository, HistoryRepositoryTrait};
use crate::repository::queue_repository::{QueueRepository, QueueRepositoryTrait};
use crate::repository::rank_repository::RankRepository;
use crate::repository::setting_repository::SettingRepository;
use crate::utils::media::MediaStore;
use std::sync::Arc;

use config_service::ConfigService;
use history_service::HistoryService;
use intake_service::IntakeService;
use media_service::MediaService;
use moderation_service::ModerationService;
use playback_service::PlaybackService;
use rank_service::RankService;
use status_service::StatusService;

/// 进程内共享的全部服务
#[derive(Clone)]
pub struct AppServices {
    pub hub: RealtimeHub,
    pub queue_repo: Arc<dyn QueueRepositoryTrait>,
    pub config: Arc<ConfigService>,
    pub status: Arc<StatusService>,
    pub rank: Arc<RankService>,
    pub media: Arc<MediaService>,
    pub intake: Arc<IntakeService>,
    pub moderation: Arc<ModerationService>,
    pub playback: Arc<PlaybackService>,
    pub history: Arc<HistoryService>,
}

impl AppServices {
    pub fn new(db_conn: &Arc<Database>, settings: &ServerSettings, hub: RealtimeHub) -> Self {
        let queue_repo: Arc<dyn QueueRepositoryTrait> = Arc::new(QueueRepository::new(db_conn));
        let history_repo: Arc<dyn HistoryRepositoryTrait> =
            Arc::new(HistoryRepository::new(db_conn));

        let config = Arc::new(ConfigService::new(Arc::new(SettingRepository::new(db_conn))));
        let status = Arc::new(StatusService::new(queue_repo.clone(), &config, &hub));
        let rank = Arc::new(RankService::new(
            Arc::new(RankRepository::new(db_conn)),
            &hub,
            settings.ranking_top_n,
        ));
        let media = Arc::new(MediaService::new(
            MediaStore::new(settings.upload_dir.clone()),
            queue_repo.clone(),
            history_repo.clone(),
        ));
        let intake = Arc::new(IntakeService::new(
            queue_repo.clone(),
            &config,
            &rank,
            &status,
            settings.gift_table_count,
        ));
        let moderation = Arc::new(ModerationService::new(queue_repo.clone(), &media, &status));
        let playback = Arc::new(PlaybackService::new(
            queue_repo.clone(),
            history_repo.clone(),
            &status,
            &hub,
        ));
        let history = Arc::new(HistoryService::new(
            history_repo,
            queue_repo.clone(),
            &media,
            &status,
            settings.history_retention_secs,
        ));

        Self {
            hub,
            queue_repo,
            config,
            status,
            rank,
            media,
            intake,
            moderation,
            playback,
            history,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::dto::queue_dto::SubmissionReq;
    use crate::model::queue::QueueRecord;
    use chrono::Utc;
    use std::path::PathBuf;
    use tempfile::TempDir;

    pub struct TestContext {
        pub services: AppServices,
        pub settings: ServerSettings,
        dir: TempDir,
    }

    /// 内存数据库 + 临时上传目录
    pub async fn context() -> TestContext {
        let dir = tempfile::tempdir().expect("temp upload dir");
        let settings = ServerSettings {
            upload_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let db = Arc::new(Database::in_memory().await);
        let services = AppServices::new(&db, &settings, RealtimeHub::default());
        TestContext {
            services,
            settings,
            dir,
        }
    }

    impl TestContext {
        pub fn upload_dir(&self) -> PathBuf {
            self.dir.path().to_path_buf()
        }

        pub async fn pending_image(&self, file_name: &str) -> QueueRecord {
            std::fs::write(self.dir.path().join(file_name), b"jpeg").unwrap();
            let req: SubmissionReq = serde_json::from_value(serde_json::json!({
                "type": "image",
                "text": "hello from table 3",
                "durationSeconds": 30,
                "amount": 0,
                "sender": "Tester",
                "mediaPath": format!("/uploads/{file_name}")
            }))
            .unwrap();
            self.services.intake.submit(req, Utc::now()).await.unwrap()
        }

        pub async fn approved_image(&self, file_name: &str) -> QueueRecord {
            let record = self.pending_image(file_name).await;
            self.services
                .moderation
                .approve(&record.id, Default::default(), Utc::now())
                .await
                .unwrap()
        }

        pub async fn pending_gift(&self, table_number: i64) -> QueueRecord {
            let req: SubmissionReq = serde_json::from_value(serde_json::json!({
                "type": "gift",
                "durationSeconds": 10,
                "sender": "Tester",
                "gift": {
                    "tableNumber": table_number,
                    "items": [{ "id": "w", "name": "Wine", "quantity": 1, "price": 500 }]
                }
            }))
            .unwrap();
            self.services.intake.submit(req, Utc::now()).await.unwrap()
        }
    }
}
