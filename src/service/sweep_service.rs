//! 后台定时任务：播放超时回收、媒体清理、历史保留期清理

use crate::config::parameter::ServerSettings;
use crate::service::history_service::HistoryService;
use crate::service::media_service::MediaService;
use crate::service::playback_service::PlaybackService;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

#[derive(Clone)]
pub struct SweepService {
    sched: JobScheduler,
    playback_service: Arc<PlaybackService>,
    history_service: Arc<HistoryService>,
    media_service: Arc<MediaService>,
    settings: ServerSettings,
}

impl SweepService {
    pub fn new(
        sched: &JobScheduler,
        playback_service: &Arc<PlaybackService>,
        history_service: &Arc<HistoryService>,
        media_service: &Arc<MediaService>,
        settings: &ServerSettings,
    ) -> Self {
        Self {
            sched: sched.clone(),
            playback_service: Arc::clone(playback_service),
            history_service: Arc::clone(history_service),
            media_service: Arc::clone(media_service),
            settings: settings.clone(),
        }
    }

    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        let expiry = self.add_job(&self.settings.expiry_sweep_cron, |sweep| async move {
            sweep.expire_playing().await;
        });
        let media = self.add_job(&self.settings.media_sweep_cron, |sweep| async move {
            sweep.sweep_media().await;
        });
        let retention = self.add_job(&self.settings.retention_sweep_cron, |sweep| async move {
            sweep.purge_history().await;
        });
        for uuid in [expiry.await?, media.await?, retention.await?] {
            tracing::debug!("sweep job scheduled - uuid:{}", uuid);
        }
        self.sched.start().await?;
        tracing::info!(
            "sweeps started - expiry:{} | media:{} | retention:{}",
            self.settings.expiry_sweep_cron,
            self.settings.media_sweep_cron,
            self.settings.retention_sweep_cron
        );
        Ok(())
    }

    async fn add_job<F, Fut>(&self, cron_expression: &str, run: F) -> Result<Uuid, JobSchedulerError>
    where
        F: Fn(SweepService) -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let sweep = self.clone();
        let job = Job::new_async(cron_expression, move |_uuid, mut _l| {
            let n_sweep = sweep.clone();
            let n_run = run.clone();
            Box::pin(async move {
                n_run(n_sweep).await;
            })
        })?;
        self.sched.add(job).await
    }

    pub async fn expire_playing(&self) {
        match self
            .playback_service
            .expire_overdue(Utc::now(), self.settings.expiry_grace_secs)
            .await
        {
            Ok(0) => {}
            Ok(count) => tracing::info!("expiry sweep - completed:{}", count),
            Err(err) => tracing::error!("expiry sweep failed - err:{}", err),
        }
    }

    pub async fn sweep_media(&self) {
        let max_age = Duration::from_secs(self.settings.media_max_age_secs.max(0) as u64);
        match self.media_service.sweep_stale(max_age).await {
            Ok(0) => tracing::debug!("media sweep - nothing to remove"),
            Ok(count) => tracing::info!("media sweep - removed:{}", count),
            Err(err) => tracing::warn!("media sweep failed - err:{}", err),
        }
    }

    pub async fn purge_history(&self) {
        if let Err(err) = self.history_service.purge_expired(Utc::now()).await {
            tracing::error!("retention sweep failed - err:{}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support;

    #[tokio::test]
    async fn sweeps_run_against_live_services() {
        let ctx = test_support::context().await;
        let record = ctx.approved_image("live.jpg").await;
        ctx.services
            .playback
            .mark_playing(&record.id, Utc::now() - chrono::Duration::seconds(120))
            .await
            .unwrap();
        std::fs::write(ctx.upload_dir().join("orphan.jpg"), b"x").unwrap();

        let settings = ServerSettings {
            media_max_age_secs: 0,
            expiry_grace_secs: 0,
            ..Default::default()
        };
        let sched = JobScheduler::new().await.unwrap();
        let sweep = SweepService::new(
            &sched,
            &ctx.services.playback,
            &ctx.services.history,
            &ctx.services.media,
            &settings,
        );

        sweep.expire_playing().await;
        assert!(ctx.services.queue_repo.list().await.unwrap().is_empty());
        assert_eq!(ctx.services.history.list().await.unwrap().len(), 1);

        sweep.sweep_media().await;
        assert!(!ctx.upload_dir().join("orphan.jpg").exists());
        // 历史记录仍然引用
        assert!(ctx.upload_dir().join("live.jpg").exists());

        sweep.purge_history().await;
        assert_eq!(ctx.services.history.list().await.unwrap().len(), 1);
    }
}
