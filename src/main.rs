use crate::config::parameter::{self, ServerSettings};
use crate::db::database::{self, DatabaseTrait};
use crate::realtime::hub::RealtimeHub;
use crate::service::sweep_service::SweepService;
use crate::service::AppServices;

use chrono::Utc;
use tokio_cron_scheduler::JobScheduler;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod db;
mod dto;
mod error;
mod handler;
mod model;
mod realtime;
mod repository;
mod response;
mod routes;
mod service;
mod state;
mod utils;

// 内存分配器
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[cfg(target_env = "msvc")]
use mimalloc::MiMalloc;

#[cfg(target_env = "msvc")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    // 参数初始化
    parameter::init();
    let settings = ServerSettings::from_env();

    // 日志
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("display_queue")
        .filename_suffix("log")
        .max_log_files(60)
        .build(&settings.log_dir)
        .expect("file log init failed!");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let file_log_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_timer(time::LocalTime::rfc_3339());

    let console_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_timer(time::LocalTime::rfc_3339());
    tracing_subscriber::registry()
        .with(file_log_subscriber)
        .with(console_subscriber)
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let connection = database::Database::init(&settings)
        .await
        .unwrap_or_else(|e| panic!("Database error: {}", e.to_string()));
    let db_pool = Arc::new(connection);

    std::fs::create_dir_all(&settings.upload_dir).unwrap_or_else(|e| {
        panic!(
            "upload dir {} init failed, error:{}",
            settings.upload_dir.display(),
            e.to_string()
        )
    });

    let services = AppServices::new(&db_pool, &settings, RealtimeHub::default());
    if let Err(err) = services.config.load().await {
        panic!("Server error : display config load failed, error:{}", err);
    }

    // 旧版历史导入 --import_history=<path>
    if let Some(path) = parameter::cmd_arg_value("import_history") {
        match services
            .history
            .import_legacy(&PathBuf::from(&path), Utc::now())
            .await
        {
            Ok(report) => tracing::info!(
                "import_history - file:{} | imported:{} | duplicates:{} | skipped:{}",
                path,
                report.imported,
                report.duplicates,
                report.skipped
            ),
            Err(err) => panic!("import_history failed - file:{} | error:{}", path, err),
        }
    }

    let sched = JobScheduler::new()
        .await
        .unwrap_or_else(|e| panic!("scheduler init failed, error:{}", e.to_string()));
    let sweep_service = SweepService::new(
        &sched,
        &services.playback,
        &services.history,
        &services.media,
        &settings,
    );
    if let Err(err) = sweep_service.start().await {
        panic!("Server error : sweep jobs start failed, error:{}", err.to_string());
    }

    let host = format!("0.0.0.0:{}", settings.port);
    let listener = tokio::net::TcpListener::bind(&host)
        .await
        .unwrap_or_else(|e| panic!("bind {} failed, error:{}", host, e.to_string()));

    tracing::info!(
        "listening on {} | upload_dir:{} | database:{}",
        host,
        settings.upload_dir.display(),
        settings.database_url
    );

    axum::serve(listener, routes::root::routes(&services, &settings))
        .await
        .unwrap_or_else(|e| panic!("Server error: {}", e.to_string()));
}
