use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

use dotenv;
use once_cell::sync::OnceCell;

pub static CMD_ARGS: OnceCell<HashSet<String>> = OnceCell::new();

pub fn init() {
    // 没有 .env 文件时使用环境变量和默认值
    dotenv::dotenv().ok();
    // 给日志库设置环境变量
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "debug")
    }
    assert!(CMD_ARGS.set(std::env::args().collect()).is_ok());
}

pub fn get_or(parameter: &str, default: &str) -> String {
    std::env::var(parameter).unwrap_or_else(|_| default.to_string())
}

/// 解析数值参数，格式错误时直接退出
pub fn get_parsed<T: FromStr>(parameter: &str, default: T) -> T {
    match std::env::var(parameter) {
        Ok(value) => value
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("config -- env var `{parameter}` is not valid: {value}")),
        Err(_) => default,
    }
}

/// 启动参数 `--name=value`
pub fn cmd_arg_value(name: &str) -> Option<String> {
    let prefix = format!("--{name}=");
    CMD_ARGS
        .get()?
        .iter()
        .find_map(|arg| arg.strip_prefix(&prefix).map(str::to_string))
}

// 历史记录保留时长：2天（礼物除外）
pub const HISTORY_RETENTION_SECS: i64 = 172_800;

/// 服务运行参数
#[derive(Clone, Debug)]
pub struct ServerSettings {
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub upload_dir: PathBuf,
    pub log_dir: String,
    pub expiry_sweep_cron: String,
    pub media_sweep_cron: String,
    pub retention_sweep_cron: String,
    pub media_max_age_secs: i64,
    pub expiry_grace_secs: i64,
    pub history_retention_secs: i64,
    pub ranking_top_n: i64,
    pub gift_table_count: i64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 5001,
            database_url: "sqlite://display_queue.db?mode=rwc".to_string(),
            db_max_connections: 5,
            upload_dir: PathBuf::from("uploads"),
            log_dir: "log".to_string(),
            expiry_sweep_cron: "*/5 * * * * *".to_string(),
            media_sweep_cron: "0 */10 * * * *".to_string(),
            retention_sweep_cron: "0 0 * * * *".to_string(),
            media_max_age_secs: 86_400,
            expiry_grace_secs: 5,
            history_retention_secs: HISTORY_RETENTION_SECS,
            ranking_top_n: 3,
            gift_table_count: 10,
        }
    }
}

impl ServerSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let settings = Self {
            port: get_parsed("PORT", defaults.port),
            database_url: get_or("DATABASE_URL", &defaults.database_url),
            db_max_connections: get_parsed("DB_MAX_CONNECTIONS", defaults.db_max_connections),
            upload_dir: PathBuf::from(get_or("UPLOAD_DIR", "uploads")),
            log_dir: get_or("LOG_DIR", &defaults.log_dir),
            expiry_sweep_cron: get_or("EXPIRY_SWEEP_CRON", &defaults.expiry_sweep_cron),
            media_sweep_cron: get_or("MEDIA_SWEEP_CRON", &defaults.media_sweep_cron),
            retention_sweep_cron: get_or("RETENTION_SWEEP_CRON", &defaults.retention_sweep_cron),
            media_max_age_secs: get_parsed("MEDIA_MAX_AGE_SECS", defaults.media_max_age_secs),
            expiry_grace_secs: get_parsed("EXPIRY_GRACE_SECS", defaults.expiry_grace_secs),
            history_retention_secs: get_parsed(
                "HISTORY_RETENTION_SECS",
                defaults.history_retention_secs,
            ),
            ranking_top_n: get_parsed("RANKING_TOP_N", defaults.ranking_top_n),
            gift_table_count: get_parsed("GIFT_TABLE_COUNT", defaults.gift_table_count),
        };
        settings.validate_cron_expressions();
        settings
    }

    // 校验计划任务表达式是否正确
    fn validate_cron_expressions(&self) {
        use cron::Schedule;
        for (name, expression) in [
            ("EXPIRY_SWEEP_CRON", &self.expiry_sweep_cron),
            ("MEDIA_SWEEP_CRON", &self.media_sweep_cron),
            ("RETENTION_SWEEP_CRON", &self.retention_sweep_cron),
        ] {
            if Schedule::from_str(expression).is_err() {
                panic!("config -- env var `{name}` is not a valid cron expression: {expression}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cron_expressions_parse() {
        ServerSettings::default().validate_cron_expressions();
    }
}
