use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Error, Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

use crate::config::parameter::ServerSettings;

pub struct Database {
    pool: Pool<Sqlite>,
}

#[async_trait]
pub trait DatabaseTrait {
    async fn init(settings: &ServerSettings) -> Result<Self, Error>
    where
        Self: Sized;
    fn get_pool(&self) -> &Pool<Sqlite>;
}

#[async_trait]
impl DatabaseTrait for Database {
    async fn init(settings: &ServerSettings) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(&settings.database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(settings.db_max_connections)
            .max_lifetime(Duration::from_secs(6 * 60 * 60))
            .connect_with(options)
            .await?;
        Self::migrate(pool).await
    }

    fn get_pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

impl Database {
    async fn migrate(pool: Pool<Sqlite>) -> Result<Self, Error> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|err| Error::Migrate(Box::new(err)))?;
        Ok(Self { pool })
    }

    /// 测试用内存库；单连接且不回收，否则库会丢失
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("memory url");
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .expect("open in-memory db");
        Self::migrate(pool).await.expect("migrate in-memory db")
    }
}
