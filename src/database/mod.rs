use crate::config::Config;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

// 스키마 부트스트랩 직렬화용 advisory lock 키
const SCHEMA_LOCK_KEY: i64 = 0x6175_6374_696f_6e;

pub struct DatabaseManager {
    pub pool: Arc<PgPool>,
    lock_timeout: Duration,
}

impl DatabaseManager {
    /// 데이터베이스 매니저 생성
    pub async fn new(config: &Config) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(Self::from_pool(pool, config.lock_timeout))
    }

    pub fn from_pool(pool: PgPool, lock_timeout: Duration) -> Self {
        Self {
            pool: Arc::new(pool),
            lock_timeout,
        }
    }

    /// 데이터베이스 풀 가져오기
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 트랜잭션 실행
    pub async fn transaction<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut Transaction<'_, Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        self.run_in_transaction(None, f).await
    }

    /// 경매 단위 임계 구역 트랜잭션
    /// 행 잠금 대기 시간을 제한한 뒤 `f` 를 실행한다. 초과 시 55P03 으로 실패한다.
    pub async fn locked_transaction<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut Transaction<'_, Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        self.run_in_transaction(Some(self.lock_timeout), f).await
    }

    async fn run_in_transaction<F, R, E>(&self, lock_timeout: Option<Duration>, f: F) -> Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut Transaction<'_, Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        let mut tx = self.pool.begin().await?;
        if let Some(timeout) = lock_timeout {
            sqlx::query("SELECT set_config('lock_timeout', $1, true)")
                .bind(format!("{}ms", timeout.as_millis()))
                .execute(&mut *tx)
                .await?;
        }
        let result = f(&mut tx).await;
        match result {
            Ok(r) => {
                tx.commit().await?;
                Ok(r)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// 데이터베이스 초기화
    /// 여러 인스턴스가 동시에 부팅해도 스키마 생성이 겹치지 않도록 advisory lock 을 잡는다.
    pub async fn initialize_database(&self, reset: bool) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SCHEMA_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        if reset {
            info!("{:<12} --> 스키마 재생성", "Database");
            let recreate_db_sql = include_str!("../sql/00-recreate-db.sql");
            Self::execute_multi_query(&mut tx, recreate_db_sql).await?;
        }

        let create_schema_sql = include_str!("../sql/01-create-schema.sql");
        Self::execute_multi_query(&mut tx, create_schema_sql).await?;

        tx.commit().await
    }

    /// 여러 쿼리 실행
    async fn execute_multi_query(
        tx: &mut Transaction<'_, Postgres>,
        sql: &str,
    ) -> Result<(), sqlx::Error> {
        for query in sql.split(';') {
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&mut **tx).await?;
            }
        }
        Ok(())
    }
}
