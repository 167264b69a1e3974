/// 환경 변수 기반 설정
// region:    --- Imports
use std::time::Duration;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Config
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} 값이 올바르지 않습니다: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    /// 경매 행 잠금 대기 한도
    pub lock_timeout: Duration,
    /// 부팅 시 스키마를 지우고 다시 만든다
    pub reset_database: bool,
}

impl Config {
    /// `.env` 를 읽은 뒤 프로세스 환경에서 설정을 만든다.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        // 0ms 는 Postgres 에서 무제한 대기를 뜻한다.
        let lock_timeout_ms = parse_or(&lookup, "DATABASE_LOCK_TIMEOUT_MS", DEFAULT_LOCK_TIMEOUT_MS)?;
        if lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "DATABASE_LOCK_TIMEOUT_MS",
                value: "0".to_string(),
            });
        }
        let reset_database = parse_or(&lookup, "DATABASE_RESET", false)?;

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            reset_database,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

// endregion: --- Config

// endregion: --- Tests
