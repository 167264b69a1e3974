/// 인증
/// 1. 로그인 (비밀번호 검증 후 토큰 발급)
/// 2. 로그아웃 (토큰 삭제)
/// 3. 토큰으로 호출자 식별
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::error::{Error, Result};
use crate::query::queries;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub mod password;
pub mod token;

// endregion: --- Imports

// region:    --- Caller
/// 인증 토큰 헤더
pub const AUTH_HEADER: &str = "X-Authorization";

/// 요청 호출자. 토큰이 없거나 알 수 없으면 `Anonymous` 이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User(i64),
}

impl Caller {
    pub fn user_id(self) -> Option<i64> {
        match self {
            Caller::User(id) => Some(id),
            Caller::Anonymous => None,
        }
    }

    /// 익명 호출자는 거부한다.
    pub fn require_user(self) -> Result<i64> {
        self.user_id()
            .ok_or_else(|| Error::Unauthenticated("로그인이 필요합니다.".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<Arc<DatabaseManager>> for Caller {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        db_manager: &Arc<DatabaseManager>,
    ) -> Result<Self> {
        let token = parts
            .headers
            .get(AUTH_HEADER)
            .and_then(|value| value.to_str().ok());
        authorize(db_manager, token).await
    }
}

// endregion: --- Caller

// region:    --- Commands
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: i64,
    pub token: String,
}

#[derive(sqlx::FromRow)]
struct Credentials {
    id: i64,
    password: String,
}

/// 토큰을 호출자로 변환한다. 실패 대신 `Anonymous` 를 돌려준다.
pub async fn authorize(db_manager: &DatabaseManager, token: Option<&str>) -> Result<Caller> {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(Caller::Anonymous);
    };

    let user_id = sqlx::query_scalar::<_, i64>(queries::GET_USER_ID_BY_TOKEN)
        .bind(token)
        .fetch_optional(db_manager.pool())
        .await?;

    debug!("{:<12} --> 토큰 확인 결과: {:?}", "Auth", user_id);
    Ok(user_id.map_or(Caller::Anonymous, Caller::User))
}

/// 로그인. 성공 시 새 토큰이 이전 토큰을 대체한다.
pub async fn login(db_manager: &DatabaseManager, cmd: LoginCommand) -> Result<Session> {
    info!("{:<12} --> 로그인 시도: {}", "Auth", cmd.email);
    let invalid = || Error::Unauthenticated("이메일 또는 비밀번호가 올바르지 않습니다.".to_string());

    let credentials = sqlx::query_as::<_, Credentials>(queries::GET_CREDENTIALS_BY_EMAIL)
        .bind(cmd.email.trim())
        .fetch_optional(db_manager.pool())
        .await?
        .ok_or_else(invalid)?;

    if !password::verify(&cmd.password, &credentials.password).await? {
        return Err(invalid());
    }

    let token = token::issue();
    sqlx::query(queries::SET_AUTH_TOKEN)
        .bind(&token)
        .bind(credentials.id)
        .execute(db_manager.pool())
        .await?;

    info!("{:<12} --> 로그인 성공 user: {}", "Auth", credentials.id);
    Ok(Session {
        user_id: credentials.id,
        token,
    })
}

/// 로그아웃. 이후 같은 토큰은 익명으로 취급된다.
pub async fn logout(db_manager: &DatabaseManager, caller: Caller) -> Result<()> {
    let user_id = caller.require_user()?;
    sqlx::query(queries::CLEAR_AUTH_TOKEN)
        .bind(user_id)
        .execute(db_manager.pool())
        .await?;
    info!("{:<12} --> 로그아웃 user: {}", "Auth", user_id);
    Ok(())
}

// endregion: --- Commands
