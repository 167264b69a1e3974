/// 사용자 관련 커맨드 처리
/// 1. 회원 가입
/// 2. 사용자 정보 수정
// region:    --- Imports
use super::model::{UserPatch, UserRow};
use crate::auth::{password, Caller};
use crate::database::DatabaseManager;
use crate::error::{self, Error, Result};
use crate::query::queries;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::info;

// endregion: --- Imports

// region:    --- Commands
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

const NOT_SELF: &str = "NOT_SELF";

/// 회원 가입 명령
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCommand {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// 1. 회원 가입
pub async fn handle_register(db_manager: &DatabaseManager, cmd: RegisterCommand) -> Result<i64> {
    info!(
        "{:<12} --> 회원 가입 요청: {} {}",
        "Command", cmd.first_name, cmd.last_name
    );
    let first_name = non_blank("firstName", &cmd.first_name)?;
    let last_name = non_blank("lastName", &cmd.last_name)?;
    let email = validate_email(&cmd.email)?;
    validate_password(&cmd.password)?;

    let password_hash = password::hash(&cmd.password).await?;

    let user_id = sqlx::query_scalar::<_, i64>(queries::INSERT_USER)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db_manager.pool())
        .await
        .map_err(email_conflict)?;

    info!("{:<12} --> 회원 가입 성공 id: {}", "Command", user_id);
    Ok(user_id)
}

/// 2. 사용자 정보 수정 (본인만)
pub async fn handle_update_user(
    db_manager: &DatabaseManager,
    caller: Caller,
    user_id: i64,
    patch: UserPatch,
) -> Result<()> {
    info!("{:<12} --> 사용자 정보 수정 요청 id: {}", "Command", user_id);
    let caller_id = caller.require_user()?;

    let target = sqlx::query_as::<_, UserRow>(queries::GET_USER)
        .bind(user_id)
        .fetch_optional(db_manager.pool())
        .await?;
    if target.is_none() {
        return Err(Error::NotFound(format!("사용자 {user_id} 을(를) 찾을 수 없습니다.")));
    }
    if caller_id != user_id {
        return Err(Error::forbidden(
            NOT_SELF,
            "본인의 정보만 수정할 수 있습니다.",
        ));
    }

    if patch.is_empty() {
        return Err(Error::invalid(error::EMPTY_PATCH, "수정할 필드가 없습니다."));
    }
    let mut patch = patch;
    if let Some(first_name) = &patch.first_name {
        patch.first_name = Some(non_blank("firstName", first_name)?);
    }
    if let Some(last_name) = &patch.last_name {
        patch.last_name = Some(non_blank("lastName", last_name)?);
    }
    if let Some(email) = &patch.email {
        patch.email = Some(validate_email(email)?);
    }

    let password_hash = match &patch.password {
        Some(new_password) => {
            validate_password(new_password)?;
            let current = patch.current_password.as_deref().ok_or_else(|| {
                Error::invalid(
                    error::INVALID_FIELD,
                    "비밀번호를 바꾸려면 currentPassword 가 필요합니다.",
                )
            })?;
            let stored = sqlx::query_scalar::<_, String>(queries::GET_PASSWORD_HASH)
                .bind(user_id)
                .fetch_one(db_manager.pool())
                .await?;
            if !password::verify(current, &stored).await? {
                return Err(Error::invalid(
                    error::INVALID_FIELD,
                    "현재 비밀번호가 올바르지 않습니다.",
                ));
            }
            Some(password::hash(new_password).await?)
        }
        None => None,
    };

    if let Some(update) = patch.to_update(user_id, password_hash) {
        update
            .query()
            .execute(db_manager.pool())
            .await
            .map_err(email_conflict)?;
    }

    info!("{:<12} --> 사용자 정보 수정 성공 id: {}", "Command", user_id);
    Ok(())
}

// endregion: --- Commands

// region:    --- Validation
pub fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    if EMAIL_PATTERN.is_match(email) {
        Ok(email.to_string())
    } else {
        Err(Error::invalid(
            error::INVALID_FIELD,
            "이메일 형식이 올바르지 않습니다.",
        ))
    }
}

fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::invalid(
            error::INVALID_FIELD,
            "비밀번호는 비어 있을 수 없습니다.",
        ));
    }
    Ok(())
}

fn non_blank(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid(
            error::INVALID_FIELD,
            format!("{field} 는 비어 있을 수 없습니다."),
        ));
    }
    Ok(trimmed.to_string())
}

/// 이메일 중복은 입력 오류로 본다.
fn email_conflict(err: sqlx::Error) -> Error {
    let is_unique_violation = err
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == error::UNIQUE_VIOLATION);
    if is_unique_violation {
        Error::invalid(error::EMAIL_IN_USE, "이미 사용 중인 이메일입니다.")
    } else {
        Error::from(err)
    }
}

// endregion: --- Validation

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        for ok in ["a@b.co", "  first.last+tag@example.org ", "x@sub.domain.nz"] {
            assert!(validate_email(ok).is_ok(), "{ok}");
        }
        for bad in ["", "plain", "a@b", "@b.com", "a b@c.com", "a@@b.com"] {
            assert!(validate_email(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn email_is_trimmed() {
        assert_eq!(validate_email(" a@b.co ").unwrap(), "a@b.co");
    }

    #[test]
    fn blank_names_and_empty_passwords_are_rejected() {
        assert!(non_blank("firstName", "  ").is_err());
        assert!(validate_password("").is_err());
        assert!(validate_password("x").is_ok());
    }
}
// endregion: --- Tests
