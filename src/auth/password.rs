//! Argon2id 비밀번호 해시
//!
//! 해시 계산은 CPU 를 오래 쓰므로 `spawn_blocking` 에서 실행한다.

use crate::error::{Error, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tokio::task;

/// 호출마다 새 salt 로 해시한다.
pub async fn hash(plaintext: &str) -> Result<String> {
    let plaintext = plaintext.to_string();
    task::spawn_blocking(move || hash_blocking(&plaintext))
        .await
        .map_err(|e| Error::Internal(format!("비밀번호 해시 작업 실패: {e}")))?
}

pub async fn verify(plaintext: &str, stored_hash: &str) -> Result<bool> {
    let plaintext = plaintext.to_string();
    let stored_hash = stored_hash.to_string();
    task::spawn_blocking(move || verify_blocking(&plaintext, &stored_hash))
        .await
        .map_err(|e| Error::Internal(format!("비밀번호 검증 작업 실패: {e}")))?
}

fn hash_blocking(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("비밀번호 해시 실패: {e}")))
}

fn verify_blocking(plaintext: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| Error::Internal(format!("저장된 해시 형식 오류: {e}")))?;
    Ok(Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok())
}
