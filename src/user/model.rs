use crate::query::builder::{BuiltQuery, UpdateBuilder};
use serde::{Deserialize, Serialize};

// 사용자 행 (비밀번호 제외)
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

// 사용자 조회 응답. 이메일은 본인에게만 보인다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserView {
    pub fn for_viewer(row: UserRow, viewer_id: Option<i64>) -> Self {
        let is_self = viewer_id == Some(row.id);
        Self {
            first_name: row.first_name,
            last_name: row.last_name,
            email: is_self.then_some(row.email),
        }
    }
}

/// 사용자 정보 부분 수정 요청
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub current_password: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.password.is_none()
    }

    /// 비밀번호는 해시된 값으로만 저장된다.
    pub fn to_update(&self, user_id: i64, password_hash: Option<String>) -> Option<BuiltQuery> {
        UpdateBuilder::new("users")
            .set("first_name", self.first_name.clone())
            .set("last_name", self.last_name.clone())
            .set("email", self.email.clone())
            .set("password", password_hash)
            .build_for_id(user_id)
    }
}
