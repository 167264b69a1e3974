use crate::query::builder::{BuiltQuery, UpdateBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 경매 목록 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSummary {
    pub auction_id: i64,
    pub title: String,
    pub category_id: i64,
    pub seller_id: i64,
    pub seller_first_name: String,
    pub seller_last_name: String,
    pub reserve: i64,
    pub num_bids: i64,
    pub highest_bid: Option<i64>,
    pub end_date: DateTime<Utc>,
}

// 경매 단건 (설명 포함)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuctionDetail {
    pub auction_id: i64,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub seller_id: i64,
    pub seller_first_name: String,
    pub seller_last_name: String,
    pub reserve: i64,
    pub num_bids: i64,
    pub highest_bid: Option<i64>,
    pub end_date: DateTime<Utc>,
}

impl AuctionDetail {
    pub fn is_finished(&self, now: DateTime<Utc>) -> bool {
        self.end_date <= now
    }
}

// 목록 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionListing {
    pub auctions: Vec<AuctionSummary>,
    /// 페이지 적용 전 조건에 맞는 경매 수
    pub count: usize,
}

// 카테고리
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: i64,
    pub name: String,
}

/// 행 잠금 상태에서 읽은 경매 사실
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AuctionFacts {
    pub id: i64,
    pub seller_id: i64,
    pub reserve: i64,
    pub end_date: DateTime<Utc>,
}

impl AuctionFacts {
    pub fn is_finished(&self, now: DateTime<Utc>) -> bool {
        self.end_date <= now
    }
}

/// 부분 수정 요청. 값이 있는 필드만 변경된다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub end_date: Option<DateTime<Utc>>,
    pub reserve: Option<i64>,
}

impl AuctionPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
            && self.end_date.is_none()
            && self.reserve.is_none()
    }

    /// 지정된 컬럼만 갱신하는 UPDATE 문
    pub fn to_update(&self, auction_id: i64) -> Option<BuiltQuery> {
        UpdateBuilder::new("auctions")
            .set("title", self.title.as_deref().map(|t| t.trim().to_string()))
            .set("description", self.description.clone())
            .set("category_id", self.category_id)
            .set("end_date", self.end_date)
            .set("reserve", self.reserve)
            .build_for_id(auction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::builder::SqlParam;
    use chrono::Duration;

    #[test]
    fn patch_with_only_category_updates_only_category() {
        let patch = AuctionPatch {
            category_id: Some(4),
            ..Default::default()
        };
        let built = patch.to_update(10).unwrap();
        assert_eq!(built.sql, "UPDATE auctions SET category_id = $1 WHERE id = $2");
        assert_eq!(built.params, vec![SqlParam::Int(4), SqlParam::Int(10)]);
    }

    #[test]
    fn patch_title_is_stored_trimmed() {
        let patch = AuctionPatch {
            title: Some("  Lamp ".into()),
            ..Default::default()
        };
        let built = patch.to_update(2).unwrap();
        assert_eq!(built.sql, "UPDATE auctions SET title = $1 WHERE id = $2");
        assert_eq!(
            built.params,
            vec![SqlParam::Text("Lamp".into()), SqlParam::Int(2)]
        );
    }

    #[test]
    fn empty_patch_has_no_statement() {
        let patch = AuctionPatch::default();
        assert!(patch.is_empty());
        assert!(patch.to_update(1).is_none());
    }

    #[test]
    fn patch_deserializes_sparse_camel_case_body() {
        let patch: AuctionPatch =
            serde_json::from_str(r#"{"title":"Lamp","endDate":"2030-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(patch.title.as_deref(), Some("Lamp"));
        assert!(patch.end_date.is_some());
        assert!(patch.description.is_none() && patch.reserve.is_none());
    }

    #[test]
    fn finished_at_or_after_end_date() {
        let end = Utc::now();
        let facts = AuctionFacts {
            id: 1,
            seller_id: 1,
            reserve: 1,
            end_date: end,
        };
        assert!(!facts.is_finished(end - Duration::seconds(1)));
        assert!(facts.is_finished(end));
        assert!(facts.is_finished(end + Duration::seconds(1)));
    }
}
