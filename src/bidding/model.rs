use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 입찰 이력 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub bid_id: i64,
    pub bidder_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}

// 경매별 입찰 집계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct BidStats {
    pub num_bids: i64,
    pub highest_bid: Option<i64>,
}

// 입찰 성공 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedBid {
    pub bid_id: i64,
    pub auction_id: i64,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}
