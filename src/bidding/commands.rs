/// 입찰 관련 커맨드 처리
/// 입찰 허용 순서: 인증 -> 경매 존재 -> 판매자 본인 여부 -> 금액 -> 마감 시간 -> 기록
/// 경매 행을 잠근 트랜잭션 안에서 최고가 조회, 비교, 기록이 함께 일어난다.
// region:    --- Imports
use super::model::{BidStats, PlacedBid};
use crate::auction::model::AuctionFacts;
use crate::auth::Caller;
use crate::database::DatabaseManager;
use crate::error::{self, Error, Result};
use crate::query::queries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub amount: i64,
}

/// 입찰
pub async fn handle_place_bid(
    db_manager: &DatabaseManager,
    caller: Caller,
    auction_id: i64,
    cmd: PlaceBidCommand,
) -> Result<PlacedBid> {
    info!(
        "{:<12} --> 입찰 요청 처리 시작: auction={} {:?}",
        "Command", auction_id, cmd
    );
    let bidder_id = caller.require_user()?;
    let amount = cmd.amount;

    let result = db_manager
        .locked_transaction(|tx| {
            Box::pin(async move {
                let facts = sqlx::query_as::<_, AuctionFacts>(queries::LOCK_AUCTION)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                let stats = match facts {
                    Some(_) => {
                        sqlx::query_as::<_, BidStats>(queries::GET_BID_STATS)
                            .bind(auction_id)
                            .fetch_one(&mut **tx)
                            .await?
                    }
                    None => BidStats::default(),
                };

                let now = Utc::now();
                admit_bid(bidder_id, auction_id, facts.as_ref(), &stats, amount, now)?;

                let bid_id = sqlx::query_scalar::<_, i64>(queries::INSERT_BID)
                    .bind(auction_id)
                    .bind(bidder_id)
                    .bind(amount)
                    .bind(now)
                    .fetch_one(&mut **tx)
                    .await?;

                Ok::<_, Error>(PlacedBid {
                    bid_id,
                    auction_id,
                    amount,
                    timestamp: now,
                })
            })
        })
        .await;

    match &result {
        Ok(bid) => info!(
            "{:<12} --> 입찰 성공: auction={} bid={} amount={}",
            "Command", auction_id, bid.bid_id, bid.amount
        ),
        Err(e) => warn!(
            "{:<12} --> 입찰 거절: auction={} code={} {}",
            "Command",
            auction_id,
            e.code(),
            e
        ),
    }
    result
}

// endregion: --- Commands

// region:    --- Admission
/// 입찰 허용 판단. 먼저 실패한 단계의 사유를 돌려준다.
///
/// 첫 입찰은 최저 낙찰가(reserve) 이상이어야 하고,
/// 이후 입찰은 현재 최고가보다 엄격히 커야 한다.
pub fn admit_bid(
    bidder_id: i64,
    auction_id: i64,
    auction: Option<&AuctionFacts>,
    stats: &BidStats,
    amount: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    let auction =
        auction.ok_or_else(|| Error::NotFound(format!("경매 {auction_id} 을(를) 찾을 수 없습니다.")))?;

    if auction.seller_id == bidder_id {
        return Err(Error::forbidden(
            error::SELF_BID,
            "자신의 경매에는 입찰할 수 없습니다.",
        ));
    }

    match stats.highest_bid {
        Some(highest) if amount <= highest => {
            return Err(Error::invalid(
                error::LOW_BID,
                format!("입찰 금액은 현재 최고가 {highest} 보다 높아야 합니다."),
            ));
        }
        None if amount < auction.reserve.max(1) => {
            return Err(Error::invalid(
                error::LOW_BID,
                format!(
                    "첫 입찰 금액은 최저 낙찰가 {} 이상이어야 합니다.",
                    auction.reserve.max(1)
                ),
            ));
        }
        _ => {}
    }

    if auction.is_finished(now) {
        return Err(Error::forbidden(
            error::ALREADY_ENDED,
            "경매가 이미 종료되었습니다.",
        ));
    }

    Ok(())
}

// endregion: --- Admission

// endregion: --- Tests
