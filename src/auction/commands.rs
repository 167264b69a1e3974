/// 경매 관련 커맨드 처리
/// 1. 경매 등록
/// 2. 경매 수정 (부분 수정)
/// 3. 경매 삭제
/// 수정/삭제는 경매 행을 잠근 뒤 인증 -> 존재 -> 소유자 -> 입찰 없음 -> 필드 검증 순으로 확인한다.
// region:    --- Imports
use super::model::{AuctionFacts, AuctionPatch};
use crate::auth::Caller;
use crate::bidding::model::BidStats;
use crate::database::DatabaseManager;
use crate::error::{self, Error, Result};
use crate::query::queries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands
const DEFAULT_RESERVE: i64 = 1;

/// 경매 등록 명령
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuctionCommand {
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub end_date: DateTime<Utc>,
    pub reserve: Option<i64>,
}

/// 1. 경매 등록
pub async fn handle_create_auction(
    db_manager: &DatabaseManager,
    caller: Caller,
    cmd: CreateAuctionCommand,
) -> Result<i64> {
    info!("{:<12} --> 경매 등록 요청: {}", "Command", cmd.title);
    let seller_id = caller.require_user()?;

    let title = validate_create(&cmd, Utc::now())?;
    let reserve = cmd.reserve.unwrap_or(DEFAULT_RESERVE);

    let description = cmd.description;
    let category_id = cmd.category_id;
    let end_date = cmd.end_date;

    let auction_id = db_manager
        .transaction(|tx| {
            Box::pin(async move {
                ensure_category(tx, category_id).await?;
                let id = sqlx::query_scalar::<_, i64>(queries::INSERT_AUCTION)
                    .bind(title)
                    .bind(description)
                    .bind(end_date)
                    .bind(reserve)
                    .bind(seller_id)
                    .bind(category_id)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok::<_, Error>(id)
            })
        })
        .await?;

    info!("{:<12} --> 경매 등록 성공 id: {}", "Command", auction_id);
    Ok(auction_id)
}

/// 2. 경매 수정
pub async fn handle_edit_auction(
    db_manager: &DatabaseManager,
    caller: Caller,
    auction_id: i64,
    patch: AuctionPatch,
) -> Result<()> {
    info!(
        "{:<12} --> 경매 수정 요청 id: {} {:?}",
        "Command", auction_id, patch
    );
    let caller_id = caller.require_user()?;

    let result = db_manager
        .locked_transaction(|tx| {
            Box::pin(async move {
                lock_for_mutation(tx, caller_id, auction_id).await?;

                validate_patch(&patch, Utc::now())?;
                if let Some(category_id) = patch.category_id {
                    ensure_category(tx, category_id).await?;
                }

                let update = patch
                    .to_update(auction_id)
                    .ok_or_else(empty_patch)?;
                update.query().execute(&mut **tx).await?;
                Ok::<_, Error>(())
            })
        })
        .await;

    log_outcome("수정", auction_id, &result);
    result
}

/// 3. 경매 삭제
pub async fn handle_delete_auction(
    db_manager: &DatabaseManager,
    caller: Caller,
    auction_id: i64,
) -> Result<()> {
    info!("{:<12} --> 경매 삭제 요청 id: {}", "Command", auction_id);
    let caller_id = caller.require_user()?;

    let result = db_manager
        .locked_transaction(|tx| {
            Box::pin(async move {
                lock_for_mutation(tx, caller_id, auction_id).await?;
                sqlx::query(queries::DELETE_AUCTION)
                    .bind(auction_id)
                    .execute(&mut **tx)
                    .await?;
                Ok::<_, Error>(())
            })
        })
        .await;

    log_outcome("삭제", auction_id, &result);
    result
}

/// 경매 행을 잠그고 수정 가능 여부를 확인한다.
async fn lock_for_mutation(
    tx: &mut Transaction<'_, Postgres>,
    caller_id: i64,
    auction_id: i64,
) -> Result<AuctionFacts> {
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

    guard_mutation(caller_id, auction_id, facts, &stats)
}

async fn ensure_category(tx: &mut Transaction<'_, Postgres>, category_id: i64) -> Result<()> {
    let exists = sqlx::query_scalar::<_, bool>(queries::CATEGORY_EXISTS)
        .bind(category_id)
        .fetch_one(&mut **tx)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(Error::invalid(
            error::INVALID_CATEGORY,
            format!("카테고리 {category_id} 가 존재하지 않습니다."),
        ))
    }
}

fn log_outcome(action: &str, auction_id: i64, result: &Result<()>) {
    match result {
        Ok(()) => info!("{:<12} --> 경매 {} 성공 id: {}", "Command", action, auction_id),
        Err(e) => warn!(
            "{:<12} --> 경매 {} 거절 id: {} code={} {}",
            "Command",
            action,
            auction_id,
            e.code(),
            e
        ),
    }
}

// endregion: --- Commands

// region:    --- Guard
/// 존재, 소유자, 입찰 없음 순으로 확인한다.
pub fn guard_mutation(
    caller_id: i64,
    auction_id: i64,
    auction: Option<AuctionFacts>,
    stats: &BidStats,
) -> Result<AuctionFacts> {
    let auction =
        auction.ok_or_else(|| Error::NotFound(format!("경매 {auction_id} 을(를) 찾을 수 없습니다.")))?;

    if auction.seller_id != caller_id {
        return Err(Error::forbidden(
            error::NOT_OWNER,
            "경매 판매자만 수정하거나 삭제할 수 있습니다.",
        ));
    }

    if stats.num_bids > 0 {
        return Err(Error::forbidden(
            error::AUCTION_FROZEN,
            "입찰이 있는 경매는 수정하거나 삭제할 수 없습니다.",
        ));
    }

    Ok(auction)
}

/// 등록 요청 필드 검증. 공백을 제거한 제목을 돌려준다.
pub fn validate_create(cmd: &CreateAuctionCommand, now: DateTime<Utc>) -> Result<String> {
    let title = non_blank("title", &cmd.title)?;
    non_blank("description", &cmd.description)?;
    validate_reserve(cmd.reserve.unwrap_or(DEFAULT_RESERVE))?;
    validate_end_date(cmd.end_date, now)?;
    Ok(title)
}

/// 카테고리 존재 여부를 제외한 필드 검증
pub fn validate_patch(patch: &AuctionPatch, now: DateTime<Utc>) -> Result<()> {
    if patch.is_empty() {
        return Err(empty_patch());
    }
    if let Some(title) = &patch.title {
        non_blank("title", title)?;
    }
    if let Some(description) = &patch.description {
        non_blank("description", description)?;
    }
    if let Some(end_date) = patch.end_date {
        validate_end_date(end_date, now)?;
    }
    if let Some(reserve) = patch.reserve {
        validate_reserve(reserve)?;
    }
    Ok(())
}

fn validate_end_date(end_date: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if end_date <= now {
        return Err(Error::invalid(
            error::INVALID_END_DATE,
            "종료 시간은 현재 이후여야 합니다.",
        ));
    }
    Ok(())
}

fn validate_reserve(reserve: i64) -> Result<()> {
    if reserve < 0 {
        return Err(Error::invalid(
            error::INVALID_FIELD,
            "reserve 는 0 이상이어야 합니다.",
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

fn empty_patch() -> Error {
    Error::invalid(error::EMPTY_PATCH, "수정할 필드가 없습니다.")
}

// endregion: --- Guard

// endregion: --- Tests
