// region:    --- Imports
use super::builder::{paginate, ListingParams, ListingQuery};
use super::queries;
use crate::auction::model::{AuctionDetail, AuctionListing, AuctionSummary, Category};
use crate::auth::Caller;
use crate::bidding::model::Bid;
use crate::database::DatabaseManager;
use crate::error::{Error, Result};
use crate::user::model::{UserRow, UserView};
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 경매 목록 조회
/// 필터/정렬을 적용한 전체 결과를 받은 뒤 메모리에서 페이지를 자른다.
pub async fn list_auctions(
    db_manager: &DatabaseManager,
    params: &ListingParams,
) -> Result<AuctionListing> {
    info!("{:<12} --> 경매 목록 조회: {:?}", "Query", params);
    let built = ListingQuery::from_params(params).build();

    let rows = db_manager
        .transaction(|tx| {
            Box::pin(async move {
                built
                    .query_as::<AuctionSummary>()
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await?;

    let count = rows.len();
    Ok(AuctionListing {
        auctions: paginate(rows, params.start_index, params.count),
        count,
    })
}

/// 경매 조회
pub async fn get_auction(db_manager: &DatabaseManager, auction_id: i64) -> Result<AuctionDetail> {
    info!("{:<12} --> 경매 조회 id: {}", "Query", auction_id);
    sqlx::query_as::<_, AuctionDetail>(queries::GET_AUCTION)
        .bind(auction_id)
        .fetch_optional(db_manager.pool())
        .await?
        .ok_or_else(|| auction_not_found(auction_id))
}

/// 입찰 이력 조회
pub async fn get_bid_history(db_manager: &DatabaseManager, auction_id: i64) -> Result<Vec<Bid>> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let exists = sqlx::query_scalar::<_, bool>(queries::AUCTION_EXISTS)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await?;
                if !exists {
                    return Err(auction_not_found(auction_id));
                }

                let bids = sqlx::query_as::<_, Bid>(queries::GET_BID_HISTORY)
                    .bind(auction_id)
                    .fetch_all(&mut **tx)
                    .await?;
                Ok(bids)
            })
        })
        .await
}

/// 모든 카테고리 조회
pub async fn get_categories(db_manager: &DatabaseManager) -> Result<Vec<Category>> {
    info!("{:<12} --> 카테고리 조회", "Query");
    let categories = sqlx::query_as::<_, Category>(queries::GET_CATEGORIES)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(categories)
}

/// 사용자 조회
pub async fn get_user(db_manager: &DatabaseManager, viewer: Caller, user_id: i64) -> Result<UserView> {
    info!("{:<12} --> 사용자 조회 id: {}", "Query", user_id);
    let row = sqlx::query_as::<_, UserRow>(queries::GET_USER)
        .bind(user_id)
        .fetch_optional(db_manager.pool())
        .await?
        .ok_or_else(|| Error::NotFound(format!("사용자 {user_id} 을(를) 찾을 수 없습니다.")))?;
    Ok(UserView::for_viewer(row, viewer.user_id()))
}

fn auction_not_found(auction_id: i64) -> Error {
    Error::NotFound(format!("경매 {auction_id} 을(를) 찾을 수 없습니다."))
}

// endregion: --- Query Handlers
