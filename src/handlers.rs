// region:    --- Imports
use crate::auction::commands::{
    handle_create_auction, handle_delete_auction, handle_edit_auction, CreateAuctionCommand,
};
use crate::auction::model::AuctionPatch;
use crate::auth::{self, Caller, LoginCommand};
use crate::bidding::commands::{handle_place_bid, PlaceBidCommand};
use crate::database::DatabaseManager;
use crate::error::{self, Error, Result};
use crate::query::builder::ListingParams;
use crate::query::handlers as query;
use crate::user::commands::{handle_register, handle_update_user, RegisterCommand};
use crate::user::model::UserPatch;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

// endregion: --- Imports

// region:    --- Router
pub const ROOT_URL: &str = "/api/v1";

type AppState = Arc<DatabaseManager>;

// 추출 거절은 Error 로 변환된다.
type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;
type IdPath = std::result::Result<Path<i64>, PathRejection>;

pub fn router(db_manager: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/auctions", get(handle_list_auctions).post(handle_create))
        .route("/auctions/categories", get(handle_get_categories))
        .route(
            "/auctions/:id",
            get(handle_get_auction)
                .patch(handle_edit)
                .delete(handle_delete),
        )
        .route("/auctions/:id/bids", get(handle_get_bids).post(handle_bid))
        .route("/users/register", post(handle_register_user))
        .route("/users/login", post(handle_login))
        .route("/users/logout", post(handle_logout))
        .route("/users/:id", get(handle_get_user).patch(handle_patch_user));

    Router::new()
        .nest(ROOT_URL, api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(db_manager)
}

// endregion: --- Router

// region:    --- Command Handlers

/// 경매 등록
async fn handle_create(
    State(db_manager): State<AppState>,
    caller: Caller,
    body: JsonBody<CreateAuctionCommand>,
) -> Result<impl IntoResponse> {
    let Json(cmd) = body?;
    let auction_id = handle_create_auction(&db_manager, caller, cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "auctionId": auction_id })),
    ))
}

/// 경매 수정
async fn handle_edit(
    State(db_manager): State<AppState>,
    caller: Caller,
    path: IdPath,
    body: JsonBody<AuctionPatch>,
) -> Result<impl IntoResponse> {
    let Path(auction_id) = path?;
    let Json(patch) = body?;
    handle_edit_auction(&db_manager, caller, auction_id, patch).await?;
    Ok(StatusCode::OK)
}

/// 경매 삭제
async fn handle_delete(
    State(db_manager): State<AppState>,
    caller: Caller,
    path: IdPath,
) -> Result<impl IntoResponse> {
    let Path(auction_id) = path?;
    handle_delete_auction(&db_manager, caller, auction_id).await?;
    Ok(StatusCode::OK)
}

/// 입찰
async fn handle_bid(
    State(db_manager): State<AppState>,
    caller: Caller,
    path: IdPath,
    body: JsonBody<PlaceBidCommand>,
) -> Result<impl IntoResponse> {
    let Path(auction_id) = path?;
    let Json(cmd) = body?;
    let bid = handle_place_bid(&db_manager, caller, auction_id, cmd).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

/// 회원 가입
async fn handle_register_user(
    State(db_manager): State<AppState>,
    body: JsonBody<RegisterCommand>,
) -> Result<impl IntoResponse> {
    let Json(cmd) = body?;
    let user_id = handle_register(&db_manager, cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "userId": user_id })),
    ))
}

/// 로그인
async fn handle_login(
    State(db_manager): State<AppState>,
    body: JsonBody<LoginCommand>,
) -> Result<impl IntoResponse> {
    let Json(cmd) = body?;
    let session = auth::login(&db_manager, cmd).await?;
    Ok(Json(session))
}

/// 로그아웃
async fn handle_logout(
    State(db_manager): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse> {
    auth::logout(&db_manager, caller).await?;
    Ok(StatusCode::OK)
}

/// 사용자 정보 수정
async fn handle_patch_user(
    State(db_manager): State<AppState>,
    caller: Caller,
    path: IdPath,
    body: JsonBody<UserPatch>,
) -> Result<impl IntoResponse> {
    let Path(user_id) = path?;
    let Json(patch) = body?;
    handle_update_user(&db_manager, caller, user_id, patch).await?;
    Ok(StatusCode::OK)
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 경매 목록 조회
async fn handle_list_auctions(
    State(db_manager): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse> {
    let params = parse_listing_params(raw.as_deref().unwrap_or(""))?;
    info!("{:<12} --> 경매 목록 조회 {:?}", "HandlerQuery", params);
    Ok(Json(query::list_auctions(&db_manager, &params).await?))
}

/// 경매 조회
async fn handle_get_auction(
    State(db_manager): State<AppState>,
    path: IdPath,
) -> Result<impl IntoResponse> {
    let Path(auction_id) = path?;
    Ok(Json(query::get_auction(&db_manager, auction_id).await?))
}

/// 입찰 이력 조회
async fn handle_get_bids(
    State(db_manager): State<AppState>,
    path: IdPath,
) -> Result<impl IntoResponse> {
    let Path(auction_id) = path?;
    Ok(Json(query::get_bid_history(&db_manager, auction_id).await?))
}

/// 카테고리 조회
async fn handle_get_categories(State(db_manager): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(query::get_categories(&db_manager).await?))
}

/// 사용자 조회
async fn handle_get_user(
    State(db_manager): State<AppState>,
    caller: Caller,
    path: IdPath,
) -> Result<impl IntoResponse> {
    let Path(user_id) = path?;
    Ok(Json(query::get_user(&db_manager, caller, user_id).await?))
}

// endregion: --- Query Handlers

// region:    --- Query String
/// `categoryIds` 는 반복 키(`categoryIds=1&categoryIds=2`)와 콤마 목록을 모두 받는다.
pub fn parse_listing_params(raw: &str) -> Result<ListingParams> {
    let mut params = ListingParams::default();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        match key.as_ref() {
            "q" => params.q = Some(value.into_owned()),
            "categoryIds" => {
                for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    params.category_ids.push(parse_field("categoryIds", part)?);
                }
            }
            "sellerId" => params.seller_id = Some(parse_field("sellerId", &value)?),
            "bidderId" => params.bidder_id = Some(parse_field("bidderId", &value)?),
            "sortBy" => params.sort_by = Some(value.into_owned()),
            "startIndex" => params.start_index = Some(parse_field("startIndex", &value)?),
            "count" => params.count = Some(parse_field("count", &value)?),
            _ => {}
        }
    }
    Ok(params)
}

fn parse_field<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        Error::invalid(
            error::INVALID_FIELD,
            format!("{name} 값이 올바르지 않습니다: {value}"),
        )
    })
}

// endregion: --- Query String

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_listing_parameter() {
        let params = parse_listing_params(
            "q=red%20bike&categoryIds=1&categoryIds=2,3&sellerId=4&bidderId=5&sortBy=BIDS_DESC&startIndex=2&count=10",
        )
        .unwrap();
        assert_eq!(
            params,
            ListingParams {
                q: Some("red bike".into()),
                category_ids: vec![1, 2, 3],
                seller_id: Some(4),
                bidder_id: Some(5),
                sort_by: Some("BIDS_DESC".into()),
                start_index: Some(2),
                count: Some(10),
            }
        );
    }

    #[test]
    fn empty_query_string_means_no_constraints() {
        assert_eq!(parse_listing_params("").unwrap(), ListingParams::default());
    }

    #[test]
    fn unknown_sort_is_kept_for_lenient_fallback() {
        let params = parse_listing_params("sortBy=NEWEST").unwrap();
        assert_eq!(params.sort_by.as_deref(), Some("NEWEST"));
    }

    #[test]
    fn malformed_numbers_are_invalid_input() {
        for raw in ["sellerId=abc", "startIndex=-1", "count=x", "categoryIds=1,two"] {
            let err = parse_listing_params(raw).unwrap_err();
            assert_eq!(err.code(), error::INVALID_FIELD, "{raw}");
        }
    }
}
// endregion: --- Tests
