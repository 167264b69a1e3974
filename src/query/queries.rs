/// 경매 목록 집계 쿼리 (필터/정렬은 빌더가 덧붙인다)
/// 입찰이 없는 경매도 나오도록 bids 는 LEFT JOIN 한다.
pub const LIST_AUCTIONS_BASE: &str = "SELECT a.id AS auction_id, a.title, a.category_id, a.seller_id, \
u.first_name AS seller_first_name, u.last_name AS seller_last_name, a.reserve, \
COUNT(b.id) AS num_bids, MAX(b.amount) AS highest_bid, a.end_date \
FROM auctions a \
JOIN users u ON u.id = a.seller_id \
LEFT JOIN bids b ON b.auction_id = a.id";

/// 경매 단건 조회
pub const GET_AUCTION: &str = r#"
    SELECT a.id AS auction_id, a.title, a.description, a.category_id, a.seller_id,
           u.first_name AS seller_first_name, u.last_name AS seller_last_name, a.reserve,
           COUNT(b.id) AS num_bids, MAX(b.amount) AS highest_bid, a.end_date
    FROM auctions a
    JOIN users u ON u.id = a.seller_id
    LEFT JOIN bids b ON b.auction_id = a.id
    WHERE a.id = $1
    GROUP BY a.id, u.id
"#;

/// 경매 행 잠금 (입찰/수정/삭제 임계 구역 진입)
pub const LOCK_AUCTION: &str =
    "SELECT id, seller_id, reserve, end_date FROM auctions WHERE id = $1 FOR UPDATE";

/// 현재 최고 입찰가와 입찰 수
pub const GET_BID_STATS: &str =
    "SELECT COUNT(id) AS num_bids, MAX(amount) AS highest_bid FROM bids WHERE auction_id = $1";

/// 입찰 기록 추가
pub const INSERT_BID: &str =
    "INSERT INTO bids (auction_id, user_id, amount, \"timestamp\") VALUES ($1, $2, $3, $4) RETURNING id";

/// 입찰 이력 조회 (최신순)
pub const GET_BID_HISTORY: &str = r#"
    SELECT b.id AS bid_id, b.user_id AS bidder_id, u.first_name, u.last_name, b.amount, b."timestamp"
    FROM bids b
    JOIN users u ON u.id = b.user_id
    WHERE b.auction_id = $1
    ORDER BY b."timestamp" DESC, b.id DESC
"#;

/// 경매 존재 여부
pub const AUCTION_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM auctions WHERE id = $1)";

/// 경매 생성
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (title, description, end_date, reserve, seller_id, category_id)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id
"#;

/// 경매 삭제
pub const DELETE_AUCTION: &str = "DELETE FROM auctions WHERE id = $1";

/// 모든 카테고리 조회
pub const GET_CATEGORIES: &str = "SELECT id AS category_id, name FROM categories ORDER BY id";

/// 카테고리 존재 여부
pub const CATEGORY_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)";

/// 사용자 조회
pub const GET_USER: &str = "SELECT id, first_name, last_name, email FROM users WHERE id = $1";

/// 로그인용 사용자 조회
pub const GET_CREDENTIALS_BY_EMAIL: &str = "SELECT id, password FROM users WHERE email = $1";

/// 비밀번호 해시 조회
pub const GET_PASSWORD_HASH: &str = "SELECT password FROM users WHERE id = $1";

/// 사용자 등록
pub const INSERT_USER: &str = r#"
    INSERT INTO users (first_name, last_name, email, password)
    VALUES ($1, $2, $3, $4)
    RETURNING id
"#;

/// 토큰 저장 (이전 토큰은 덮어쓴다)
pub const SET_AUTH_TOKEN: &str = "UPDATE users SET auth_token = $1 WHERE id = $2";

/// 토큰 삭제
pub const CLEAR_AUTH_TOKEN: &str = "UPDATE users SET auth_token = NULL WHERE id = $1";

/// 토큰으로 사용자 식별
pub const GET_USER_ID_BY_TOKEN: &str = "SELECT id FROM users WHERE auth_token = $1";
