/// 경매 목록 쿼리 빌더
/// 선택적 필터/정렬 입력을 하나의 집계 쿼리와 바인딩 파라미터 목록으로 변환한다.
/// 값은 항상 플레이스홀더로 바인딩되며, 플레이스홀더 번호는 값을 넣는 순간에 정해진다.
// region:    --- Imports
use super::queries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs};
use sqlx::{FromRow, Postgres};

// endregion: --- Imports

// region:    --- Bound Query
/// 바인딩 값
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<DateTime<Utc>> for SqlParam {
    fn from(v: DateTime<Utc>) -> Self {
        SqlParam::Timestamp(v)
    }
}

/// 쿼리 텍스트와 그에 정렬된 파라미터 목록
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl BuiltQuery {
    pub fn query_as<O>(&self) -> QueryAs<'_, Postgres, O, PgArguments>
    where
        O: for<'r> FromRow<'r, PgRow>,
    {
        self.params
            .iter()
            .fold(sqlx::query_as::<_, O>(&self.sql), |q, param| match param {
                SqlParam::Int(v) => q.bind(*v),
                SqlParam::Text(v) => q.bind(v.clone()),
                SqlParam::Timestamp(v) => q.bind(*v),
            })
    }

    pub fn query(&self) -> Query<'_, Postgres, PgArguments> {
        self.params
            .iter()
            .fold(sqlx::query(&self.sql), |q, param| match param {
                SqlParam::Int(v) => q.bind(*v),
                SqlParam::Text(v) => q.bind(v.clone()),
                SqlParam::Timestamp(v) => q.bind(*v),
            })
    }
}

/// 호출마다 새로 만드는 파라미터 누산기
#[derive(Debug, Default)]
struct Binder {
    params: Vec<SqlParam>,
}

impl Binder {
    /// 값을 추가하고 그 값을 가리키는 플레이스홀더를 돌려준다.
    fn bind(&mut self, param: impl Into<SqlParam>) -> String {
        self.params.push(param.into());
        format!("${}", self.params.len())
    }
}

// endregion: --- Bound Query

// region:    --- Predicates
/// 목록 필터 절
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// 제목 또는 설명에 대소문자 무시 부분 일치
    TextSearch(String),
    /// 카테고리 중 하나와 일치
    CategoryIn(Vec<i64>),
    SellerIs(i64),
    /// 해당 사용자의 입찰이 하나 이상 있는 경매
    HasBidFrom(i64),
}

impl Predicate {
    fn render(&self, binder: &mut Binder) -> String {
        match self {
            Predicate::TextSearch(term) => {
                let p = binder.bind(format!("%{}%", escape_like(term)));
                format!("(a.title ILIKE {p} OR a.description ILIKE {p})")
            }
            Predicate::CategoryIn(ids) => {
                let tests: Vec<String> = ids
                    .iter()
                    .map(|id| format!("a.category_id = {}", binder.bind(*id)))
                    .collect();
                format!("({})", tests.join(" OR "))
            }
            Predicate::SellerIs(id) => format!("a.seller_id = {}", binder.bind(*id)),
            Predicate::HasBidFrom(id) => format!(
                "EXISTS (SELECT 1 FROM bids mine WHERE mine.auction_id = a.id AND mine.user_id = {})",
                binder.bind(*id)
            ),
        }
    }
}

/// LIKE 패턴의 와일드카드를 리터럴로 취급
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// endregion: --- Predicates

// region:    --- Sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortBy {
    #[default]
    ClosingSoon,
    AlphabeticalAsc,
    AlphabeticalDesc,
    BidsAsc,
    BidsDesc,
    ReserveAsc,
    ReserveDesc,
}

impl SortBy {
    /// 알 수 없는 값은 오류 대신 CLOSING_SOON 으로 처리한다.
    pub fn parse_lenient(token: Option<&str>) -> Self {
        match token.map(str::trim) {
            Some("ALPHABETICAL_ASC") => SortBy::AlphabeticalAsc,
            Some("ALPHABETICAL_DESC") => SortBy::AlphabeticalDesc,
            Some("BIDS_ASC") => SortBy::BidsAsc,
            Some("BIDS_DESC") => SortBy::BidsDesc,
            Some("RESERVE_ASC") => SortBy::ReserveAsc,
            Some("RESERVE_DESC") => SortBy::ReserveDesc,
            _ => SortBy::ClosingSoon,
        }
    }

    fn order_key(self) -> &'static str {
        match self {
            SortBy::ClosingSoon => "a.end_date ASC",
            SortBy::AlphabeticalAsc => "a.title ASC",
            SortBy::AlphabeticalDesc => "a.title DESC",
            // 입찰 없는 경매는 가장 낮은 값으로 본다
            SortBy::BidsAsc => "MAX(b.amount) ASC NULLS FIRST",
            SortBy::BidsDesc => "MAX(b.amount) DESC NULLS LAST",
            SortBy::ReserveAsc => "a.reserve ASC",
            SortBy::ReserveDesc => "a.reserve DESC",
        }
    }
}

// endregion: --- Sort

// region:    --- Listing Query
/// 목록 조회 입력. 모든 필드는 선택 사항이다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingParams {
    pub q: Option<String>,
    pub category_ids: Vec<i64>,
    pub seller_id: Option<i64>,
    pub bidder_id: Option<i64>,
    pub sort_by: Option<String>,
    pub start_index: Option<usize>,
    pub count: Option<usize>,
}

/// 필터는 설정 순서와 무관하게 항상 고정된 순서로 렌더링된다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    search: Option<String>,
    categories: Vec<i64>,
    seller: Option<i64>,
    bidder: Option<i64>,
    sort: SortBy,
}

impl ListingQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_params(params: &ListingParams) -> Self {
        let mut query = Self::new()
            .sort_by(SortBy::parse_lenient(params.sort_by.as_deref()))
            .in_categories(params.category_ids.iter().copied());
        if let Some(q) = &params.q {
            query = query.search(q);
        }
        if let Some(id) = params.seller_id {
            query = query.sold_by(id);
        }
        if let Some(id) = params.bidder_id {
            query = query.bid_on_by(id);
        }
        query
    }

    pub fn search(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self
    }

    pub fn in_categories(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.categories = ids.into_iter().collect();
        self
    }

    pub fn sold_by(mut self, seller_id: i64) -> Self {
        self.seller = Some(seller_id);
        self
    }

    pub fn bid_on_by(mut self, bidder_id: i64) -> Self {
        self.bidder = Some(bidder_id);
        self
    }

    pub fn sort_by(mut self, sort: SortBy) -> Self {
        self.sort = sort;
        self
    }

    /// 검색어, 카테고리, 판매자, 입찰자 순서의 필터 절
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(term) = &self.search {
            predicates.push(Predicate::TextSearch(term.clone()));
        }
        if !self.categories.is_empty() {
            predicates.push(Predicate::CategoryIn(self.categories.clone()));
        }
        if let Some(id) = self.seller {
            predicates.push(Predicate::SellerIs(id));
        }
        if let Some(id) = self.bidder {
            predicates.push(Predicate::HasBidFrom(id));
        }
        predicates
    }

    pub fn build(&self) -> BuiltQuery {
        let mut binder = Binder::default();
        let mut sql = String::from(queries::LIST_AUCTIONS_BASE);

        let clauses: Vec<String> = self
            .predicates()
            .iter()
            .map(|p| p.render(&mut binder))
            .collect();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        sql.push_str(" GROUP BY a.id, u.id");
        sql.push_str(" ORDER BY ");
        sql.push_str(self.sort.order_key());
        sql.push_str(", a.id ASC");

        BuiltQuery {
            sql,
            params: binder.params,
        }
    }
}

/// 정렬된 결과에서 `[start_index, start_index + count)` 구간을 자른다.
pub fn paginate<T>(rows: Vec<T>, start_index: Option<usize>, count: Option<usize>) -> Vec<T> {
    let start = start_index.unwrap_or(0);
    let iter = rows.into_iter().skip(start);
    match count {
        Some(count) => iter.take(count).collect(),
        None => iter.collect(),
    }
}

// endregion: --- Listing Query

// region:    --- Sparse Update
/// 주어진 컬럼만 갱신하는 단일 UPDATE 문 빌더
#[derive(Debug)]
pub struct UpdateBuilder {
    table: &'static str,
    assignments: Vec<String>,
    binder: Binder,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            binder: Binder::default(),
        }
    }

    /// 값이 없으면 해당 컬럼은 건드리지 않는다.
    pub fn set<V: Into<SqlParam>>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            let p = self.binder.bind(value);
            self.assignments.push(format!("{column} = {p}"));
        }
        self
    }

    /// 갱신할 컬럼이 하나도 없으면 `None`
    pub fn build_for_id(mut self, id: i64) -> Option<BuiltQuery> {
        if self.assignments.is_empty() {
            return None;
        }
        let id_placeholder = self.binder.bind(id);
        let sql = format!(
            "UPDATE {} SET {} WHERE id = {}",
            self.table,
            self.assignments.join(", "),
            id_placeholder
        );
        Some(BuiltQuery {
            sql,
            params: self.binder.params,
        })
    }
}

// endregion: --- Sparse Update

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder_count(sql: &str) -> usize {
        (1..=64).filter(|n| sql.contains(&format!("${n}"))).count()
    }

    #[test]
    fn no_filters_yields_base_query_with_default_order() {
        let built = ListingQuery::new().build();
        assert!(built.params.is_empty());
        assert!(!built.sql.contains("WHERE"));
        assert!(built.sql.contains("LEFT JOIN bids b ON b.auction_id = a.id"));
        assert!(built
            .sql
            .ends_with("GROUP BY a.id, u.id ORDER BY a.end_date ASC, a.id ASC"));
    }

    #[test]
    fn predicates_render_in_fixed_order_regardless_of_call_order() {
        let a = ListingQuery::new()
            .bid_on_by(9)
            .sold_by(7)
            .in_categories([3, 4])
            .search("bike")
            .build();
        let b = ListingQuery::new()
            .search("bike")
            .in_categories([3, 4])
            .sold_by(7)
            .bid_on_by(9)
            .build();
        assert_eq!(a, b);

        assert_eq!(
            a.params,
            vec![
                SqlParam::Text("%bike%".into()),
                SqlParam::Int(3),
                SqlParam::Int(4),
                SqlParam::Int(7),
                SqlParam::Int(9),
            ]
        );
        let search = a.sql.find("ILIKE $1").unwrap();
        let category = a.sql.find("a.category_id = $2 OR a.category_id = $3").unwrap();
        let seller = a.sql.find("a.seller_id = $4").unwrap();
        let bidder = a.sql.find("mine.user_id = $5").unwrap();
        assert!(search < category && category < seller && seller < bidder);
    }

    #[test]
    fn placeholders_and_params_stay_aligned() {
        let combos = [
            ListingQuery::new().search("a"),
            ListingQuery::new().in_categories([1, 2, 3]),
            ListingQuery::new().sold_by(1).bid_on_by(2),
            ListingQuery::new().search("x").bid_on_by(5),
            ListingQuery::new().in_categories([8]).sold_by(2),
        ];
        for query in combos {
            let built = query.build();
            assert_eq!(placeholder_count(&built.sql), built.params.len(), "{}", built.sql);
        }
    }

    #[test]
    fn text_search_uses_one_placeholder_for_both_columns() {
        let built = ListingQuery::new().search("  lamp ").build();
        assert!(built
            .sql
            .contains("(a.title ILIKE $1 OR a.description ILIKE $1)"));
        assert_eq!(built.params, vec![SqlParam::Text("%lamp%".into())]);
    }

    #[test]
    fn blank_search_and_empty_categories_are_no_constraint() {
        let built = ListingQuery::new().search("   ").in_categories([]).build();
        assert!(built.params.is_empty());
        assert!(!built.sql.contains("WHERE"));
    }

    #[test]
    fn like_wildcards_in_search_are_literal() {
        let built = ListingQuery::new().search("50%_off\\").build();
        assert_eq!(
            built.params,
            vec![SqlParam::Text("%50\\%\\_off\\\\%".into())]
        );
    }

    #[test]
    fn user_values_never_reach_the_sql_text() {
        let built = ListingQuery::new()
            .search("'; DROP TABLE auctions; --")
            .build();
        assert!(!built.sql.contains("DROP TABLE"));
    }

    #[test]
    fn every_sort_token_maps_to_its_key_with_id_tiebreak() {
        let cases = [
            ("CLOSING_SOON", "a.end_date ASC"),
            ("ALPHABETICAL_ASC", "a.title ASC"),
            ("ALPHABETICAL_DESC", "a.title DESC"),
            ("BIDS_ASC", "MAX(b.amount) ASC NULLS FIRST"),
            ("BIDS_DESC", "MAX(b.amount) DESC NULLS LAST"),
            ("RESERVE_ASC", "a.reserve ASC"),
            ("RESERVE_DESC", "a.reserve DESC"),
        ];
        for (token, key) in cases {
            let built = ListingQuery::new()
                .sort_by(SortBy::parse_lenient(Some(token)))
                .build();
            assert!(
                built.sql.ends_with(&format!("ORDER BY {key}, a.id ASC")),
                "{token}: {}",
                built.sql
            );
        }
    }

    #[test]
    fn unknown_or_missing_sort_falls_back_to_closing_soon() {
        assert_eq!(SortBy::parse_lenient(Some("PRICE_ASC")), SortBy::ClosingSoon);
        assert_eq!(SortBy::parse_lenient(Some("bids_asc")), SortBy::ClosingSoon);
        assert_eq!(SortBy::parse_lenient(None), SortBy::ClosingSoon);
    }

    #[test]
    fn from_params_matches_the_fluent_form() {
        let params = ListingParams {
            q: Some("desk".into()),
            category_ids: vec![11],
            seller_id: Some(2),
            bidder_id: None,
            sort_by: Some("RESERVE_DESC".into()),
            start_index: Some(3),
            count: Some(10),
        };
        let expected = ListingQuery::new()
            .search("desk")
            .in_categories([11])
            .sold_by(2)
            .sort_by(SortBy::ReserveDesc);
        assert_eq!(ListingQuery::from_params(&params), expected);
    }

    #[test]
    fn paginate_is_a_slice_of_the_full_result() {
        let full: Vec<u32> = (0..10).collect();
        for start in 0..12 {
            for count in 0..12 {
                let page = paginate(full.clone(), Some(start), Some(count));
                let lo = start.min(full.len());
                let hi = (start + count).min(full.len());
                assert_eq!(page, full[lo..hi].to_vec(), "start={start} count={count}");
            }
        }
    }

    #[test]
    fn paginate_defaults() {
        let full = vec!['a', 'b', 'c'];
        assert_eq!(paginate(full.clone(), None, None), full);
        assert_eq!(paginate(full.clone(), Some(1), None), vec!['b', 'c']);
        assert_eq!(paginate(full, None, Some(0)), Vec::<char>::new());
    }

    #[test]
    fn update_touches_only_supplied_columns() {
        let built = UpdateBuilder::new("auctions")
            .set("title", Some("New".to_string()))
            .set::<String>("description", None)
            .set("reserve", Some(30_i64))
            .build_for_id(12)
            .unwrap();
        assert_eq!(
            built.sql,
            "UPDATE auctions SET title = $1, reserve = $2 WHERE id = $3"
        );
        assert_eq!(
            built.params,
            vec![
                SqlParam::Text("New".into()),
                SqlParam::Int(30),
                SqlParam::Int(12)
            ]
        );
    }

    #[test]
    fn empty_update_builds_nothing() {
        let builder = UpdateBuilder::new("users").set::<i64>("id", None);
        assert!(builder.build_for_id(1).is_none());
    }
}
// endregion: --- Tests
