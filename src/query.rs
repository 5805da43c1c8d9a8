//! Filter composition and pagination for movie listings.

use sea_orm::{
    ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Expr, LikeExpr, Query},
};

use crate::entities::{movie, movie_actor};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
pub const DEFAULT_TOP_RATED: u64 = 10;
pub const MAX_TOP_RATED: u64 = 50;

/// A normalized page window. `page` is 1-based.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Missing values take the defaults, then `page >= 1` and `limit` in `1..=100`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1) as u64;
        let limit = limit
            .map(|l| l.clamp(1, MAX_PAGE_SIZE as i64) as u64)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self { page, limit }
    }

    /// Capped at `i64::MAX`, the largest offset SQLite binds.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit).min(i64::MAX as u64)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the size of the whole match set.
#[derive(Clone, Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
        }
    }
}

pub fn top_rated_limit(limit: Option<i64>) -> u64 {
    limit.map(|l| l.clamp(1, MAX_TOP_RATED as i64) as u64).unwrap_or(DEFAULT_TOP_RATED)
}

/// Optional constraints, AND-ed together. `None` means unconstrained.
#[derive(Clone, Debug, Default)]
pub struct MovieFilter {
    pub genre_id: Option<i32>,
    pub director_id: Option<i32>,
    pub actor_id: Option<i32>,
    pub min_rating: Option<f64>,
    pub title: Option<String>,
}

impl MovieFilter {
    pub fn condition(&self) -> Condition {
        Condition::all()
            .add(movie::Column::DeletedAt.is_null())
            .add_option(self.genre_id.map(|id| movie::Column::GenreId.eq(id)))
            .add_option(self.director_id.map(|id| movie::Column::DirectorId.eq(id)))
            .add_option(self.min_rating.map(|r| movie::Column::Rating.gte(r)))
            .add_option(self.actor_id.map(|id| {
                // A subquery rather than a join keeps one row per movie.
                movie::Column::Id.in_subquery(
                    Query::select()
                        .column(movie_actor::Column::MovieId)
                        .from(movie_actor::Entity)
                        .and_where(movie_actor::Column::ActorId.eq(id))
                        .to_owned(),
                )
            }))
            .add_option(self.title.as_deref().map(|needle| {
                Expr::col(movie::Column::SearchTitle)
                    .like(LikeExpr::new(contains_pattern(needle)).escape(LIKE_ESCAPE))
            }))
    }

    /// Matching rows in primary key order, without pagination.
    pub fn select(&self) -> Select<movie::Entity> {
        movie::Entity::find().filter(self.condition()).order_by_asc(movie::Column::Id)
    }

    pub fn paginate(&self, page: PageRequest) -> Select<movie::Entity> {
        self.select().offset(page.offset()).limit(page.limit)
    }
}

/// Highest rating first, ties by primary key.
pub fn top_rated(limit: u64) -> Select<movie::Entity> {
    movie::Entity::find()
        .filter(movie::Column::DeletedAt.is_null())
        .order_by_desc(movie::Column::Rating)
        .order_by_asc(movie::Column::Id)
        .limit(limit)
}

const LIKE_ESCAPE: char = '!';

/// Folded form of a title stored alongside it. SQLite `LOWER()` only folds ASCII,
/// so both the column and the needle are lowercased here instead.
pub fn search_key(title: &str) -> String {
    title.to_lowercase()
}

/// Lowercased `%needle%` with LIKE wildcards in the needle escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in search_key(needle).chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
