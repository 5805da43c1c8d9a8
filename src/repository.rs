use std::collections::{BTreeSet, HashMap};

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    sea_query::Expr,
};
use tracing::debug;

use crate::{
    changeset::MovieChanges,
    db::now_sec,
    entities::{actor, director, genre, movie, movie_actor, review, user},
    error::{AppError, AppResult},
    models::{MovieDetails, ReviewWithUser},
    query::{self, MovieFilter, Page, PageRequest},
};

#[derive(Clone)]
pub struct MovieRepository {
    db: DatabaseConnection,
}

impl MovieRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_page(
        &self,
        filter: &MovieFilter,
        page: PageRequest,
    ) -> AppResult<Page<MovieDetails>> {
        let total = filter.select().count(&self.db).await?;
        let rows = filter.paginate(page).all(&self.db).await?;

        debug!(
            ?filter,
            page = page.page,
            limit = page.limit,
            total,
            returned = rows.len(),
            "movie page"
        );

        Ok(Page {
            items: self.with_relations(rows).await?,
            page: page.page,
            limit: page.limit,
            total,
        })
    }

    pub async fn top_rated(&self, limit: u64) -> AppResult<Vec<MovieDetails>> {
        let rows = query::top_rated(limit).all(&self.db).await?;
        debug!(limit, returned = rows.len(), "top rated movies");
        self.with_relations(rows).await
    }

    /// Live movie with genre, director, cast and reviews (each with its author).
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<MovieDetails>> {
        let Some(movie) = movie::Entity::find_by_id(id)
            .filter(movie::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let reviews = movie
            .find_related(review::Entity)
            .filter(review::Column::DeletedAt.is_null())
            .order_by_asc(review::Column::Id)
            .all(&self.db)
            .await?;

        let user_ids: BTreeSet<i32> = reviews.iter().map(|r| r.user_id).collect();
        let users: HashMap<i32, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .filter(user::Column::DeletedAt.is_null())
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let reviews = reviews
            .into_iter()
            .map(|review| ReviewWithUser { user: users.get(&review.user_id).cloned(), review })
            .collect();

        let mut details = self.with_relations(vec![movie]).await?;
        let mut movie = details
            .pop()
            .ok_or_else(|| anyhow::anyhow!("movie {id} lost while loading relations"))?;
        movie.reviews = Some(reviews);
        Ok(Some(movie))
    }

    /// Inserts the movie row and its cast as one unit of work.
    pub async fn create(&self, fields: movie::ActiveModel, actor_ids: &[i32]) -> AppResult<i32> {
        let txn = self.db.begin().await?;

        let movie = fields.insert(&txn).await?;
        ensure_actors_exist(&txn, actor_ids).await?;
        link_actors(&txn, movie.id, actor_ids).await?;

        txn.commit().await?;

        debug!(movie_id = movie.id, actors = actor_ids.len(), "movie inserted");
        Ok(movie.id)
    }

    /// Applies a non-empty change set. A supplied cast replaces the old one entirely.
    pub async fn update(&self, id: i32, changes: MovieChanges) -> AppResult<()> {
        let MovieChanges { mut fields, actor_ids } = changes;
        fields.updated_at = Set(now_sec());

        let txn = self.db.begin().await?;

        let result = movie::Entity::update_many()
            .set(fields)
            .filter(movie::Column::Id.eq(id))
            .filter(movie::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found("movie not found"));
        }

        if let Some(actor_ids) = actor_ids {
            ensure_actors_exist(&txn, &actor_ids).await?;
            movie_actor::Entity::delete_many()
                .filter(movie_actor::Column::MovieId.eq(id))
                .exec(&txn)
                .await?;
            link_actors(&txn, id, &actor_ids).await?;
            debug!(movie_id = id, actors = actor_ids.len(), "cast replaced");
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn soft_delete(&self, id: i32) -> AppResult<()> {
        let now = now_sec();
        let result = movie::Entity::update_many()
            .col_expr(movie::Column::DeletedAt, Expr::value(now))
            .col_expr(movie::Column::UpdatedAt, Expr::value(now))
            .filter(movie::Column::Id.eq(id))
            .filter(movie::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("movie not found"));
        }
        Ok(())
    }

    /// Batch-loads genre, director and cast for a set of movies, preserving order.
    async fn with_relations(&self, movies: Vec<movie::Model>) -> AppResult<Vec<MovieDetails>> {
        if movies.is_empty() {
            return Ok(Vec::new());
        }

        let movie_ids: Vec<i32> = movies.iter().map(|m| m.id).collect();
        let genre_ids: BTreeSet<i32> = movies.iter().filter_map(|m| m.genre_id).collect();
        let director_ids: BTreeSet<i32> = movies.iter().filter_map(|m| m.director_id).collect();

        let (genres, directors, mut cast) = futures::try_join!(
            genre::Entity::find()
                .filter(genre::Column::Id.is_in(genre_ids))
                .filter(genre::Column::DeletedAt.is_null())
                .all(&self.db),
            director::Entity::find()
                .filter(director::Column::Id.is_in(director_ids))
                .filter(director::Column::DeletedAt.is_null())
                .all(&self.db),
            cast_of(&self.db, &movie_ids),
        )?;

        let genres: HashMap<i32, genre::Model> = genres.into_iter().map(|g| (g.id, g)).collect();
        let directors: HashMap<i32, director::Model> =
            directors.into_iter().map(|d| (d.id, d)).collect();

        Ok(movies
            .into_iter()
            .map(|movie| MovieDetails {
                genre: movie.genre_id.and_then(|id| genres.get(&id).cloned()),
                director: movie.director_id.and_then(|id| directors.get(&id).cloned()),
                actors: cast.remove(&movie.id).unwrap_or_default(),
                reviews: None,
                movie,
            })
            .collect())
    }
}

/// Live actors per movie, each list ordered by actor id.
async fn cast_of<C: ConnectionTrait>(
    conn: &C,
    movie_ids: &[i32],
) -> Result<HashMap<i32, Vec<actor::Model>>, DbErr> {
    let links = movie_actor::Entity::find()
        .filter(movie_actor::Column::MovieId.is_in(movie_ids.iter().copied()))
        .all(conn)
        .await?;

    let actor_ids: BTreeSet<i32> = links.iter().map(|l| l.actor_id).collect();
    let actors: HashMap<i32, actor::Model> = actor::Entity::find()
        .filter(actor::Column::Id.is_in(actor_ids))
        .filter(actor::Column::DeletedAt.is_null())
        .all(conn)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let mut cast: HashMap<i32, Vec<actor::Model>> = HashMap::new();
    for link in links {
        if let Some(actor) = actors.get(&link.actor_id) {
            cast.entry(link.movie_id).or_default().push(actor.clone());
        }
    }
    for members in cast.values_mut() {
        members.sort_by_key(|a| a.id);
    }
    Ok(cast)
}

async fn ensure_actors_exist<C: ConnectionTrait>(conn: &C, actor_ids: &[i32]) -> AppResult<()> {
    if actor_ids.is_empty() {
        return Ok(());
    }

    let found: BTreeSet<i32> = actor::Entity::find()
        .filter(actor::Column::Id.is_in(actor_ids.iter().copied()))
        .filter(actor::Column::DeletedAt.is_null())
        .all(conn)
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect();

    match actor_ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(AppError::validation(format!("actor {missing} does not exist"))),
        None => Ok(()),
    }
}

/// Insert-only association; callers clear the old membership first when replacing.
async fn link_actors<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
    actor_ids: &[i32],
) -> Result<(), DbErr> {
    if actor_ids.is_empty() {
        return Ok(());
    }

    let rows = actor_ids.iter().map(|&actor_id| movie_actor::ActiveModel {
        movie_id: Set(movie_id),
        actor_id: Set(actor_id),
    });
    movie_actor::Entity::insert_many(rows).exec_without_returning(conn).await?;
    Ok(())
}
