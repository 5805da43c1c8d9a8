use sea_orm::{
    ActiveValue::{NotSet, Set},
    DatabaseConnection,
};
use tracing::{debug, info};

use crate::{
    changeset::{MovieChanges, unique_actor_ids},
    db::now_sec,
    entities::movie,
    error::{AppError, AppResult},
    models::{CreateMovie, MovieDetails, UpdateMovie},
    query::{self, MovieFilter, Page, PageRequest},
    repository::MovieRepository,
    validation,
};

/// Movie use cases. Holds no HTTP types so any boundary can drive it.
#[derive(Clone)]
pub struct MovieService {
    repo: MovieRepository,
}

impl MovieService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { repo: MovieRepository::new(db) }
    }

    pub async fn get_movie(&self, id: i32) -> AppResult<MovieDetails> {
        let id = validation::id(id, "movie")?;
        self.repo.find_by_id(id).await?.ok_or_else(|| AppError::not_found("movie not found"))
    }

    pub async fn list_movies(
        &self,
        filter: MovieFilter,
        page: PageRequest,
    ) -> AppResult<Page<MovieDetails>> {
        self.repo.find_page(&filter, page).await
    }

    pub async fn create_movie(&self, req: CreateMovie) -> AppResult<MovieDetails> {
        validation::create_movie(&req)?;
        let actor_ids = unique_actor_ids(&req.actor_ids)?;

        let now = now_sec();
        let fields = movie::ActiveModel {
            id: NotSet,
            search_title: Set(query::search_key(&req.title)),
            title: Set(req.title),
            description: Set(req.description),
            release_year: Set(req.release_year),
            duration: Set(req.duration),
            rating: Set(req.rating),
            poster_url: Set(req.poster_url),
            trailer_url: Set(req.trailer_url),
            genre_id: Set(req.genre_id.map(|g| g.0)),
            director_id: Set(req.director_id.map(|d| d.0)),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let id = self.repo.create(fields, &actor_ids).await?;
        info!(movie_id = id, "movie created");

        self.get_movie(id).await
    }

    pub async fn update_movie(&self, id: i32, req: &UpdateMovie) -> AppResult<MovieDetails> {
        let existing = self.get_movie(id).await?;

        let changes = MovieChanges::from_request(req)?;
        if changes.is_empty() {
            debug!(movie_id = id, "empty update, nothing to write");
            return Ok(existing);
        }

        self.repo.update(id, changes).await?;
        info!(movie_id = id, "movie updated");

        self.get_movie(id).await
    }

    pub async fn delete_movie(&self, id: i32) -> AppResult<()> {
        let id = validation::id(id, "movie")?;
        self.repo.soft_delete(id).await?;
        info!(movie_id = id, "movie deleted");
        Ok(())
    }

    /// Case-insensitive substring match on the title.
    pub async fn search_movies(
        &self,
        title: &str,
        page: PageRequest,
    ) -> AppResult<Page<MovieDetails>> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::validation("search title is required"));
        }
        let filter = MovieFilter { title: Some(title.to_string()), ..Default::default() };
        self.repo.find_page(&filter, page).await
    }

    pub async fn top_rated(&self, limit: Option<i64>) -> AppResult<Vec<MovieDetails>> {
        self.repo.top_rated(query::top_rated_limit(limit)).await
    }

    pub async fn movies_by_genre(
        &self,
        genre_id: i32,
        page: PageRequest,
    ) -> AppResult<Page<MovieDetails>> {
        let genre_id = validation::id(genre_id, "genre")?;
        let filter = MovieFilter { genre_id: Some(genre_id), ..Default::default() };
        self.repo.find_page(&filter, page).await
    }

    pub async fn movies_by_director(
        &self,
        director_id: i32,
        page: PageRequest,
    ) -> AppResult<Page<MovieDetails>> {
        let director_id = validation::id(director_id, "director")?;
        let filter = MovieFilter { director_id: Some(director_id), ..Default::default() };
        self.repo.find_page(&filter, page).await
    }

    pub async fn movies_by_actor(
        &self,
        actor_id: i32,
        page: PageRequest,
    ) -> AppResult<Page<MovieDetails>> {
        let actor_id = validation::id(actor_id, "actor")?;
        let filter = MovieFilter { actor_id: Some(actor_id), ..Default::default() };
        self.repo.find_page(&filter, page).await
    }
}
