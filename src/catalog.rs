//! Genres, directors, actors, users and reviews.

use garde::Validate;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use tracing::info;

use crate::{
    db::now_sec,
    entities::{actor, director, genre, movie, review, user},
    error::{AppError, AppResult},
    models::{CreateGenre, CreatePerson, CreateReview, CreateUser, ReviewWithUser},
    validation,
};

#[derive(Clone)]
pub struct CatalogService {
    db: DatabaseConnection,
}

impl CatalogService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_genre(&self, req: CreateGenre) -> AppResult<genre::Model> {
        req.validate()?;
        let now = now_sec();
        let genre = genre::ActiveModel {
            id: Default::default(),
            name: Set(req.name),
            description: Set(req.description),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        info!(genre_id = genre.id, name = %genre.name, "genre created");
        Ok(genre)
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<genre::Model> {
        let id = validation::id(id, "genre")?;
        genre::Entity::find_by_id(id)
            .filter(genre::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("genre not found"))
    }

    pub async fn list_genres(&self) -> AppResult<Vec<genre::Model>> {
        Ok(genre::Entity::find()
            .filter(genre::Column::DeletedAt.is_null())
            .order_by_asc(genre::Column::Name)
            .order_by_asc(genre::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn create_director(&self, req: CreatePerson) -> AppResult<director::Model> {
        req.validate()?;
        let now = now_sec();
        let director = director::ActiveModel {
            id: Default::default(),
            name: Set(req.name),
            biography: Set(req.biography),
            birth_date: Set(req.birth_date.map(|d| d.to_string())),
            nationality: Set(req.nationality),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        info!(director_id = director.id, name = %director.name, "director created");
        Ok(director)
    }

    pub async fn get_director(&self, id: i32) -> AppResult<director::Model> {
        let id = validation::id(id, "director")?;
        director::Entity::find_by_id(id)
            .filter(director::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("director not found"))
    }

    pub async fn create_actor(&self, req: CreatePerson) -> AppResult<actor::Model> {
        req.validate()?;
        let now = now_sec();
        let actor = actor::ActiveModel {
            id: Default::default(),
            name: Set(req.name),
            biography: Set(req.biography),
            birth_date: Set(req.birth_date.map(|d| d.to_string())),
            nationality: Set(req.nationality),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        info!(actor_id = actor.id, name = %actor.name, "actor created");
        Ok(actor)
    }

    pub async fn get_actor(&self, id: i32) -> AppResult<actor::Model> {
        let id = validation::id(id, "actor")?;
        actor::Entity::find_by_id(id)
            .filter(actor::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("actor not found"))
    }

    pub async fn create_user(&self, req: CreateUser) -> AppResult<user::Model> {
        req.validate()?;
        let now = now_sec();
        let user = user::ActiveModel {
            id: Default::default(),
            username: Set(req.username),
            email: Set(req.email),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        info!(user_id = user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, id: i32) -> AppResult<user::Model> {
        let id = validation::id(id, "user")?;
        user::Entity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    /// The reviewed movie and the author must both be live.
    pub async fn create_review(&self, req: CreateReview) -> AppResult<ReviewWithUser> {
        validation::review_rating(req.rating)?;
        let movie_id = validation::id(req.movie_id.0, "movie")?;

        movie::Entity::find_by_id(movie_id)
            .filter(movie::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("movie not found"))?;
        let user = self.get_user(req.user_id.0).await?;

        let now = now_sec();
        let review = review::ActiveModel {
            id: Default::default(),
            movie_id: Set(movie_id),
            user_id: Set(user.id),
            rating: Set(req.rating),
            comment: Set(req.comment),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        info!(review_id = review.id, movie_id, user_id = user.id, "review created");
        Ok(ReviewWithUser { review, user: Some(user) })
    }
}
