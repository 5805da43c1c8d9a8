use std::collections::HashSet;

use sea_orm::{ActiveModelTrait, ActiveValue::Set};

use crate::{
    entities::movie,
    error::AppResult,
    models::{ActorId, UpdateMovie},
    query::search_key,
    validation,
};

/// Sparse set of assignments derived from an [`UpdateMovie`].
///
/// Only fields present in the request are `Set`; everything else stays `NotSet`
/// and is left out of the UPDATE statement.
#[derive(Clone, Debug, Default)]
pub struct MovieChanges {
    pub fields: movie::ActiveModel,
    /// Replacement cast. `None` keeps the current membership.
    pub actor_ids: Option<Vec<i32>>,
}

impl MovieChanges {
    pub fn from_request(req: &UpdateMovie) -> AppResult<Self> {
        let mut fields = <movie::ActiveModel as Default>::default();

        if let Some(title) = &req.title {
            validation::title(title)?;
            fields.title = Set(title.clone());
            fields.search_title = Set(search_key(title));
        }
        if let Some(description) = &req.description {
            fields.description = Set(description.clone());
        }
        if let Some(year) = req.release_year {
            validation::release_year(year)?;
            fields.release_year = Set(year);
        }
        if let Some(minutes) = req.duration {
            validation::duration(minutes)?;
            fields.duration = Set(minutes);
        }
        if let Some(rating) = req.rating {
            validation::movie_rating(rating)?;
            fields.rating = Set(rating);
        }
        if let Some(url) = &req.poster_url {
            fields.poster_url = Set(url.clone());
        }
        if let Some(url) = &req.trailer_url {
            fields.trailer_url = Set(url.clone());
        }
        if let Some(genre) = req.genre_id {
            fields.genre_id = Set(genre.map(|g| g.0));
        }
        if let Some(director) = req.director_id {
            fields.director_id = Set(director.map(|d| d.0));
        }

        let actor_ids = req.actor_ids.as_deref().map(unique_actor_ids).transpose()?;

        Ok(Self { fields, actor_ids })
    }

    pub fn is_empty(&self) -> bool {
        !self.fields.is_changed() && self.actor_ids.is_none()
    }
}

/// Validated actor IDs in first-seen order, duplicates dropped.
pub fn unique_actor_ids(ids: &[ActorId]) -> AppResult<Vec<i32>> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut out = Vec::with_capacity(ids.len());
    for ActorId(id) in ids {
        validation::id(*id, "actor")?;
        if seen.insert(*id) {
            out.push(*id);
        }
    }
    Ok(out)
}
