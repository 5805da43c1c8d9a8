//! Business rules checked before a movie or review is written.

use std::ops::RangeInclusive;

use crate::{
    error::{AppError, AppResult},
    models::CreateMovie,
};

pub const RELEASE_YEARS: RangeInclusive<i32> = 1888..=2030;
pub const MOVIE_RATINGS: RangeInclusive<f64> = 0.0..=10.0;
pub const REVIEW_RATINGS: RangeInclusive<f64> = 1.0..=10.0;

pub fn create_movie(req: &CreateMovie) -> AppResult<()> {
    if req.title.trim().is_empty() {
        return Err(AppError::validation("movie title is required"));
    }
    release_year(req.release_year)?;
    duration(req.duration)?;
    movie_rating(req.rating)
}

/// Update-time title check; an update may omit the title but never blank it.
pub fn title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::validation("movie title cannot be empty"));
    }
    Ok(())
}

pub fn release_year(year: i32) -> AppResult<()> {
    if !RELEASE_YEARS.contains(&year) {
        return Err(AppError::validation("invalid release year"));
    }
    Ok(())
}

pub fn duration(minutes: i32) -> AppResult<()> {
    if minutes <= 0 {
        return Err(AppError::validation("duration must be positive"));
    }
    Ok(())
}

pub fn movie_rating(rating: f64) -> AppResult<()> {
    // `contains` is false for NaN.
    if !MOVIE_RATINGS.contains(&rating) {
        return Err(AppError::validation("rating must be between 0 and 10"));
    }
    Ok(())
}

pub fn review_rating(rating: f64) -> AppResult<()> {
    if !REVIEW_RATINGS.contains(&rating) {
        return Err(AppError::validation("review rating must be between 1 and 10"));
    }
    Ok(())
}

/// Positive database identity, `entity` names it in the error.
pub fn id(id: i32, entity: &str) -> AppResult<i32> {
    if id <= 0 {
        return Err(AppError::validation(format!("invalid {entity} ID")));
    }
    Ok(id)
}
