use std::fmt;

use garde::Validate;
use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Deserializer, Serialize};

use crate::entities::{actor, director, genre, movie, review, user};

macro_rules! entity_id {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(
                Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub i32);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    self.0.fmt(f)
                }
            }
        )*
    };
}

entity_id!(MovieId, GenreId, DirectorId, ActorId, UserId, ReviewId);

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateMovie {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub release_year: i32,
    #[serde(default)]
    pub duration: i32,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub trailer_url: String,
    pub genre_id: Option<GenreId>,
    pub director_id: Option<DirectorId>,
    #[serde(default)]
    pub actor_ids: Vec<ActorId>,
}

/// Every field is optional; an absent field leaves the stored value alone.
///
/// `genre_id` and `director_id` additionally tell an explicit `null` (clear the
/// reference) apart from absence.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateMovie {
    pub title: Option<String>,
    pub description: Option<String>,
    pub release_year: Option<i32>,
    pub duration: Option<i32>,
    pub rating: Option<f64>,
    pub poster_url: Option<String>,
    pub trailer_url: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub genre_id: Option<Option<GenreId>>,
    #[serde(default, deserialize_with = "present")]
    pub director_id: Option<Option<DirectorId>>,
    pub actor_ids: Option<Vec<ActorId>>,
}

fn present<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CreateGenre {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(skip)]
    #[serde(default)]
    pub description: String,
}

/// Shared create payload for directors and actors.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CreatePerson {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(skip)]
    #[serde(default)]
    pub biography: String,
    #[garde(skip)]
    pub birth_date: Option<Date>,
    #[garde(skip)]
    #[serde(default)]
    pub nationality: String,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CreateUser {
    #[garde(length(min = 1))]
    pub username: String,
    #[garde(email)]
    pub email: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateReview {
    pub movie_id: MovieId,
    pub user_id: UserId,
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
}

/// A movie row together with its eagerly loaded relations.
#[derive(Clone, Debug)]
pub struct MovieDetails {
    pub movie: movie::Model,
    pub genre: Option<genre::Model>,
    pub director: Option<director::Model>,
    pub actors: Vec<actor::Model>,
    /// Only loaded for single-record fetches.
    pub reviews: Option<Vec<ReviewWithUser>>,
}

#[derive(Clone, Debug)]
pub struct ReviewWithUser {
    pub review: review::Model,
    pub user: Option<user::Model>,
}

fn timestamp(secs: i64) -> Timestamp {
    Timestamp::from_second(secs).unwrap_or(Timestamp::UNIX_EPOCH)
}

#[derive(Clone, Debug, Serialize)]
pub struct GenreResponse {
    pub id: GenreId,
    pub name: String,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<genre::Model> for GenreResponse {
    fn from(m: genre::Model) -> Self {
        Self {
            id: GenreId(m.id),
            name: m.name,
            description: m.description,
            created_at: timestamp(m.created_at),
            updated_at: timestamp(m.updated_at),
        }
    }
}

/// Directors and actors share a shape; `Id` keeps their references apart.
#[derive(Clone, Debug, Serialize)]
pub struct PersonResponse<Id> {
    pub id: Id,
    pub name: String,
    pub biography: String,
    pub birth_date: Option<Date>,
    pub nationality: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<director::Model> for PersonResponse<DirectorId> {
    fn from(m: director::Model) -> Self {
        Self {
            id: DirectorId(m.id),
            name: m.name,
            biography: m.biography,
            birth_date: m.birth_date.and_then(|d| d.parse().ok()),
            nationality: m.nationality,
            created_at: timestamp(m.created_at),
            updated_at: timestamp(m.updated_at),
        }
    }
}

impl From<actor::Model> for PersonResponse<ActorId> {
    fn from(m: actor::Model) -> Self {
        Self {
            id: ActorId(m.id),
            name: m.name,
            biography: m.biography,
            birth_date: m.birth_date.and_then(|d| d.parse().ok()),
            nationality: m.nationality,
            created_at: timestamp(m.created_at),
            updated_at: timestamp(m.updated_at),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: UserId(m.id),
            username: m.username,
            email: m.email,
            created_at: timestamp(m.created_at),
            updated_at: timestamp(m.updated_at),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ReviewResponse {
    pub id: ReviewId,
    pub movie_id: MovieId,
    pub user_id: UserId,
    pub rating: f64,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ReviewWithUser> for ReviewResponse {
    fn from(ReviewWithUser { review, user }: ReviewWithUser) -> Self {
        Self {
            id: ReviewId(review.id),
            movie_id: MovieId(review.movie_id),
            user_id: UserId(review.user_id),
            rating: review.rating,
            comment: review.comment,
            user: user.map(Into::into),
            created_at: timestamp(review.created_at),
            updated_at: timestamp(review.updated_at),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieResponse {
    pub id: MovieId,
    pub title: String,
    pub description: String,
    pub release_year: i32,
    pub duration: i32,
    pub rating: f64,
    pub poster_url: String,
    pub trailer_url: String,
    pub genre_id: Option<GenreId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<GenreResponse>,
    pub director_id: Option<DirectorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<PersonResponse<DirectorId>>,
    pub actors: Vec<PersonResponse<ActorId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<ReviewResponse>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<MovieDetails> for MovieResponse {
    fn from(details: MovieDetails) -> Self {
        let MovieDetails { movie, genre, director, actors, reviews } = details;
        Self {
            id: MovieId(movie.id),
            title: movie.title,
            description: movie.description,
            release_year: movie.release_year,
            duration: movie.duration,
            rating: movie.rating,
            poster_url: movie.poster_url,
            trailer_url: movie.trailer_url,
            genre_id: movie.genre_id.map(GenreId),
            genre: genre.map(Into::into),
            director_id: movie.director_id.map(DirectorId),
            director: director.map(Into::into),
            actors: actors.into_iter().map(Into::into).collect(),
            reviews: reviews.map(|rs| rs.into_iter().map(Into::into).collect()),
            created_at: timestamp(movie.created_at),
            updated_at: timestamp(movie.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_tells_null_apart_from_absent() {
        let absent: UpdateMovie = serde_json::from_str(r#"{"title":"Heat"}"#).unwrap();
        assert_eq!(absent.genre_id, None);
        assert_eq!(absent.director_id, None);
        assert!(absent.actor_ids.is_none());

        let cleared: UpdateMovie = serde_json::from_str(r#"{"genre_id":null}"#).unwrap();
        assert_eq!(cleared.genre_id, Some(None));

        let set: UpdateMovie =
            serde_json::from_str(r#"{"director_id":3,"actor_ids":[]}"#).unwrap();
        assert_eq!(set.director_id, Some(Some(DirectorId(3))));
        assert_eq!(set.actor_ids, Some(vec![]));
    }

    #[test]
    fn create_defaults_missing_fields() {
        let req: CreateMovie =
            serde_json::from_str(r#"{"title":"Inception","actor_ids":[1,2]}"#).unwrap();
        assert_eq!(req.release_year, 0);
        assert_eq!(req.genre_id, None);
        assert_eq!(req.actor_ids, vec![ActorId(1), ActorId(2)]);
    }

    #[test]
    fn create_without_title_reaches_validation() {
        let req: CreateMovie = serde_json::from_str(r#"{"rating":7.5}"#).unwrap();
        assert_eq!(req.title, "");
    }

    #[test]
    fn ids_serialize_as_bare_integers() {
        assert_eq!(serde_json::to_string(&GenreId(7)).unwrap(), "7");
    }

    #[test]
    fn person_responses_carry_their_own_id_type() {
        let actor = actor::Model {
            id: 4,
            name: "Emma Stone".into(),
            biography: String::new(),
            birth_date: Some("1988-11-06".into()),
            nationality: "American".into(),
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        };
        let resp = PersonResponse::<ActorId>::from(actor);
        assert_eq!(resp.id, ActorId(4));

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["birth_date"], "1988-11-06");
    }

    #[test]
    fn user_email_must_be_well_formed() {
        let ok = CreateUser { username: "cinema_fan".into(), email: "fan@cinema.com".into() };
        assert!(ok.validate().is_ok());

        let bad = CreateUser { username: "cinema_fan".into(), email: "not-an-email".into() };
        assert!(bad.validate().is_err());

        let missing = CreateUser { username: "".into(), email: "fan@cinema.com".into() };
        assert!(missing.validate().is_err());
    }

    #[test]
    fn person_birth_date_is_iso() {
        let req: CreatePerson =
            serde_json::from_str(r#"{"name":"Greta Gerwig","birth_date":"1983-08-04"}"#).unwrap();
        assert_eq!(req.birth_date, Some(jiff::civil::date(1983, 8, 4)));
    }
}
