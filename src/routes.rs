use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{
        ActorId, CreateGenre, CreateMovie, CreatePerson, CreateReview, CreateUser, DirectorId,
        GenreResponse, MovieResponse, PersonResponse, ReviewResponse, UpdateMovie, UserResponse,
    },
    query::{MovieFilter, Page, PageRequest},
};

type AppJson<T> = WithRejection<Json<T>, AppError>;
type AppQuery<T> = WithRejection<Query<T>, AppError>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/search", get(search_movies))
        .route("/movies/top-rated", get(top_rated))
        .route("/movies/{id}", get(get_movie).put(update_movie).delete(delete_movie))
        .route("/genres", get(list_genres).post(create_genre))
        .route("/genres/{id}", get(get_genre))
        .route("/genres/{id}/movies", get(movies_by_genre))
        .route("/directors", post(create_director))
        .route("/directors/{id}", get(get_director))
        .route("/directors/{id}/movies", get(movies_by_director))
        .route("/actors", post(create_actor))
        .route("/actors/{id}", get(get_actor))
        .route("/actors/{id}/movies", get(movies_by_actor))
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/reviews", post(create_review))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Serialize)]
pub struct Data<T> {
    data: T,
}

#[derive(Debug, Serialize)]
pub struct Listing<T> {
    data: Vec<T>,
    pagination: Pagination,
}

#[derive(Debug, Serialize)]
struct Pagination {
    page: u64,
    limit: u64,
    total: u64,
}

impl<T, U: From<T>> From<Page<T>> for Listing<U> {
    fn from(page: Page<T>) -> Self {
        let page = page.map(U::from);
        Self {
            pagination: Pagination { page: page.page, limit: page.limit, total: page.total },
            data: page.items,
        }
    }
}

fn data<T>(data: T) -> Json<Data<T>> {
    Json(Data { data })
}

fn parse_id(raw: &str, entity: &str) -> AppResult<i32> {
    raw.trim().parse().map_err(|_| AppError::validation(format!("invalid {entity} ID format")))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    page: Option<i64>,
    limit: Option<i64>,
    genre_id: Option<i32>,
    director_id: Option<i32>,
    min_rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    title: String,
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TopRatedQuery {
    limit: Option<i64>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "health": "ok", "status": StatusCode::OK.as_u16() }))
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(q), _): AppQuery<ListQuery>,
) -> AppResult<Json<Listing<MovieResponse>>> {
    let filter = MovieFilter {
        genre_id: q.genre_id,
        director_id: q.director_id,
        min_rating: q.min_rating,
        ..Default::default()
    };
    let page = state.movies.list_movies(filter, PageRequest::new(q.page, q.limit)).await?;
    Ok(Json(page.into()))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Data<MovieResponse>>> {
    let movie = state.movies.get_movie(parse_id(&id, "movie")?).await?;
    Ok(data(movie.into()))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): AppJson<CreateMovie>,
) -> AppResult<(StatusCode, Json<Data<MovieResponse>>)> {
    let movie = state.movies.create_movie(req).await?;
    Ok((StatusCode::CREATED, data(movie.into())))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    WithRejection(Json(req), _): AppJson<UpdateMovie>,
) -> AppResult<Json<Data<MovieResponse>>> {
    let movie = state.movies.update_movie(parse_id(&id, "movie")?, &req).await?;
    Ok(data(movie.into()))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    state.movies.delete_movie(parse_id(&id, "movie")?).await?;
    Ok(Json(json!({ "message": "Movie deleted successfully" })))
}

pub async fn search_movies(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(q), _): AppQuery<SearchQuery>,
) -> AppResult<Json<Listing<MovieResponse>>> {
    let page = state.movies.search_movies(&q.title, PageRequest::new(q.page, q.limit)).await?;
    Ok(Json(page.into()))
}

pub async fn top_rated(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(q), _): AppQuery<TopRatedQuery>,
) -> AppResult<Json<Data<Vec<MovieResponse>>>> {
    let movies = state.movies.top_rated(q.limit).await?;
    Ok(data(movies.into_iter().map(Into::into).collect()))
}

pub async fn movies_by_genre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    WithRejection(Query(q), _): AppQuery<PageQuery>,
) -> AppResult<Json<Listing<MovieResponse>>> {
    let page = state
        .movies
        .movies_by_genre(parse_id(&id, "genre")?, PageRequest::new(q.page, q.limit))
        .await?;
    Ok(Json(page.into()))
}

pub async fn movies_by_director(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    WithRejection(Query(q), _): AppQuery<PageQuery>,
) -> AppResult<Json<Listing<MovieResponse>>> {
    let page = state
        .movies
        .movies_by_director(parse_id(&id, "director")?, PageRequest::new(q.page, q.limit))
        .await?;
    Ok(Json(page.into()))
}

pub async fn movies_by_actor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    WithRejection(Query(q), _): AppQuery<PageQuery>,
) -> AppResult<Json<Listing<MovieResponse>>> {
    let page = state
        .movies
        .movies_by_actor(parse_id(&id, "actor")?, PageRequest::new(q.page, q.limit))
        .await?;
    Ok(Json(page.into()))
}

pub async fn list_genres(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Data<Vec<GenreResponse>>>> {
    let genres = state.catalog.list_genres().await?;
    Ok(data(genres.into_iter().map(Into::into).collect()))
}

pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): AppJson<CreateGenre>,
) -> AppResult<(StatusCode, Json<Data<GenreResponse>>)> {
    let genre = state.catalog.create_genre(req).await?;
    Ok((StatusCode::CREATED, data(genre.into())))
}

pub async fn get_genre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Data<GenreResponse>>> {
    let genre = state.catalog.get_genre(parse_id(&id, "genre")?).await?;
    Ok(data(genre.into()))
}

pub async fn create_director(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): AppJson<CreatePerson>,
) -> AppResult<(StatusCode, Json<Data<PersonResponse<DirectorId>>>)> {
    let director = state.catalog.create_director(req).await?;
    Ok((StatusCode::CREATED, data(director.into())))
}

pub async fn get_director(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Data<PersonResponse<DirectorId>>>> {
    let director = state.catalog.get_director(parse_id(&id, "director")?).await?;
    Ok(data(director.into()))
}

pub async fn create_actor(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): AppJson<CreatePerson>,
) -> AppResult<(StatusCode, Json<Data<PersonResponse<ActorId>>>)> {
    let actor = state.catalog.create_actor(req).await?;
    Ok((StatusCode::CREATED, data(actor.into())))
}

pub async fn get_actor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Data<PersonResponse<ActorId>>>> {
    let actor = state.catalog.get_actor(parse_id(&id, "actor")?).await?;
    Ok(data(actor.into()))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): AppJson<CreateUser>,
) -> AppResult<(StatusCode, Json<Data<UserResponse>>)> {
    let user = state.catalog.create_user(req).await?;
    Ok((StatusCode::CREATED, data(user.into())))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Data<UserResponse>>> {
    let user = state.catalog.get_user(parse_id(&id, "user")?).await?;
    Ok(data(user.into()))
}

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): AppJson<CreateReview>,
) -> AppResult<(StatusCode, Json<Data<ReviewResponse>>)> {
    let review = state.catalog.create_review(req).await?;
    Ok((StatusCode::CREATED, data(review.into())))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::db::test_db;

    async fn app() -> Router {
        router(Arc::new(AppState::new(test_db().await)))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header("content-type", "application/json");
                Body::from(json.to_string())
            },
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value =
            if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    fn movie(title: &str, rating: f64) -> Value {
        json!({ "title": title, "release_year": 2010, "duration": 120, "rating": rating })
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "health": "ok", "status": 200 }));
    }

    #[tokio::test]
    async fn movie_lifecycle_maps_to_status_codes() {
        let app = app().await;

        let (status, body) =
            send(&app, Method::POST, "/movies", Some(movie("Inception", 8.8))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_i64().unwrap();
        assert_eq!(body["data"]["title"], "Inception");
        assert_eq!(body["data"]["genre_id"], Value::Null);

        let (status, body) = send(&app, Method::GET, &format!("/movies/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["reviews"], json!([]));

        let (status, body) =
            send(&app, Method::PUT, &format!("/movies/{id}"), Some(json!({ "rating": 9.1 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["rating"], 9.1);
        assert_eq!(body["data"]["title"], "Inception");

        let (status, body) = send(&app, Method::DELETE, &format!("/movies/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Movie deleted successfully");

        let (status, body) = send(&app, Method::GET, &format!("/movies/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "movie not found");
    }

    #[tokio::test]
    async fn validation_failures_are_bad_requests() {
        let app = app().await;

        let (status, body) = send(&app, Method::POST, "/movies", Some(movie("", 5.0))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "movie title is required");

        let (status, body) =
            send(&app, Method::POST, "/movies", Some(json!({ "rating": 7.5 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "movie title is required");

        let (status, body) = send(&app, Method::GET, "/movies/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid movie ID format");

        let (status, _) = send(&app, Method::GET, "/movies?page=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::GET, "/movies/search", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "search title is required");

        let (status, _) = send(
            &app,
            Method::POST,
            "/users",
            Some(json!({ "username": "fan", "email": "not-an-email" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_reports_effective_pagination() {
        let app = app().await;
        for i in 0..3 {
            let body = movie(&format!("Movie {i}"), 5.0 + i as f64);
            send(&app, Method::POST, "/movies", Some(body)).await;
        }

        let (status, body) = send(&app, Method::GET, "/movies?page=0&limit=500", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"], json!({ "page": 1, "limit": 100, "total": 3 }));
        assert_eq!(body["data"].as_array().unwrap().len(), 3);

        let (_, body) =
            send(&app, Method::GET, "/movies?limit=2&page=2&min_rating=5.5", None).await;
        assert_eq!(body["pagination"], json!({ "page": 2, "limit": 2, "total": 2 }));
        assert_eq!(body["data"].as_array().unwrap().len(), 0);

        let uri = format!("/movies?page={}&limit=100", i64::MAX);
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], 3);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn relation_routes_filter_by_reference() {
        let app = app().await;
        let (_, genre) =
            send(&app, Method::POST, "/genres", Some(json!({ "name": "Drama" }))).await;
        let genre_id = genre["data"]["id"].as_i64().unwrap();
        let (_, actor) =
            send(&app, Method::POST, "/actors", Some(json!({ "name": "Emma Stone" }))).await;
        let actor_id = actor["data"]["id"].as_i64().unwrap();

        let mut body = movie("Poor Things", 8.4);
        body["genre_id"] = json!(genre_id);
        body["actor_ids"] = json!([actor_id, actor_id]);
        let (status, created) = send(&app, Method::POST, "/movies", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["genre"]["name"], "Drama");
        assert_eq!(created["data"]["actors"].as_array().unwrap().len(), 1);
        send(&app, Method::POST, "/movies", Some(movie("Heat", 8.3))).await;

        let (_, body) = send(&app, Method::GET, &format!("/genres/{genre_id}/movies"), None).await;
        assert_eq!(body["pagination"]["total"], 1);
        let (_, body) = send(&app, Method::GET, &format!("/actors/{actor_id}/movies"), None).await;
        assert_eq!(body["data"][0]["title"], "Poor Things");
        let (_, body) = send(&app, Method::GET, "/directors/1/movies", None).await;
        assert_eq!(body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn top_rated_and_search_routes() {
        let app = app().await;
        let catalog =
            [("Barbie", 7.0), ("Inception", 8.8), ("Pulp Fiction", 8.9), ("Poor Things", 8.4)];
        for (title, rating) in catalog {
            send(&app, Method::POST, "/movies", Some(movie(title, rating))).await;
        }

        let (status, body) = send(&app, Method::GET, "/movies/top-rated?limit=10", None).await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<_> =
            body["data"].as_array().unwrap().iter().map(|m| m["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["Pulp Fiction", "Inception", "Poor Things", "Barbie"]);

        let (_, body) = send(&app, Method::GET, "/movies/search?title=incep", None).await;
        assert_eq!(body["data"][0]["title"], "Inception");
        assert_eq!(body["pagination"]["total"], 1);

        send(&app, Method::POST, "/movies", Some(movie("Élite Squad", 8.0))).await;
        let (_, body) = send(&app, Method::GET, "/movies/search?title=%C3%A9lite", None).await;
        assert_eq!(body["data"][0]["title"], "Élite Squad");
    }

    #[tokio::test]
    async fn reviews_attach_to_movies() {
        let app = app().await;
        let (_, m) = send(&app, Method::POST, "/movies", Some(movie("Barbie", 7.0))).await;
        let movie_id = m["data"]["id"].as_i64().unwrap();
        let (_, u) = send(
            &app,
            Method::POST,
            "/users",
            Some(json!({ "username": "cinema_fan", "email": "fan@cinema.com" })),
        )
        .await;
        let user_id = u["data"]["id"].as_i64().unwrap();

        let (status, review) = send(
            &app,
            Method::POST,
            "/reviews",
            Some(json!({
                "movie_id": movie_id,
                "user_id": user_id,
                "rating": 7.5,
                "comment": "Funny",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(review["data"]["user"]["username"], "cinema_fan");
        assert_eq!(review["data"]["movie_id"], movie_id);

        let (_, body) = send(&app, Method::GET, &format!("/movies/{movie_id}"), None).await;
        assert_eq!(body["data"]["reviews"][0]["comment"], "Funny");
        assert_eq!(body["data"]["reviews"][0]["user"]["email"], "fan@cinema.com");

        let (status, _) = send(
            &app,
            Method::POST,
            "/reviews",
            Some(json!({ "movie_id": 999, "user_id": user_id, "rating": 7.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
