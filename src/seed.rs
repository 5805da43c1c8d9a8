//! Sample catalog for a fresh database.

use tracing::info;

use crate::{
    catalog::CatalogService,
    error::AppResult,
    models::{
        ActorId, CreateGenre, CreateMovie, CreatePerson, CreateReview, CreateUser, DirectorId,
        GenreId, MovieId, UserId,
    },
    service::MovieService,
};

const GENRES: &[(&str, &str)] = &[
    ("Action", "Action and adventure movies"),
    ("Comedy", "Funny and entertaining movies"),
    ("Drama", "Dramatic movies"),
    ("Horror", "Horror and suspense movies"),
    ("Science Fiction", "Science fiction movies"),
    ("Romance", "Romantic movies"),
];

const DIRECTORS: &[(&str, &str, &str)] = &[
    (
        "Christopher Nolan",
        "British director known for Inception, Interstellar and The Dark Knight",
        "British",
    ),
    ("Quentin Tarantino", "American director known for Pulp Fiction and Kill Bill", "American"),
    ("Greta Gerwig", "American director known for Lady Bird and Barbie", "American"),
];

const ACTORS: &[(&str, &str, &str)] = &[
    ("Leonardo DiCaprio", "American actor and Oscar winner", "American"),
    ("Margot Robbie", "Australian actress known for Barbie and Suicide Squad", "Australian"),
    ("Tom Hardy", "British actor known for Mad Max and Venom", "British"),
    ("Emma Stone", "American actress and Oscar winner", "American"),
];

const USERS: &[(&str, &str)] = &[
    ("movie_lover", "lover@movies.com"),
    ("cinema_fan", "fan@cinema.com"),
    ("film_critic", "critic@films.com"),
];

struct SeedMovie {
    title: &'static str,
    description: &'static str,
    release_year: i32,
    duration: i32,
    rating: f64,
    slug: &'static str,
    genre: usize,
    director: usize,
    actors: &'static [usize],
}

const MOVIES: &[SeedMovie] = &[
    SeedMovie {
        title: "Inception",
        description: "A thief who steals corporate secrets through the use of dream-sharing technology is given the inverse task of planting an idea into the mind of a C.E.O.",
        release_year: 2010,
        duration: 148,
        rating: 8.8,
        slug: "inception",
        genre: 4,
        director: 0,
        actors: &[0, 2],
    },
    SeedMovie {
        title: "Barbie",
        description: "Barbie suffers an existential crisis and travels to the real world to find true happiness.",
        release_year: 2023,
        duration: 114,
        rating: 7.0,
        slug: "barbie",
        genre: 1,
        director: 2,
        actors: &[1],
    },
    SeedMovie {
        title: "Pulp Fiction",
        description: "The lives of two mob hitmen, a boxer, a gangster and his wife, and a pair of diner bandits intertwine in four tales of violence and redemption.",
        release_year: 1994,
        duration: 154,
        rating: 8.9,
        slug: "pulp-fiction",
        genre: 0,
        director: 1,
        actors: &[0],
    },
    SeedMovie {
        title: "Poor Things",
        description: "The incredible evolution of Bella Baxter, a young woman brought back to life by the brilliant and unorthodox scientist Dr. Godwin Baxter.",
        release_year: 2023,
        duration: 141,
        rating: 8.4,
        slug: "poor-things",
        genre: 2,
        director: 2,
        actors: &[3],
    },
];

/// (movie, user, rating, comment)
const REVIEWS: &[(usize, usize, f64, &str)] = &[
    (0, 0, 9.0, "A masterpiece of cinema. Nolan never disappoints."),
    (1, 1, 7.5, "Funny and with an important message. Margot Robbie is incredible."),
    (2, 2, 9.5, "Absolute classic. Tarantino at his best."),
];

/// Inserts the sample catalog unless genres already exist. Returns whether it ran.
pub async fn seed_if_empty(catalog: &CatalogService, movies: &MovieService) -> AppResult<bool> {
    if !catalog.list_genres().await?.is_empty() {
        return Ok(false);
    }

    let mut genres = Vec::with_capacity(GENRES.len());
    for (name, description) in GENRES {
        let req = CreateGenre { name: name.to_string(), description: description.to_string() };
        genres.push(catalog.create_genre(req).await?.id);
    }

    let mut directors = Vec::with_capacity(DIRECTORS.len());
    for (name, biography, nationality) in DIRECTORS {
        directors.push(catalog.create_director(person(name, biography, nationality)).await?.id);
    }

    let mut actors = Vec::with_capacity(ACTORS.len());
    for (name, biography, nationality) in ACTORS {
        actors.push(catalog.create_actor(person(name, biography, nationality)).await?.id);
    }

    let mut users = Vec::with_capacity(USERS.len());
    for (username, email) in USERS {
        let req = CreateUser { username: username.to_string(), email: email.to_string() };
        users.push(catalog.create_user(req).await?.id);
    }

    let mut created = Vec::with_capacity(MOVIES.len());
    for m in MOVIES {
        let req = CreateMovie {
            title: m.title.to_string(),
            description: m.description.to_string(),
            release_year: m.release_year,
            duration: m.duration,
            rating: m.rating,
            poster_url: format!("https://example.com/{}.jpg", m.slug),
            trailer_url: format!("https://example.com/{}-trailer.mp4", m.slug),
            genre_id: Some(GenreId(genres[m.genre])),
            director_id: Some(DirectorId(directors[m.director])),
            actor_ids: m.actors.iter().map(|&i| ActorId(actors[i])).collect(),
        };
        created.push(movies.create_movie(req).await?.movie.id);
    }

    for &(movie, user, rating, comment) in REVIEWS {
        let req = CreateReview {
            movie_id: MovieId(created[movie]),
            user_id: UserId(users[user]),
            rating,
            comment: comment.to_string(),
        };
        catalog.create_review(req).await?;
    }

    info!(
        genres = genres.len(),
        directors = directors.len(),
        actors = actors.len(),
        users = users.len(),
        movies = created.len(),
        reviews = REVIEWS.len(),
        "database seeded with sample movie data"
    );
    Ok(true)
}

fn person(name: &str, biography: &str, nationality: &str) -> CreatePerson {
    CreatePerson {
        name: name.to_string(),
        biography: biography.to_string(),
        birth_date: None,
        nationality: nationality.to_string(),
    }
}
