use futures::future::try_join;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;

use crate::pagination::PageRequest;

use super::contains_pattern;

#[derive(Debug, Clone, FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration: i32,
}

/// Movie with its genre names and actor full names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration: i32,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
}

/// Case-insensitive substring filters for the movie list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFilter {
    pub title: Option<String>,
    pub genres: Option<String>,
    pub actors: Option<String>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &MovieFilter) {
    qb.push(" WHERE TRUE");
    if let Some(title) = &filter.title {
        qb.push(" AND m.title ILIKE ").push_bind(contains_pattern(title));
    }
    if let Some(genre) = &filter.genres {
        qb.push(
            " AND EXISTS (SELECT 1 FROM movie_genres mg \
             JOIN genres g ON g.id = mg.genre_id \
             WHERE mg.movie_id = m.id AND g.name ILIKE ",
        )
        .push_bind(contains_pattern(genre))
        .push(")");
    }
    if let Some(actor) = &filter.actors {
        qb.push(
            " AND EXISTS (SELECT 1 FROM movie_actors ma \
             JOIN actors a ON a.id = ma.actor_id \
             WHERE ma.movie_id = m.id AND (a.first_name || ' ' || a.last_name) ILIKE ",
        )
        .push_bind(contains_pattern(actor))
        .push(")");
    }
}

impl Movie {
    pub async fn count(pool: &PgPool, filter: &MovieFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM movies m");
        push_filters(&mut qb, filter);
        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &MovieFilter,
        page: &PageRequest,
    ) -> Result<Vec<MovieSummary>, sqlx::Error> {
        let mut qb = QueryBuilder::new("SELECT m.id, m.title, m.description, m.duration FROM movies m");
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY m.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let movies = qb.build_query_as::<Movie>().fetch_all(pool).await?;
        Self::with_names(pool, movies).await
    }

    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<MovieSummary>, sqlx::Error> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT id, title, description, duration FROM movies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match movie {
            Some(movie) => Ok(Self::with_names(pool, vec![movie]).await?.pop()),
            None => Ok(None),
        }
    }

    // Attaches genre and actor names, preserving the order of `movies`
    async fn with_names(pool: &PgPool, movies: Vec<Movie>) -> Result<Vec<MovieSummary>, sqlx::Error> {
        if movies.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = movies.iter().map(|m| m.id).collect();

        let genres = sqlx::query_as::<_, (i64, String)>(
            "SELECT mg.movie_id, g.name
             FROM movie_genres mg
             JOIN genres g ON g.id = mg.genre_id
             WHERE mg.movie_id = ANY($1)
             ORDER BY g.name",
        )
        .bind(&ids)
        .fetch_all(pool);

        let actors = sqlx::query_as::<_, (i64, String)>(
            "SELECT ma.movie_id, a.first_name || ' ' || a.last_name
             FROM movie_actors ma
             JOIN actors a ON a.id = ma.actor_id
             WHERE ma.movie_id = ANY($1)
             ORDER BY a.last_name, a.first_name",
        )
        .bind(&ids)
        .fetch_all(pool);

        let (genres, actors) = try_join(genres, actors).await?;
        let mut genres = group_names(genres);
        let mut actors = group_names(actors);

        Ok(movies
            .into_iter()
            .map(|m| MovieSummary {
                genres: genres.remove(&m.id).unwrap_or_default(),
                actors: actors.remove(&m.id).unwrap_or_default(),
                id: m.id,
                title: m.title,
                description: m.description,
                duration: m.duration,
            })
            .collect())
    }
}

fn group_names(rows: Vec<(i64, String)>) -> HashMap<i64, Vec<String>> {
    let mut map: HashMap<i64, Vec<String>> = HashMap::new();
    for (movie_id, name) in rows {
        map.entry(movie_id).or_default().push(name);
    }
    map
}
