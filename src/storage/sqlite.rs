use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::MovieStore;
use super::models::{Movie, MovieFilter, MovieUpdate, NewMovie, Setting, SortKey};
use super::schema;
use crate::errors::{CatalogError, Result};

const BASE_SELECT: &str = "
    SELECT id, title, year, genre, director, poster, created_at, updated_at
    FROM movies
";

pub struct SqliteStorage {
    conn: Connection,
}

fn row_to_movie(row: &Row) -> rusqlite::Result<Movie> {
    Ok(Movie {
        id: row.get(0)?,
        title: row.get(1)?,
        year: row.get(2)?,
        genre: row.get(3)?,
        director: row.get(4)?,
        poster: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn row_to_setting(row: &Row) -> rusqlite::Result<Setting> {
    Ok(Setting {
        key: row.get(0)?,
        value: row.get(1)?,
        updated_at: row.get(2)?,
    })
}

fn map_write_err(e: rusqlite::Error, id: i64) -> CatalogError {
    match e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            CatalogError::DuplicateId(id)
        }
        rusqlite::Error::SqliteFailure(f, _) if f.code == rusqlite::ErrorCode::DiskFull => {
            CatalogError::QuotaExceeded
        }
        other => CatalogError::Storage(other),
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn sort_movies(movies: &mut [Movie], sort: SortKey) {
    // Vec sorts are stable, so ties keep their pre-sort order.
    match sort {
        SortKey::TitleAsc => {
            movies.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        }
        SortKey::TitleDesc => {
            movies.sort_by(|a, b| b.title.to_lowercase().cmp(&a.title.to_lowercase()))
        }
        SortKey::YearAsc => movies.sort_by_key(|m| m.year),
        SortKey::YearDesc => movies.sort_by_key(|m| std::cmp::Reverse(m.year)),
        SortKey::CreatedAsc => movies.sort_by_key(|m| m.created_at),
        SortKey::CreatedDesc => movies.sort_by_key(|m| std::cmp::Reverse(m.created_at)),
    }
}

impl SqliteStorage {
    pub fn new(conn: Connection) -> Result<Self> {
        conn.execute(schema::CREATE_MOVIES_TABLE, [])?;
        conn.execute(schema::CREATE_SETTINGS_TABLE, [])?;
        conn.execute(schema::CREATE_INDEX_TITLE, [])?;
        conn.execute(schema::CREATE_INDEX_YEAR, [])?;
        conn.execute(schema::CREATE_INDEX_GENRE, [])?;
        conn.execute(schema::CREATE_INDEX_DIRECTOR, [])?;
        conn.execute(schema::CREATE_INDEX_CREATED_AT, [])?;
        Ok(Self { conn })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        Self::new(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        Self::new(conn)
    }

    fn id_exists(&self, id: i64) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM movies WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    /// Millisecond-clock ids collide when two movies are added inside the
    /// same millisecond, so probe forward past occupied ids.
    fn next_free_id(&self) -> Result<i64> {
        let mut id = Utc::now().timestamp_millis();
        while self.id_exists(id)? {
            id += 1;
        }
        Ok(id)
    }

    #[cfg(test)]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl MovieStore for SqliteStorage {
    fn add(&self, movie: NewMovie) -> Result<Movie> {
        require_non_empty("title", &movie.title)?;
        require_non_empty("genre", &movie.genre)?;
        require_non_empty("director", &movie.director)?;

        let id = match movie.id {
            Some(id) => id,
            None => self.next_free_id()?,
        };
        let now = Utc::now();
        self.conn
            .execute(
                "INSERT INTO movies (id, title, year, genre, director, poster, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    movie.title,
                    movie.year,
                    movie.genre,
                    movie.director,
                    movie.poster,
                    now,
                    now,
                ],
            )
            .map_err(|e| map_write_err(e, id))?;
        self.get(id)?
            .ok_or_else(|| CatalogError::NotFound(format!("Movie with id {} not found", id)))
    }

    fn get(&self, id: i64) -> Result<Option<Movie>> {
        let sql = format!("{} WHERE id = ?", BASE_SELECT);
        let movie = self
            .conn
            .query_row(&sql, params![id], row_to_movie)
            .optional()?;
        Ok(movie)
    }

    fn get_all(&self) -> Result<Vec<Movie>> {
        let sql = format!("{} ORDER BY id ASC", BASE_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let movies = stmt
            .query_map([], row_to_movie)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(movies)
    }

    fn update(&self, id: i64, changes: MovieUpdate) -> Result<Movie> {
        if let Some(ref title) = changes.title {
            require_non_empty("title", title)?;
        }
        if let Some(ref genre) = changes.genre {
            require_non_empty("genre", genre)?;
        }
        if let Some(ref director) = changes.director {
            require_non_empty("director", director)?;
        }

        // Single statement instead of read-merge-write; COALESCE keeps any
        // field the caller left unset.
        let changed = self
            .conn
            .execute(
                "UPDATE movies SET
                     title = COALESCE(?, title),
                     year = COALESCE(?, year),
                     genre = COALESCE(?, genre),
                     director = COALESCE(?, director),
                     poster = COALESCE(?, poster),
                     updated_at = ?
                 WHERE id = ?",
                params![
                    changes.title,
                    changes.year,
                    changes.genre,
                    changes.director,
                    changes.poster,
                    Utc::now(),
                    id,
                ],
            )
            .map_err(CatalogError::Storage)?;
        if changed == 0 {
            return Err(CatalogError::NotFound(format!(
                "Movie with id {} not found",
                id
            )));
        }
        self.get(id)?
            .ok_or_else(|| CatalogError::NotFound(format!("Movie with id {} not found", id)))
    }

    fn remove(&self, id: i64) -> Result<bool> {
        let changes = self
            .conn
            .execute("DELETE FROM movies WHERE id = ?", params![id])?;
        Ok(changes > 0)
    }

    fn query(&self, filter: &MovieFilter) -> Result<Vec<Movie>> {
        // Full scan over the collection; the catalog tops out at a few
        // thousand rows, all resident in SQLite's page cache anyway.
        let mut movies = self.get_all()?;

        if let Some(ref search) = filter.search {
            let needle = search.to_lowercase();
            movies.retain(|m| {
                m.title.to_lowercase().contains(&needle)
                    || m.genre.to_lowercase().contains(&needle)
                    || m.director.to_lowercase().contains(&needle)
            });
        }
        if let Some(ref genre) = filter.genre {
            if !genre.eq_ignore_ascii_case("all") {
                let needle = genre.to_lowercase();
                movies.retain(|m| m.genre.to_lowercase().contains(&needle));
            }
        }
        if let Some(year) = filter.year {
            movies.retain(|m| m.year == year);
        }
        if let Some((from, to)) = filter.year_range {
            movies.retain(|m| m.year >= from && m.year <= to);
        }
        if let Some(ref director) = filter.director {
            let needle = director.to_lowercase();
            movies.retain(|m| m.director.to_lowercase().contains(&needle));
        }
        if let Some(sort) = filter.sort {
            sort_movies(&mut movies, sort);
        }
        if let Some(limit) = filter.effective_limit() {
            let offset = filter.offset.unwrap_or(0).max(0) as usize;
            movies = movies
                .into_iter()
                .skip(offset)
                .take(limit as usize)
                .collect();
        }
        Ok(movies)
    }

    fn save_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at",
            params![key, value, Utc::now()],
        )?;
        Ok(())
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn settings(&self) -> Result<Vec<Setting>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value, updated_at FROM settings ORDER BY key ASC")?;
        let settings = stmt
            .query_map([], row_to_setting)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(settings)
    }

    fn clear_all(&self) -> Result<()> {
        // Both collections empty out together or not at all.
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM movies", [])?;
        tx.execute("DELETE FROM settings", [])?;
        tx.commit()?;
        Ok(())
    }
}
