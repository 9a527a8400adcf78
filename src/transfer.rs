use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{CatalogError, Result};
use crate::storage::MovieStore;
use crate::storage::models::{Movie, NewMovie};

pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupFile {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub data: BackupData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupData {
    pub movies: Vec<Movie>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<BTreeMap<String, String>>,
}

/// Lenient view of one record in an import/legacy file. Anything missing or
/// mistyped makes the record invalid without failing the rest of the file.
#[derive(Debug, Deserialize)]
struct ImportRecord {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    director: Option<String>,
    #[serde(default)]
    poster: Option<String>,
}

impl ImportRecord {
    fn into_new_movie(self) -> Option<NewMovie> {
        Some(NewMovie {
            id: self.id,
            title: self.title?,
            year: self.year?,
            genre: self.genre?,
            director: self.director?,
            poster: self.poster,
        })
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped_invalid: usize,
    pub skipped_duplicate: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub restored: usize,
    pub skipped: usize,
    pub settings_restored: usize,
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("movie-collection-{}.json", date.format("%Y-%m-%d"))
}

pub fn backup_file_name(date: NaiveDate) -> String {
    format!("movie-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Writes the whole collection as a pretty-printed JSON array.
pub fn export(store: &dyn MovieStore, path: &Path) -> Result<usize> {
    let movies = store.get_all()?;
    let body = serde_json::to_string_pretty(&movies)
        .map_err(|e| CatalogError::ImportFormat(e.to_string()))?;
    fs::write(path, body)?;
    Ok(movies.len())
}

/// Adds records from a JSON array file, one at a time. Records missing a
/// required field are dropped; ids already present in the store are skipped.
pub fn import(store: &dyn MovieStore, path: &Path) -> Result<ImportOutcome> {
    let body = fs::read_to_string(path)?;
    let values = parse_array(&body)?;

    let mut outcome = ImportOutcome::default();
    for value in values {
        let Ok(record) = serde_json::from_value::<ImportRecord>(value) else {
            outcome.skipped_invalid += 1;
            continue;
        };
        let Some(movie) = record.into_new_movie() else {
            outcome.skipped_invalid += 1;
            continue;
        };
        if let Some(id) = movie.id {
            if store.get(id)?.is_some() {
                outcome.skipped_duplicate += 1;
                continue;
            }
        }
        match store.add(movie) {
            Ok(_) => outcome.imported += 1,
            Err(e) => {
                eprintln!("skipping record: {}", e);
                outcome.skipped_invalid += 1;
            }
        }
    }
    Ok(outcome)
}

/// Writes a versioned snapshot of both collections.
pub fn backup(store: &dyn MovieStore, path: &Path) -> Result<usize> {
    let movies = store.get_all()?;
    let settings: BTreeMap<String, String> = store
        .settings()?
        .into_iter()
        .map(|s| (s.key, s.value))
        .collect();
    let file = BackupFile {
        version: BACKUP_VERSION,
        timestamp: Utc::now(),
        data: BackupData {
            movies,
            settings: if settings.is_empty() {
                None
            } else {
                Some(settings)
            },
        },
    };
    let body = serde_json::to_string_pretty(&file)
        .map_err(|e| CatalogError::BackupFormat(e.to_string()))?;
    fs::write(path, body)?;
    Ok(file.data.movies.len())
}

/// Replaces the store's contents with a backup snapshot. The store is
/// cleared first, so import-style duplicate skipping does not apply.
pub fn restore(store: &dyn MovieStore, path: &Path) -> Result<RestoreOutcome> {
    let body = fs::read_to_string(path)?;
    let file: BackupFile =
        serde_json::from_str(&body).map_err(|e| CatalogError::BackupFormat(e.to_string()))?;
    if file.version != BACKUP_VERSION {
        return Err(CatalogError::BackupFormat(format!(
            "unsupported backup version {}",
            file.version
        )));
    }

    store.clear_all()?;

    let mut outcome = RestoreOutcome::default();
    for movie in file.data.movies {
        let new = NewMovie {
            id: Some(movie.id),
            title: movie.title,
            year: movie.year,
            genre: movie.genre,
            director: movie.director,
            poster: movie.poster,
        };
        match store.add(new) {
            Ok(_) => outcome.restored += 1,
            Err(e) => {
                eprintln!("skipping record: {}", e);
                outcome.skipped += 1;
            }
        }
    }
    if let Some(settings) = file.data.settings {
        for (key, value) in settings {
            store.save_setting(&key, &value)?;
            outcome.settings_restored += 1;
        }
    }
    Ok(outcome)
}

/// One-shot migration from the old flat JSON store. Only runs against an
/// empty collection; the legacy file is deleted afterwards even when some
/// records fail to carry over.
pub fn migrate_legacy(store: &dyn MovieStore, legacy_path: &Path) -> Result<Option<usize>> {
    if !legacy_path.exists() {
        return Ok(None);
    }
    if !store.get_all()?.is_empty() {
        return Ok(None);
    }

    let migrated = match fs::read_to_string(legacy_path)
        .map_err(CatalogError::from)
        .and_then(|body| parse_array(&body))
    {
        Ok(values) => {
            let mut count = 0;
            for value in values {
                let movie = serde_json::from_value::<ImportRecord>(value)
                    .ok()
                    .and_then(ImportRecord::into_new_movie);
                let Some(movie) = movie else { continue };
                match store.add(movie) {
                    Ok(_) => count += 1,
                    Err(e) => eprintln!("skipping legacy record: {}", e),
                }
            }
            count
        }
        Err(e) => {
            eprintln!("legacy store unreadable: {}", e);
            0
        }
    };

    match fs::remove_file(legacy_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(Some(migrated))
}

fn parse_array(body: &str) -> Result<Vec<serde_json::Value>> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| CatalogError::ImportFormat(e.to_string()))?;
    match value {
        serde_json::Value::Array(values) => Ok(values),
        _ => Err(CatalogError::ImportFormat(
            "expected a JSON array of movies".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::SqliteStorage;

    fn test_storage() -> SqliteStorage {
        SqliteStorage::in_memory().unwrap()
    }

    fn seed(store: &SqliteStorage) {
        for (id, title, year, genre, director) in [
            (1, "Inception", 2010, "Sci-Fi", "Christopher Nolan"),
            (2, "Heat", 1995, "Crime", "Michael Mann"),
        ] {
            store
                .add(NewMovie {
                    id: Some(id),
                    title: title.to_string(),
                    year,
                    genre: genre.to_string(),
                    director: director.to_string(),
                    poster: None,
                })
                .unwrap();
        }
    }

    #[test]
    fn test_file_names() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert_eq!(export_file_name(date), "movie-collection-2026-08-29.json");
        assert_eq!(backup_file_name(date), "movie-backup-2026-08-29.json");
    }

    #[test]
    fn test_export_then_import_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.json");

        let source = test_storage();
        seed(&source);
        assert_eq!(export(&source, &path).unwrap(), 2);

        let target = test_storage();
        let outcome = import(&target, &path).unwrap();
        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.skipped_invalid, 0);

        let original = source.get_all().unwrap();
        let restored = target.get_all().unwrap();
        for (a, b) in original.iter().zip(&restored) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.title, b.title);
            assert_eq!(a.year, b.year);
            assert_eq!(a.genre, b.genre);
            assert_eq!(a.director, b.director);
        }
    }

    #[test]
    fn test_import_drops_incomplete_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        std::fs::write(
            &path,
            r#"[
                {"title": "Heat", "year": 1995, "genre": "Crime", "director": "Michael Mann"},
                {"title": "No Year", "genre": "Drama", "director": "Someone"},
                {"title": "Bad Year", "year": "nineteen", "genre": "Drama", "director": "Someone"}
            ]"#,
        )
        .unwrap();

        let store = test_storage();
        let outcome = import(&store, &path).unwrap();
        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.skipped_invalid, 2);
        assert_eq!(store.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_import_skips_existing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        std::fs::write(
            &path,
            r#"[
                {"id": 1, "title": "Inception Again", "year": 2010, "genre": "Sci-Fi", "director": "Christopher Nolan"},
                {"id": 3, "title": "Alien", "year": 1979, "genre": "Horror", "director": "Ridley Scott"}
            ]"#,
        )
        .unwrap();

        let store = test_storage();
        seed(&store);
        let outcome = import(&store, &path).unwrap();
        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.skipped_duplicate, 1);
        // The existing record was not overwritten.
        assert_eq!(store.get(1).unwrap().unwrap().title, "Inception");
    }

    #[test]
    fn test_import_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        std::fs::write(&path, r#"{"movies": []}"#).unwrap();
        let store = test_storage();
        assert!(matches!(
            import(&store, &path),
            Err(CatalogError::ImportFormat(_))
        ));
    }

    #[test]
    fn test_import_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        std::fs::write(&path, "not json").unwrap();
        let store = test_storage();
        assert!(matches!(
            import(&store, &path),
            Err(CatalogError::ImportFormat(_))
        ));
    }

    #[test]
    fn test_backup_then_restore_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let source = test_storage();
        seed(&source);
        source.save_setting("theme", "dark").unwrap();
        assert_eq!(backup(&source, &path).unwrap(), 2);

        let target = test_storage();
        // Pre-existing contents are replaced, not merged.
        target
            .add(NewMovie {
                id: Some(99),
                title: "Stale".to_string(),
                year: 1990,
                genre: "Drama".to_string(),
                director: "Nobody".to_string(),
                poster: None,
            })
            .unwrap();

        let outcome = restore(&target, &path).unwrap();
        assert_eq!(outcome.restored, 2);
        assert_eq!(outcome.settings_restored, 1);
        assert!(target.get(99).unwrap().is_none());
        assert_eq!(target.get(1).unwrap().unwrap().title, "Inception");
        assert_eq!(target.get_setting("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_restore_rejects_wrong_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        std::fs::write(&path, r#"[{"id": 1}]"#).unwrap();
        let store = test_storage();
        assert!(matches!(
            restore(&store, &path),
            Err(CatalogError::BackupFormat(_))
        ));
    }

    #[test]
    fn test_restore_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        std::fs::write(
            &path,
            r#"{"version": 2, "timestamp": "2026-08-29T00:00:00Z", "data": {"movies": []}}"#,
        )
        .unwrap();
        let store = test_storage();
        let err = restore(&store, &path).unwrap_err();
        assert!(matches!(err, CatalogError::BackupFormat(_)));
        assert!(err.to_string().contains("version 2"));
    }

    #[test]
    fn test_migrate_legacy_runs_once_and_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        std::fs::write(
            &path,
            r#"[
                {"title": "Heat", "year": 1995, "genre": "Crime", "director": "Michael Mann"},
                {"title": "Broken"}
            ]"#,
        )
        .unwrap();

        let store = test_storage();
        assert_eq!(migrate_legacy(&store, &path).unwrap(), Some(1));
        assert!(!path.exists());
        assert_eq!(store.get_all().unwrap().len(), 1);

        // Second run is a no-op.
        assert_eq!(migrate_legacy(&store, &path).unwrap(), None);
    }

    #[test]
    fn test_migrate_legacy_skips_populated_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        std::fs::write(
            &path,
            r#"[{"title": "Heat", "year": 1995, "genre": "Crime", "director": "Michael Mann"}]"#,
        )
        .unwrap();

        let store = test_storage();
        seed(&store);
        assert_eq!(migrate_legacy(&store, &path).unwrap(), None);
        // The file stays put for a later empty store.
        assert!(path.exists());
        assert_eq!(store.get_all().unwrap().len(), 2);
    }

    #[test]
    fn test_migrate_legacy_deletes_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        std::fs::write(&path, "not json").unwrap();

        let store = test_storage();
        assert_eq!(migrate_legacy(&store, &path).unwrap(), Some(0));
        assert!(!path.exists());
    }
}
