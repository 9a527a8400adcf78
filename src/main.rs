use std::path::{Path, PathBuf};
use std::process;

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;

use cinelog::config::AppPaths;
use cinelog::errors::CatalogError;
use cinelog::storage::MovieStore;
use cinelog::storage::models::{Movie, MovieFilter, MovieUpdate, NewMovie, SortKey};
use cinelog::storage::sqlite::SqliteStorage;
use cinelog::transfer;

#[derive(Parser)]
#[command(name = "cinelog", version, about = "A local movie-collection catalog")]
struct Cli {
    /// Output results as JSON
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List movies, optionally filtered and sorted
    List {
        /// Substring match over title, genre, and director
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by genre ("all" disables the filter)
        #[arg(short, long)]
        genre: Option<String>,

        /// Filter by exact release year
        #[arg(short, long)]
        year: Option<i32>,

        /// Lower bound of a release-year range (inclusive)
        #[arg(long)]
        year_from: Option<i32>,

        /// Upper bound of a release-year range (inclusive)
        #[arg(long)]
        year_to: Option<i32>,

        /// Filter by director
        #[arg(short, long)]
        director: Option<String>,

        /// Sort order: title-asc, title-desc, year-asc, year-desc, created-asc, created-desc
        #[arg(long)]
        sort: Option<String>,

        /// Maximum number of movies to show
        #[arg(short, long)]
        limit: Option<i64>,

        /// Offset for pagination
        #[arg(short, long)]
        offset: Option<i64>,
    },

    /// Show a specific movie by ID
    Get {
        /// Movie ID
        id: i64,
    },

    /// Add a movie to the collection
    Add {
        /// Movie title
        title: String,

        /// Release year
        #[arg(short, long)]
        year: i32,

        /// Genre, comma-separated for multiple
        #[arg(short, long)]
        genre: String,

        /// Director
        #[arg(short, long)]
        director: String,

        /// Poster URL
        #[arg(short, long)]
        poster: Option<String>,

        /// Use a specific ID instead of one derived from the clock
        #[arg(long)]
        id: Option<i64>,
    },

    /// Edit fields of an existing movie
    Edit {
        /// Movie ID
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        year: Option<i32>,

        #[arg(short, long)]
        genre: Option<String>,

        #[arg(short, long)]
        director: Option<String>,

        #[arg(short, long)]
        poster: Option<String>,
    },

    /// Delete a movie
    Delete {
        /// Movie ID
        id: i64,
    },

    /// Export the collection as a JSON array
    Export {
        /// Output file (defaults to movie-collection-<date>.json)
        file: Option<PathBuf>,
    },

    /// Import movies from a JSON array file
    Import {
        /// Input file
        file: PathBuf,
    },

    /// Write a full backup of movies and settings
    Backup {
        /// Output file (defaults to movie-backup-<date>.json)
        file: Option<PathBuf>,
    },

    /// Replace the collection with a backup's contents
    Restore {
        /// Backup file
        file: PathBuf,
    },

    /// Delete every movie and setting
    Clear {
        /// Actually do it
        #[arg(long)]
        force: bool,
    },

    /// Read or write a setting
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Interactive TUI browser
    Tui,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print a setting's value
    Get { key: String },
    /// Set a setting
    Set { key: String, value: String },
}

#[derive(Serialize)]
struct StatusResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
}

fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        if json {
            eprintln!("{}", serde_json::json!({"error": e.to_string()}));
        } else {
            eprintln!("error: {}", e);
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> cinelog::errors::Result<()> {
    let paths = AppPaths::new();
    let json = cli.json;

    match cli.command {
        None => cmd_list(&paths, MovieFilter::default(), json),
        Some(Commands::List {
            search,
            genre,
            year,
            year_from,
            year_to,
            director,
            sort,
            limit,
            offset,
        }) => {
            let sort = sort.as_deref().and_then(|name| {
                let parsed = SortKey::parse(name);
                if parsed.is_none() {
                    eprintln!("unrecognized sort \"{}\", leaving order unchanged", name);
                }
                parsed
            });
            let year_range = match (year_from, year_to) {
                (None, None) => None,
                (from, to) => Some((from.unwrap_or(i32::MIN), to.unwrap_or(i32::MAX))),
            };
            cmd_list(
                &paths,
                MovieFilter {
                    search,
                    genre,
                    year,
                    year_range,
                    director,
                    sort,
                    limit,
                    offset,
                },
                json,
            )
        }
        Some(Commands::Get { id }) => cmd_get(&paths, id, json),
        Some(Commands::Add {
            title,
            year,
            genre,
            director,
            poster,
            id,
        }) => cmd_add(
            &paths,
            NewMovie {
                id,
                title,
                year,
                genre,
                director,
                poster,
            },
            json,
        ),
        Some(Commands::Edit {
            id,
            title,
            year,
            genre,
            director,
            poster,
        }) => cmd_edit(
            &paths,
            id,
            MovieUpdate {
                title,
                year,
                genre,
                director,
                poster,
            },
            json,
        ),
        Some(Commands::Delete { id }) => cmd_delete(&paths, id, json),
        Some(Commands::Export { file }) => cmd_export(&paths, file, json),
        Some(Commands::Import { file }) => cmd_import(&paths, &file, json),
        Some(Commands::Backup { file }) => cmd_backup(&paths, file, json),
        Some(Commands::Restore { file }) => cmd_restore(&paths, &file, json),
        Some(Commands::Clear { force }) => cmd_clear(&paths, force, json),
        Some(Commands::Config { action }) => cmd_config(&paths, action, json),
        Some(Commands::Tui) => cinelog::tui::run(&paths),
    }
}

fn open_storage(paths: &AppPaths) -> cinelog::errors::Result<SqliteStorage> {
    std::fs::create_dir_all(&paths.base_dir)?;
    let storage = SqliteStorage::open(&paths.db_path)?;
    if let Some(count) = transfer::migrate_legacy(&storage, &paths.legacy_path)? {
        eprintln!("Migrated {} movie(s) from the legacy store.", count);
    }
    Ok(storage)
}

fn print_status(response: StatusResponse, json: bool) {
    if json {
        println!("{}", serde_json::to_string(&response).unwrap());
    } else {
        println!("{}", response.message);
    }
}

fn cmd_list(paths: &AppPaths, filter: MovieFilter, json: bool) -> cinelog::errors::Result<()> {
    let storage = open_storage(paths)?;
    let movies = storage.query(&filter)?;

    if json {
        println!("{}", serde_json::to_string(&movies).unwrap());
        return Ok(());
    }

    if movies.is_empty() {
        println!("No movies found.");
        return Ok(());
    }

    for movie in &movies {
        print_movie_row(movie);
    }
    Ok(())
}

fn cmd_get(paths: &AppPaths, id: i64, json: bool) -> cinelog::errors::Result<()> {
    let storage = open_storage(paths)?;
    let movie = storage
        .get(id)?
        .ok_or_else(|| CatalogError::NotFound(format!("Movie with id {} not found", id)))?;

    if json {
        println!("{}", serde_json::to_string(&movie).unwrap());
        return Ok(());
    }

    print_movie_detail(&movie);
    Ok(())
}

fn cmd_add(paths: &AppPaths, movie: NewMovie, json: bool) -> cinelog::errors::Result<()> {
    let storage = open_storage(paths)?;
    let added = storage.add(movie)?;

    if json {
        println!("{}", serde_json::to_string(&added).unwrap());
        return Ok(());
    }

    println!("Added \"{}\" (#{}).", added.title, added.id);
    Ok(())
}

fn cmd_edit(
    paths: &AppPaths,
    id: i64,
    changes: MovieUpdate,
    json: bool,
) -> cinelog::errors::Result<()> {
    if changes.is_empty() {
        return Err(CatalogError::Validation("no fields to change".to_string()));
    }
    let storage = open_storage(paths)?;
    let updated = storage.update(id, changes)?;

    if json {
        println!("{}", serde_json::to_string(&updated).unwrap());
        return Ok(());
    }

    println!("Updated \"{}\" (#{}).", updated.title, updated.id);
    Ok(())
}

fn cmd_delete(paths: &AppPaths, id: i64, json: bool) -> cinelog::errors::Result<()> {
    let storage = open_storage(paths)?;
    let found = storage.remove(id)?;
    let message = if found {
        format!("Deleted movie #{}.", id)
    } else {
        format!("Movie #{} not found.", id)
    };

    print_status(
        StatusResponse {
            success: found,
            message,
            count: None,
        },
        json,
    );
    Ok(())
}

fn cmd_export(
    paths: &AppPaths,
    file: Option<PathBuf>,
    json: bool,
) -> cinelog::errors::Result<()> {
    let storage = open_storage(paths)?;
    let file =
        file.unwrap_or_else(|| PathBuf::from(transfer::export_file_name(Utc::now().date_naive())));
    let count = transfer::export(&storage, &file)?;

    print_status(
        StatusResponse {
            success: true,
            message: format!("Exported {} movie(s) to {}.", count, file.display()),
            count: Some(count),
        },
        json,
    );
    Ok(())
}

fn cmd_import(paths: &AppPaths, file: &Path, json: bool) -> cinelog::errors::Result<()> {
    let storage = open_storage(paths)?;
    let outcome = transfer::import(&storage, file)?;

    print_status(
        StatusResponse {
            success: true,
            message: format!(
                "Imported {} movie(s) ({} invalid, {} duplicate).",
                outcome.imported, outcome.skipped_invalid, outcome.skipped_duplicate
            ),
            count: Some(outcome.imported),
        },
        json,
    );
    Ok(())
}

fn cmd_backup(
    paths: &AppPaths,
    file: Option<PathBuf>,
    json: bool,
) -> cinelog::errors::Result<()> {
    let storage = open_storage(paths)?;
    let file =
        file.unwrap_or_else(|| PathBuf::from(transfer::backup_file_name(Utc::now().date_naive())));
    let count = transfer::backup(&storage, &file)?;

    print_status(
        StatusResponse {
            success: true,
            message: format!("Backed up {} movie(s) to {}.", count, file.display()),
            count: Some(count),
        },
        json,
    );
    Ok(())
}

fn cmd_restore(paths: &AppPaths, file: &Path, json: bool) -> cinelog::errors::Result<()> {
    let storage = open_storage(paths)?;
    let outcome = transfer::restore(&storage, file)?;

    print_status(
        StatusResponse {
            success: true,
            message: format!(
                "Restored {} movie(s) and {} setting(s) ({} skipped).",
                outcome.restored, outcome.settings_restored, outcome.skipped
            ),
            count: Some(outcome.restored),
        },
        json,
    );
    Ok(())
}

fn cmd_clear(paths: &AppPaths, force: bool, json: bool) -> cinelog::errors::Result<()> {
    if !force {
        print_status(
            StatusResponse {
                success: false,
                message: "This deletes every movie and setting; pass --force to proceed."
                    .to_string(),
                count: None,
            },
            json,
        );
        return Ok(());
    }

    let storage = open_storage(paths)?;
    let count = storage.get_all()?.len();
    storage.clear_all()?;

    print_status(
        StatusResponse {
            success: true,
            message: format!("Cleared {} movie(s) and all settings.", count),
            count: Some(count),
        },
        json,
    );
    Ok(())
}

fn cmd_config(paths: &AppPaths, action: ConfigAction, json: bool) -> cinelog::errors::Result<()> {
    let storage = open_storage(paths)?;
    match action {
        ConfigAction::Get { key } => match storage.get_setting(&key)? {
            Some(value) => {
                if json {
                    println!("{}", serde_json::json!({"key": key, "value": value}));
                } else {
                    println!("{}", value);
                }
            }
            None => {
                if json {
                    println!("{}", serde_json::json!({"key": key, "value": null}));
                } else {
                    println!("{} is not set.", key);
                }
            }
        },
        ConfigAction::Set { key, value } => {
            storage.save_setting(&key, &value)?;
            // Read back the committed value rather than echoing the input.
            let stored = storage.get_setting(&key)?.unwrap_or_default();
            print_status(
                StatusResponse {
                    success: true,
                    message: format!("{} = {}", key, stored),
                    count: None,
                },
                json,
            );
        }
    }
    Ok(())
}

fn print_movie_row(movie: &Movie) {
    let mut genre: String = movie.genre.chars().take(20).collect();
    if genre.len() < movie.genre.len() {
        genre.push('…');
    }
    println!(
        "{:>14}  {:4}  {:<32} {:<22} {}",
        movie.id, movie.year, movie.title, movie.director, genre
    );
}

fn print_movie_detail(movie: &Movie) {
    println!("ID:       {}", movie.id);
    println!("Title:    {}", movie.title);
    println!("Year:     {}", movie.year);
    println!("Genre:    {}", movie.genre);
    println!("Director: {}", movie.director);
    if let Some(ref poster) = movie.poster {
        println!("Poster:   {}", poster);
    }
    println!("Created:  {}", movie.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Updated:  {}", movie.updated_at.format("%Y-%m-%d %H:%M:%S"));
}
