pub const CREATE_MOVIES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS movies (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        year INTEGER NOT NULL,
        genre TEXT NOT NULL,
        director TEXT NOT NULL,
        poster TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

pub const CREATE_SETTINGS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

pub const CREATE_INDEX_TITLE: &str =
    "CREATE INDEX IF NOT EXISTS idx_movies_title ON movies(title)";

pub const CREATE_INDEX_YEAR: &str =
    "CREATE INDEX IF NOT EXISTS idx_movies_year ON movies(year)";

pub const CREATE_INDEX_GENRE: &str =
    "CREATE INDEX IF NOT EXISTS idx_movies_genre ON movies(genre)";

pub const CREATE_INDEX_DIRECTOR: &str =
    "CREATE INDEX IF NOT EXISTS idx_movies_director ON movies(director)";

pub const CREATE_INDEX_CREATED_AT: &str =
    "CREATE INDEX IF NOT EXISTS idx_movies_created_at ON movies(created_at)";
