use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub director: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMovie {
    /// When `None` the store derives an id from the creation clock.
    pub id: Option<i64>,
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub director: String,
    pub poster: Option<String>,
}

/// Partial edit; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct MovieUpdate {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub poster: Option<String>,
}

impl MovieUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.year.is_none()
            && self.genre.is_none()
            && self.director.is_none()
            && self.poster.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    TitleAsc,
    TitleDesc,
    YearAsc,
    YearDesc,
    CreatedAsc,
    CreatedDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::TitleAsc => "title-asc",
            SortKey::TitleDesc => "title-desc",
            SortKey::YearAsc => "year-asc",
            SortKey::YearDesc => "year-desc",
            SortKey::CreatedAsc => "created-asc",
            SortKey::CreatedDesc => "created-desc",
        }
    }

    /// Unrecognized names yield `None`, which leaves query order unchanged.
    pub fn parse(s: &str) -> Option<SortKey> {
        match s {
            "title-asc" => Some(SortKey::TitleAsc),
            "title-desc" => Some(SortKey::TitleDesc),
            "year-asc" => Some(SortKey::YearAsc),
            "year-desc" => Some(SortKey::YearDesc),
            "created-asc" => Some(SortKey::CreatedAsc),
            "created-desc" => Some(SortKey::CreatedDesc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    /// Substring match over title, genre, and director, case-insensitive.
    pub search: Option<String>,
    /// Substring match on genre; the sentinel "all" disables the filter.
    pub genre: Option<String>,
    pub year: Option<i32>,
    /// Inclusive bounds.
    pub year_range: Option<(i32, i32)>,
    pub director: Option<String>,
    pub sort: Option<SortKey>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl MovieFilter {
    /// Limit defaults to 50 once either slicing field is present.
    pub fn effective_limit(&self) -> Option<i64> {
        match (self.limit, self.offset) {
            (Some(l), _) if l > 0 => Some(l),
            (None, None) => None,
            _ => Some(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
