pub mod models;
pub mod schema;
pub mod sqlite;

use crate::errors::Result;
use models::{Movie, MovieFilter, MovieUpdate, NewMovie, Setting};

/// Durable CRUD and query over the movie and settings collections.
///
/// Absence is signalled in-band (`Option`, `bool`); only engine failures and
/// constraint violations come back as errors. No operation retries.
pub trait MovieStore {
    fn add(&self, movie: NewMovie) -> Result<Movie>;
    fn get(&self, id: i64) -> Result<Option<Movie>>;
    fn get_all(&self) -> Result<Vec<Movie>>;
    fn update(&self, id: i64, changes: MovieUpdate) -> Result<Movie>;
    fn remove(&self, id: i64) -> Result<bool>;
    fn query(&self, filter: &MovieFilter) -> Result<Vec<Movie>>;
    fn save_setting(&self, key: &str, value: &str) -> Result<()>;
    fn get_setting(&self, key: &str) -> Result<Option<String>>;
    fn settings(&self) -> Result<Vec<Setting>>;
    fn clear_all(&self) -> Result<()>;
}
