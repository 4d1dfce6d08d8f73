pub mod legacy;
pub mod sqlite;

pub use sqlite::SqliteDb;
