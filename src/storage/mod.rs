// Append-only product store on SQLite.

pub mod sqlite;

pub use sqlite::ProductStore;
