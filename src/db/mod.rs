pub mod catalog;
pub mod history;
pub mod sqlite;

pub use catalog::CatalogStore;
pub use history::HistoryStore;
pub use sqlite::create_pool;
