pub mod config;
pub mod error;
pub mod preferences;
pub mod storage;
pub mod types;

pub use config::FolioConfig;
pub use error::{FolioError, Result};
pub use preferences::Preferences;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use types::*;
