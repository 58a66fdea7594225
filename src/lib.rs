pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::LibraryConfig;

pub use adapters::storage::{LocalStorage, MemoryStorage};
pub use app::{Session, SessionOptions};
pub use crate::core::{catalog::Catalog, library::LibraryService, persistence::PersistenceGateway};
pub use utils::error::{LibraryError, Result};
