#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::{LibraryError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ADMIN_USERNAME: &str = "Admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "00000";

/// Fully resolved settings: defaults, then the TOML file, then CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub data_dir: String,
    pub books_file: String,
    pub users_file: String,
    pub seed_demo_books: bool,
    pub strict_references: bool,
    pub admin_username: String,
    pub admin_password: String,
    pub library_name: String,
    pub clear_screen: bool,
    pub pause_after_action: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            books_file: "books.txt".to_string(),
            users_file: "users.txt".to_string(),
            seed_demo_books: true,
            strict_references: false,
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            library_name: "HayMe Awdi".to_string(),
            clear_screen: true,
            pause_after_action: true,
        }
    }
}

impl ConfigProvider for LibraryConfig {
    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn books_file(&self) -> &str {
        &self.books_file
    }

    fn users_file(&self) -> &str {
        &self.users_file
    }

    fn seed_demo_books(&self) -> bool {
        self.seed_demo_books
    }

    fn strict_references(&self) -> bool {
        self.strict_references
    }
}

impl Validate for LibraryConfig {
    fn validate(&self) -> Result<()> {
        validate_path("storage.data_dir", &self.data_dir)?;
        validate_path("storage.books_file", &self.books_file)?;
        validate_path("storage.users_file", &self.users_file)?;

        // 兩個檔案不能相同，否則互相覆寫
        if self.books_file == self.users_file {
            return Err(LibraryError::InvalidConfigValueError {
                field: "storage.users_file".to_string(),
                value: self.users_file.clone(),
                reason: "Books and users must be stored in different files".to_string(),
            });
        }

        validate_non_empty_string("admin.username", &self.admin_username)?;
        validate_non_empty_string("display.library_name", &self.library_name)?;
        Ok(())
    }
}
