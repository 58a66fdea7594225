use crate::config::LibraryConfig;
use crate::utils::error::{LibraryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub storage: Option<StorageConfig>,
    pub catalog: Option<CatalogConfig>,
    pub admin: Option<AdminConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: Option<String>,
    pub books_file: Option<String>,
    pub users_file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub seed_demo_books: Option<bool>,
    pub strict_references: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub library_name: Option<String>,
    pub clear_screen: Option<bool>,
    pub pause_after_action: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LibraryError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LibraryError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LIBRARY_ADMIN_PASSWORD})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LibraryError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 把檔案中有設定的值蓋到 `config` 上
    pub fn apply_to(&self, config: &mut LibraryConfig) {
        if let Some(storage) = &self.storage {
            if let Some(data_dir) = &storage.data_dir {
                config.data_dir = data_dir.clone();
            }
            if let Some(books_file) = &storage.books_file {
                config.books_file = books_file.clone();
            }
            if let Some(users_file) = &storage.users_file {
                config.users_file = users_file.clone();
            }
        }

        if let Some(catalog) = &self.catalog {
            if let Some(seed) = catalog.seed_demo_books {
                config.seed_demo_books = seed;
            }
            if let Some(strict) = catalog.strict_references {
                config.strict_references = strict;
            }
        }

        if let Some(admin) = &self.admin {
            if let Some(username) = &admin.username {
                config.admin_username = username.clone();
            }
            if let Some(password) = &admin.password {
                config.admin_password = password.clone();
            }
        }

        if let Some(display) = &self.display {
            if let Some(name) = &display.library_name {
                config.library_name = name.clone();
            }
            if let Some(clear) = display.clear_screen {
                config.clear_screen = clear;
            }
            if let Some(pause) = display.pause_after_action {
                config.pause_after_action = pause;
            }
        }
    }

    pub fn into_library_config(self) -> LibraryConfig {
        let mut config = LibraryConfig::default();
        self.apply_to(&mut config);
        config
    }
}
