use crate::config::toml_config::TomlConfig;
use crate::config::LibraryConfig;
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "library-catalog")]
#[command(about = "Console library catalog with flat-file storage")]
pub struct CliConfig {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory holding the books and users files
    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(long)]
    pub books_file: Option<String>,

    #[arg(long)]
    pub users_file: Option<String>,

    /// Refuse to remove borrowed books or users who hold books
    #[arg(long)]
    pub strict_references: bool,

    /// Do not seed demo books into an empty catalog
    #[arg(long)]
    pub no_seed: bool,

    #[arg(long)]
    pub no_clear: bool,

    #[arg(long)]
    pub no_pause: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Defaults, then the TOML file named by `--config`, then these flags.
    pub fn resolve(&self) -> Result<LibraryConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                TomlConfig::from_file(path)?.into_library_config()
            }
            None => LibraryConfig::default(),
        };
        self.apply_to(&mut config);
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut LibraryConfig) {
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(books_file) = &self.books_file {
            config.books_file = books_file.clone();
        }
        if let Some(users_file) = &self.users_file {
            config.users_file = users_file.clone();
        }
        // 旗標只能開啟，不能關閉檔案裡的設定
        if self.strict_references {
            config.strict_references = true;
        }
        if self.no_seed {
            config.seed_demo_books = false;
        }
        if self.no_clear {
            config.clear_screen = false;
        }
        if self.no_pause {
            config.pause_after_action = false;
        }
    }
}
