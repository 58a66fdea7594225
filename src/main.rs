use anyhow::Context;
use clap::Parser;
use library_catalog::config::cli::LogFormat;
use library_catalog::core::ConfigProvider;
use library_catalog::utils::{logger, validation::Validate};
use library_catalog::{CliConfig, LibraryService, LocalStorage, Session, SessionOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Text => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("Starting library-catalog");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入並驗證配置
    let config = match cli.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    // 讀取目錄，沒有資料就無法啟動
    let storage = LocalStorage::new(config.data_dir());
    let mut library = match LibraryService::from_config(storage, &config).await {
        Ok(library) => library,
        Err(e) => {
            tracing::error!(
                "❌ Failed to load catalog: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "✅ Catalog ready: {} books, {} users (strict references: {})",
        library.catalog().book_count(),
        library.catalog().user_count(),
        config.strict_references()
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = std::io::stdout();
    let mut session = Session::new(&mut library, stdin, stdout.lock(), SessionOptions::from(&config));
    session
        .run()
        .await
        .context("console session ended with an I/O error")?;

    Ok(())
}
