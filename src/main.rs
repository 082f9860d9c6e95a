use clap::Parser;
use tech_hunt::utils::logger;
use tech_hunt::ServeArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServeArgs::parse();

    // 先解析設定，日誌格式取決於設定內容
    let settings = match args.settings() {
        Ok(settings) => settings,
        Err(e) => {
            logger::init_logger(args.verbose);
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if settings.log_json {
        logger::init_json_logger();
    } else {
        logger::init_logger(args.verbose);
    }

    tracing::info!("Starting tech-hunt server");
    tracing::debug!("Settings: {:?}", settings);

    if let Err(e) = tech_hunt::serve(settings).await {
        tracing::error!(
            "❌ Server stopped with error: {} (Category: {:?})",
            e,
            e.category()
        );
        return Err(e.into());
    }

    Ok(())
}
