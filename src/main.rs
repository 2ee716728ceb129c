use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use offerforge::config::{AppConfig, LogFormat};
use offerforge::email::SmtpMailer;
use offerforge::llm::create_provider;
use offerforge::routes::configure_routes;
use offerforge::state::AppState;
use offerforge::store::{migrate, Store, StoreConfig};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,offerforge=debug"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    init_tracing(config.log_format);

    let pool = StoreConfig::from_connection_string(&config.database_url)?
        .with_max_pool_size(config.database_pool_size)
        .connect()
        .await
        .context("failed to connect to the offer database")?;
    migrate(&pool).await.context("failed to apply schema")?;
    info!(pool_size = config.database_pool_size, "database ready");

    let provider = create_provider(&config.llm)
        .await
        .context("failed to create LLM provider")?;
    info!(model = %config.llm.model_id(), "LLM provider ready");

    if config.smtp.sender_email.is_none() || config.smtp.sender_password.is_none() {
        tracing::warn!("SMTP credentials not set, /send-email will fail");
    }
    let mailer = Arc::new(SmtpMailer::new(config.smtp.clone()));

    let state = AppState::new(Store::postgres(pool), provider, mailer, config.llm_max_tokens);
    let routes = configure_routes(state);

    info!(addr = %config.bind_addr, "starting server");
    warp::serve(routes).run(config.bind_addr).await;

    Ok(())
}
