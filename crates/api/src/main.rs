use std::sync::Arc;

use anyhow::Context;

use academy_api::app::{build_app, build_services};
use academy_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    academy_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "starting");

    let services = build_services(&config).await.context("failed to build services")?;
    let app = build_app(Arc::new(services));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("Sports Academies server is running on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
