use std::sync::Arc;

use patient_portal::{
    build_state,
    clock::SystemClock,
    config::Config,
    models::RegisterRequest,
    routes::{self, auth_routes},
};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use axum::http::header;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;
    let state = build_state(&cfg, Arc::new(SystemClock));

    if let Some((email, password)) = &cfg.demo_user {
        let req = RegisterRequest {
            email: email.clone(),
            password: password.clone(),
            confirm_password: password.clone(),
            first_name: "John".into(),
            last_name: "Doe".into(),
            phone: Some("+1234567890".into()),
        };
        auth_routes::create_account(&state, &req)
            .await
            .map_err(|e| anyhow::anyhow!("demo account: {e:?}"))?;
        tracing::info!("demo account ready: {email}");
    }

    // Browser clients call the API cross-origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
