//! webs-analyzer service entrypoint.
//! Boots the Axum HTTP server with the analysis routes, shared state and middleware.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    webs_analyzer::init_tracing();

    let router = webs_analyzer::app().await?;
    Ok(router.into())
}
