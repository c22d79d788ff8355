use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::session::Session;

pub mod routes;

/// Server state: one session shared by every request
pub struct AppState {
    pub session: Mutex<Session>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/categories", get(routes::get_categories))
        .route("/collect", post(routes::collect))
        .route("/migrate", post(routes::migrate))
        .route("/queries", get(routes::list_queries))
        .route("/queries/{key}", get(routes::run_query))
        .route("/clear", post(routes::clear))
        .route("/staged", get(routes::get_staged))
        .route("/stats", get(routes::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, session: Session) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        session: Mutex::new(session),
    });
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);
    println!("{} Server running at http://{}", crate::ui::Icons::GLOBE, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
