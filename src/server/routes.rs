use axum::{
    extract::{Path, Query, State},
    Json,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use crate::Error;
use crate::catalog;
use crate::server::AppState;
use crate::session::Session;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct CollectParams {
    pub category: String,
}

#[derive(Deserialize)]
pub struct StagedParams {
    /// Leading rows to include per table
    #[serde(default = "default_staged_limit")]
    pub limit: usize,
}

fn default_staged_limit() -> usize {
    3
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult = Result<Json<serde_json::Value>, ApiError>;

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::EmptyBatch => StatusCode::CONFLICT,
        Error::UnknownCategory(_) | Error::UnknownQuery(_) | Error::UnknownTable(_) => {
            StatusCode::NOT_FOUND
        }
        Error::NotReadOnly(_) => StatusCode::BAD_REQUEST,
        Error::RemoteUnavailable(_) => StatusCode::BAD_GATEWAY,
        Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::QueryFailed { .. } | Error::Storage(_) | Error::Config(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

fn to_json<T: Serialize>(value: &T) -> ApiResult {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Run session work on the blocking pool under the session lock
async fn with_session<T, F>(state: Arc<AppState>, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Session) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut session = state
            .session
            .lock()
            .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "session lock poisoned"))?;
        f(&mut *session).map_err(|e| api_error(status_for(&e), e.to_string()))
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
}

pub async fn get_categories(State(state): State<Arc<AppState>>) -> ApiResult {
    let categories = with_session(state, |s| Ok(s.categories().to_vec())).await?;
    Ok(Json(serde_json::json!({ "categories": categories })))
}

pub async fn collect(
    State(state): State<Arc<AppState>>,
    Json(params): Json<CollectParams>,
) -> ApiResult {
    let report = with_session(state, move |s| s.collect(&params.category)).await?;
    to_json(&report)
}

pub async fn migrate(State(state): State<Arc<AppState>>) -> ApiResult {
    let report = with_session(state, |s| s.migrate()).await?;
    to_json(&report)
}

pub async fn list_queries() -> ApiResult {
    to_json(&catalog::entries())
}

pub async fn run_query(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult {
    let table = with_session(state, move |s| s.run_query(&key)).await?;
    Ok(Json(serde_json::json!({
        "columns": table.columns,
        "rows": table.to_records(),
    })))
}

pub async fn clear(State(state): State<Arc<AppState>>) -> ApiResult {
    let outcome = with_session(state, |s| s.clear()).await?;
    to_json(&outcome)
}

pub async fn get_staged(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StagedParams>,
) -> ApiResult {
    let (preview, clear_state) = with_session(state, move |s| {
        Ok((s.staged().preview(params.limit), s.clear_state()))
    })
    .await?;
    Ok(Json(serde_json::json!({
        "staged": preview.counts,
        "preview": {
            "artifacts": preview.artifacts,
            "media": preview.media,
            "colors": preview.colors,
        },
        "clear": clear_state,
    })))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult {
    let stats = with_session(state, |s| s.stats()).await?;
    to_json(&stats)
}

#[cfg(test)]
mod tests {
    use crate::collector::tests::FakeSource;
    use crate::record::{RawColor, RawRecord};
    use crate::server::{AppState, router};
    use crate::session::{Session, SessionOptions};
    use reqwest::blocking::Client;
    use serde_json::Value;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    fn spawn_server(dir: &std::path::Path) -> SocketAddr {
        let records: Vec<RawRecord> = (1..=2)
            .map(|id| RawRecord {
                id: Some(id),
                title: Some(format!("Coin {}", id)),
                colors: Some(vec![RawColor::default(); 3]),
                ..Default::default()
            })
            .collect();
        let session = Session::new(
            &dir.join("server.db"),
            Box::new(FakeSource::from_pages(vec![records])),
            SessionOptions::default(),
        )
        .unwrap();
        let state = Arc::new(AppState {
            session: Mutex::new(session),
        });

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                tx.send(listener.local_addr().unwrap()).unwrap();
                axum::serve(listener, router(state)).await.unwrap();
            });
        });
        rx.recv().unwrap()
    }

    #[test]
    fn test_collect_migrate_query_clear_over_http() {
        let dir = tempfile::tempdir().unwrap();
        let base = format!("http://{}", spawn_server(dir.path()));
        let client = Client::new();

        let migrate_early = client.post(format!("{}/migrate", base)).send().unwrap();
        assert_eq!(migrate_early.status().as_u16(), 409);

        let collected: Value = client
            .post(format!("{}/collect", base))
            .json(&serde_json::json!({"category": "Coins"}))
            .send()
            .unwrap()
            .json()
            .unwrap();
        assert_eq!(collected["staged"]["artifacts"], 2);
        assert_eq!(collected["stop"]["reason"], "exhausted");

        let staged: Value = client.get(format!("{}/staged?limit=1", base)).send().unwrap().json().unwrap();
        assert_eq!(staged["staged"]["colors"], 6);
        assert_eq!(staged["preview"]["artifacts"].as_array().unwrap().len(), 1);
        assert_eq!(staged["preview"]["artifacts"][0]["title"], "Coin 1");
        assert_eq!(staged["preview"]["colors"].as_array().unwrap().len(), 1);

        let staged: Value = client.get(format!("{}/staged", base)).send().unwrap().json().unwrap();
        assert_eq!(staged["preview"]["colors"].as_array().unwrap().len(), 3);
        assert_eq!(staged["clear"], "idle");

        let migrated: Value = client.post(format!("{}/migrate", base)).send().unwrap().json().unwrap();
        assert_eq!(migrated["colors"]["inserted"], 6);

        let query: Value = client
            .get(format!("{}/queries/total-color-entries", base))
            .send()
            .unwrap()
            .json()
            .unwrap();
        assert_eq!(query["rows"][0]["total_colors"], 6);

        let armed: Value = client.post(format!("{}/clear", base)).send().unwrap().json().unwrap();
        assert_eq!(armed["status"], "armed");
        let cleared: Value = client.post(format!("{}/clear", base)).send().unwrap().json().unwrap();
        assert_eq!(cleared["status"], "cleared");
        assert_eq!(cleared["deleted"]["artifacts"], 2);

        let stats: Value = client.get(format!("{}/stats", base)).send().unwrap().json().unwrap();
        assert_eq!(stats["artifacts"], 0);
    }

    #[test]
    fn test_unknown_category_and_query_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let base = format!("http://{}", spawn_server(dir.path()));
        let client = Client::new();

        let response = client
            .post(format!("{}/collect", base))
            .json(&serde_json::json!({"category": "Textiles"}))
            .send()
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);

        let response = client.get(format!("{}/queries/what-is-this", base)).send().unwrap();
        assert_eq!(response.status().as_u16(), 404);
        let body: Value = response.json().unwrap();
        assert!(body["error"].as_str().unwrap().contains("what-is-this"));
    }

    #[test]
    fn test_lists_catalog_and_categories() {
        let dir = tempfile::tempdir().unwrap();
        let base = format!("http://{}", spawn_server(dir.path()));
        let client = Client::new();

        let queries: Value = client.get(format!("{}/queries", base)).send().unwrap().json().unwrap();
        assert_eq!(queries.as_array().unwrap().len(), 25);

        let categories: Value = client.get(format!("{}/categories", base)).send().unwrap().json().unwrap();
        assert_eq!(categories["categories"][0], "Coins");
    }
}
