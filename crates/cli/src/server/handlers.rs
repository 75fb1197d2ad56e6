use super::error::ApiError;
use super::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub question: String,
    #[serde(default = "default_session")]
    pub session: String,
}

fn default_session() -> String {
    "default".to_string()
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            question: String::new(),
            session: default_session(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub dataset: String,
    pub entries: usize,
}

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /query
pub async fn query(
    State(state): State<Arc<AppState>>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    // A query string that does not parse is an empty question
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            tracing::debug!("Unparseable query string, asking empty question: {}", rejection);
            QueryParams::default()
        }
    };
    let answer = state.engine.ask(&params.session, &params.question).await?;
    Ok(Json(QueryResponse {
        response: answer.answer,
    }))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        dataset: state.dataset.clone(),
        entries: state.engine.index().len(),
    })
}
