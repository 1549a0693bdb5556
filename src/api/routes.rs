use axum::{
    routing::get,
    Router,
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::{Result, AppError};
use crate::api::models::{ArticleResponse, GenerateQuery};
use crate::api::response::{self, KeywordResult};
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/generate", get(generate_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Keywords run one after another; a failed keyword becomes an error entry and
/// the rest of the batch continues.
async fn generate_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<GenerateQuery>, QueryRejection>,
) -> Result<Json<Vec<KeywordResult<ArticleResponse>>>> {
    let Query(query) = query.map_err(|rejection| AppError::ParseError(rejection.body_text()))?;
    let keywords = query.keyword_list();
    if keywords.is_empty() {
        return Err(AppError::ParseError("Please provide at least one keyword".to_string()));
    }

    let mut results = Vec::with_capacity(keywords.len());
    for keyword in &keywords {
        let start_time = std::time::Instant::now();
        let outcome = state.pipeline.run(&query.run_options(keyword)).await;
        info!("Keyword {:?} took {:?}", keyword, start_time.elapsed());

        results.push(match outcome {
            Ok(report) => response::success(keyword, ArticleResponse::from(report)),
            Err(err) => {
                error!(keyword = %keyword, "Keyword failed: {}", err);
                response::error(keyword, err.status_code(), err.to_string())
            }
        });
    }

    Ok(Json(results))
}
