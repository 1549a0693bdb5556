use serde::Serialize;
use axum::http::StatusCode;
use chrono::Utc;

/// One entry of the batch response; exactly one of `data` or `meta.message` is set.
#[derive(Serialize)]
pub struct KeywordResult<T> {
    pub keyword: String,
    pub data: Option<T>,
    pub meta: ResponseMeta,
}

#[derive(Serialize)]
pub struct ResponseMeta {
    pub status: String,
    pub status_code: u16,
    pub timestamp: String,
    pub message: Option<String>,
}

pub fn success<T: Serialize>(keyword: &str, data: T) -> KeywordResult<T> {
    let meta = ResponseMeta {
        status: "success".to_string(),
        status_code: StatusCode::OK.as_u16(),
        timestamp: Utc::now().to_rfc3339(),
        message: None,
    };

    KeywordResult {
        keyword: keyword.to_string(),
        data: Some(data),
        meta,
    }
}

pub fn error<T>(keyword: &str, status: StatusCode, message: String) -> KeywordResult<T> {
    let meta = ResponseMeta {
        status: "error".to_string(),
        status_code: status.as_u16(),
        timestamp: Utc::now().to_rfc3339(),
        message: Some(message),
    };

    KeywordResult {
        keyword: keyword.to_string(),
        data: None,
        meta,
    }
}
