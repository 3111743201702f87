// Extractor error handlers.
//
// actix-web answers malformed JSON bodies, paths and query strings with plain
// text by default; these hooks route them through AppError so every client
// error shares the same JSON body.

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError},
    web, Error, HttpRequest,
};

use crate::core::AppError;

/// Maximum accepted JSON body size
pub const JSON_LIMIT_BYTES: usize = 16 * 1024;

pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> Error {
    log_rejection(req, &err.to_string());
    AppError::validation(format!("Invalid JSON body: {}", err)).into()
}

pub fn path_error_handler(err: PathError, req: &HttpRequest) -> Error {
    log_rejection(req, &err.to_string());
    AppError::validation(format!("Invalid path parameter: {}", err)).into()
}

pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> Error {
    log_rejection(req, &err.to_string());
    AppError::validation(format!("Invalid query string: {}", err)).into()
}

fn log_rejection(req: &HttpRequest, error: &str) {
    tracing::debug!(
        method = %req.method(),
        path = req.path(),
        error = error,
        "Request rejected by extractor"
    );
}

/// Register the handlers on an app or scope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT_BYTES)
            .error_handler(json_error_handler),
    )
    .app_data(web::PathConfig::default().error_handler(path_error_handler))
    .app_data(web::QueryConfig::default().error_handler(query_error_handler));
}
