//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//!
//! ## 분류
//! - 검증 실패(`BadRequest`): 어떤 변경도 일어나기 전에 거부됩니다.
//! - 정책 충돌(`HasChildren`, `InvalidMoveTarget`): 정상적인 결과로 취급하며
//!   에러 로그를 남기지 않습니다. 클라이언트가 상황에 맞는 안내를 띄울 수 있도록
//!   고유한 코드를 가집니다.
//! - 없음(`NotFound`): 조회/수정 대상이 없을 때. 삭제는 이 에러를 내지 않습니다.
//! - 일관성 손상(`Internal`): 경로 불일치처럼 버그로만 생기는 상황.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 잘못된 요청 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 하위 아티클이 있어 강제(force) 없이 삭제할 수 없음 (HTTP 409)
    #[error("Article contains children")]
    HasChildren,

    /// 자기 자신이나 자기 하위 아티클 밑으로 이동하려 함 (HTTP 409)
    #[error("Cannot move an article into itself or its own sub-article")]
    InvalidMoveTarget,

    /// 현재 사용자 id가 요청에 없음 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx 함수의 에러에 `?`를 쓰면 자동으로 AppError::Database로 변환됩니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// 응답 본문의 `error.code` 값
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::HasChildren => "has_children",
            AppError::InvalidMoveTarget => "invalid_move_target",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Internal(_) => "internal_error",
            AppError::Database(_) => "database_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::HasChildren | AppError::InvalidMoveTarget => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    /// 내부 에러(Database, Internal)는 실제 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let message = match self {
            AppError::NotFound | AppError::HasChildren | AppError::InvalidMoveTarget => {
                self.to_string()
            }
            AppError::BadRequest(ref msg) | AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                "A database error occurred".to_string()
            }
        };

        // 결과: { "error": { "code": "not_found", "message": "Resource not found" } }
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (self.status(), body).into_response()
    }
}
