use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::routes::AppState;

/// 현재 사용자 id를 담는 헤더. 인증은 앞단(게이트웨이)에서 끝난 것으로 봅니다.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: i64,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized(format!("{USER_ID_HEADER} header is required")))?;

        let user_id = parse_user_id(raw)
            .ok_or_else(|| AppError::Unauthorized(format!("invalid {USER_ID_HEADER} header")))?;

        Ok(CurrentUser { user_id })
    }
}

fn parse_user_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}
