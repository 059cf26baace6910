//! # 미들웨어 / 요청 추출기
//!
//! - `auth`: 요청 헤더에서 현재 사용자 id를 꺼내는 `CurrentUser` 추출기

pub mod auth;

pub use auth::CurrentUser;
