//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들과 API 라우터를 모아둔 모듈입니다.
//! Axum에서 핸들러는 HTTP 요청을 받아 응답을 반환하는 async 함수입니다.
//!
//! 각 하위 모듈:
//! - `articles`: 아티클 CRUD, 이동, 트리, 검색, 즐겨찾기/연결 핸들러
//! - `health`: 서버 상태 확인 (헬스체크)

pub mod articles;
pub mod health;

pub use articles::*;
pub use health::*;

use axum::{
    routing::{get, put},
    Router,
};

/// `/api/v1` 아래에 붙는 API 라우터를 만듭니다.
///
/// 경로 파라미터는 axum 0.8 문법(`{id}`)을 사용합니다.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/articles", get(list_articles).post(create_article))
        .route(
            "/articles/{id}",
            get(get_article).patch(update_article).delete(delete_article),
        )
        .route("/articles/{id}/children", get(get_children))
        .route("/articles/{id}/children/detail", get(get_children_detail))
        .route("/articles/{id}/tree", get(get_tree))
        .route("/articles/{id}/related", get(get_related))
        .route("/articles/{id}/related/{to_id}", put(set_related))
        .route("/articles/{id}/favorite", put(set_favorite))
        .route("/favorites", get(list_favorites))
        .route("/health", get(health_check))
        .with_state(state)
}
