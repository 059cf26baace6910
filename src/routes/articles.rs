//! # 아티클 라우트 핸들러
//!
//! 아티클 서비스(`services::articles`)를 HTTP로 노출하는 얇은 핸들러들입니다.
//! 모든 핸들러는 `CurrentUser` 추출기로 현재 사용자 id를 받습니다.
//!
//! ## 엔드포인트
//! - `POST   /api/v1/articles`                       → 새 아티클 추가
//! - `GET    /api/v1/articles?keyword=&tags=1,2&...` → 검색 + 페이지네이션
//! - `GET    /api/v1/articles/{id}`                  → 본문 조회
//! - `PATCH  /api/v1/articles/{id}`                  → 수정 (부모 변경 시 서브트리 이동)
//! - `DELETE /api/v1/articles/{id}?force=true`       → 삭제 (force면 자손까지)
//! - `GET    /api/v1/articles/{id}/children`         → 직속 자식 + 부모
//! - `GET    /api/v1/articles/{id}/children/detail`  → 직속 자식 전체 레코드
//! - `GET    /api/v1/articles/{id}/tree`             → 서브트리
//! - `GET    /api/v1/articles/{id}/related`          → 연결된 아티클
//! - `PUT    /api/v1/articles/{id}/related/{to_id}`  → 연결 설정/해제
//! - `PUT    /api/v1/articles/{id}/favorite`         → 즐겨찾기 설정/해제
//! - `GET    /api/v1/favorites`                      → 즐겨찾기 목록

use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::*,
    services::articles as service,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

/// 애플리케이션 공유 상태
///
/// SqlitePool은 내부적으로 Arc를 쓰므로 clone해도 같은 풀을 가리킵니다.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
}

/// `GET /articles`의 쿼리 파라미터. `tags`는 쉼표로 구분한 태그 id 목록입니다.
#[derive(Debug, Deserialize)]
pub struct ListArticlesParams {
    pub keyword: Option<String>,
    pub tags: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListArticlesParams {
    fn into_query(self) -> Result<ArticleQuery, AppError> {
        let tag_ids = match self.tags.as_deref() {
            Some(raw) => parse_id_list(raw)?,
            None => Vec::new(),
        };
        Ok(ArticleQuery {
            keyword: self.keyword,
            tag_ids,
            page: self.page,
            page_size: self.page_size,
        })
    }
}

/// `"1, 2,3"` → `[1, 2, 3]`. 빈 항목은 건너뜁니다.
fn parse_id_list(raw: &str) -> Result<Vec<i64>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::BadRequest(format!("invalid tag id: {s}")))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct DeleteArticleParams {
    #[serde(default)]
    pub force: bool,
}

/// `POST /articles`: 201 Created + 생성된 아티클
///
/// ## 추출기(Extractor) 순서
/// - `State(state)`: 라우터에 등록된 AppState를 꺼냅니다 (패턴 매칭으로 바로 분해).
/// - `user: CurrentUser`: `X-User-Id` 헤더를 읽습니다. 없으면 여기서 401로 끝납니다.
/// - `Json(req)`: 요청 본문을 소비하므로 반드시 마지막 인자여야 합니다.
pub async fn create_article(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Article>), AppError> {
    // ?: 서비스 에러(AppError)는 IntoResponse를 통해 그대로 HTTP 응답이 됩니다.
    let article = service::add_article(&state.pool, user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn list_articles(
    State(state): State<AppState>,
    user: CurrentUser,
    // Query: URL의 ?keyword=...&page=... 부분을 구조체로 역직렬화
    Query(params): Query<ListArticlesParams>,
) -> Result<Json<ArticlePage>, AppError> {
    // 쉼표 목록 파싱 실패는 서비스 호출 전에 400으로 끝납니다.
    let page = service::get_article_list(&state.pool, user.user_id, params.into_query()?).await?;
    Ok(Json(page))
}

pub async fn get_article(
    State(state): State<AppState>,
    user: CurrentUser,
    // Path: `{id}` 자리의 값을 i64로 파싱. 숫자가 아니면 axum이 400을 반환합니다.
    Path(id): Path<i64>,
) -> Result<Json<ArticleContent>, AppError> {
    let content = service::get_content(&state.pool, user.user_id, id).await?;
    Ok(Json(content))
}

/// `PATCH /articles/{id}`: 요청에 포함된 필드만 수정합니다.
///
/// `parent_article_id`가 있으면 서브트리 전체를 이동하며,
/// 자기 자신이나 자손 밑으로의 이동은 409 `invalid_move_target`입니다.
pub async fn update_article(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateArticleRequest>,
) -> Result<Json<Article>, AppError> {
    let article = service::update_article(&state.pool, user.user_id, id, req).await?;
    Ok(Json(article))
}

/// `DELETE /articles/{id}`: 없는 아티클이어도 200을 반환합니다.
///
/// 자손이 있는데 `force`가 아니면 409 `has_children`.
pub async fn delete_article(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Query(params): Query<DeleteArticleParams>,
) -> Result<Json<RemovedArticle>, AppError> {
    let removed = service::remove_article(&state.pool, user.user_id, id, params.force).await?;
    Ok(Json(removed))
}

pub async fn get_children(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ChildrenListing>, AppError> {
    let listing = service::get_children(&state.pool, user.user_id, id).await?;
    Ok(Json(listing))
}

pub async fn get_children_detail(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let articles = service::get_children_detail(&state.pool, user.user_id, id).await?;
    // json! 매크로: 배열을 { "articles": [...] } 객체로 감쌉니다.
    Ok(Json(json!({ "articles": articles })))
}

pub async fn get_tree(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ArticleTreeNode>, AppError> {
    let tree = service::get_article_tree(&state.pool, user.user_id, id).await?;
    Ok(Json(tree))
}

pub async fn get_related(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let articles = service::get_related(&state.pool, user.user_id, id).await?;
    Ok(Json(json!({ "articles": articles })))
}

/// `PUT /articles/{id}/related/{to_id}`: `{ "related": bool }`
///
/// 응답의 `relation`은 설정 후 상태입니다 (해제 시 `null`).
pub async fn set_related(
    State(state): State<AppState>,
    user: CurrentUser,
    // 경로 변수가 두 개면 튜플로 받습니다 (선언 순서대로).
    Path((id, to_id)): Path<(i64, i64)>,
    Json(req): Json<SetRelatedRequest>,
) -> Result<Json<Value>, AppError> {
    let relation =
        service::set_article_relate(&state.pool, user.user_id, id, to_id, req.related).await?;
    Ok(Json(json!({ "relation": relation })))
}

/// `PUT /articles/{id}/favorite`: `{ "favorite": bool }`
pub async fn set_favorite(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<SetFavoriteRequest>,
) -> Result<Json<Value>, AppError> {
    let favorite = service::set_favorite(&state.pool, user.user_id, id, req.favorite).await?;
    Ok(Json(json!({ "favorite": favorite })))
}

pub async fn list_favorites(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let articles = service::list_favorites(&state.pool, user.user_id).await?;
    Ok(Json(json!({ "articles": articles })))
}
