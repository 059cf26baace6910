//! # 아티클 서비스
//!
//! 경로 코덱(`path`), DB 계층(`db`), 트리 빌더(`tree`)를 조합하여
//! 아티클의 추가/수정(이동)/삭제/조회/검색과 즐겨찾기·연결을 처리합니다.
//!
//! 모든 함수는 호출자가 넘겨준 현재 사용자 id(`user_id`)를 기준으로 동작하며,
//! 다른 사용자의 아티클은 존재하지 않는 것으로 취급합니다.
//!
//! ## 트랜잭션
//! 이동은 "자손 목록 읽기 → 경로 일괄 변경 → 변경 결과 검증 → 자기 경로 변경"을,
//! 강제 삭제는 "자손 목록 읽기 → 즐겨찾기/연결/아티클 삭제"를
//! 하나의 트랜잭션 안에서 수행합니다. 도중에 `return`하면 트랜잭션이
//! drop되면서 롤백됩니다.
//!
//! 두 트랜잭션 모두 `BEGIN IMMEDIATE`로 시작해 처음부터 쓰기 잠금을 잡습니다.
//! 다른 연결의 이동/삭제는 `busy_timeout` 동안 기다렸다가 순서대로 실행되며,
//! 읽은 자손 목록이 쓰기 전에 바뀌는 일이 없습니다.
//!
//! ## 검색
//! 키워드 비교는 SQL `LIKE`(ASCII만 대소문자 무시)가 아니라
//! 스니펫과 같은 문자 단위 유니코드 소문자 비교로 Rust에서 수행합니다.

use crate::db::{self, ArticleFilter};
use crate::error::AppError;
use crate::models::*;
use crate::services::path::{IdPath, PathError};
use crate::services::tree;
use chrono::{SecondsFormat, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::{HashMap, HashSet};

/// 스니펫에서 키워드 앞뒤로 보여줄 문자 수
pub const SNIPPET_RADIUS: usize = 30;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const MAX_COLOR_LEN: usize = 32;

/// create_time / update_time 값. 고정 폭 RFC 3339(UTC, 밀리초)라 문자열 정렬 = 시간 정렬입니다.
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 쓰기 트랜잭션. 읽기 후 쓰기 사이에 다른 쓰기가 끼어들 수 없습니다.
const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

/// 저장된 경로로 계산한 결과가 불변식을 어기면 데이터 손상입니다.
fn corrupt_path(article_id: i64, err: PathError) -> AppError {
    AppError::Internal(format!("inconsistent path for article {article_id}: {err}"))
}

fn invalid_tags(err: PathError) -> AppError {
    AppError::BadRequest(format!("invalid tag ids: {err}"))
}

fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    Ok(title.to_string())
}

/// 빈 문자열은 "색상 없음"입니다.
fn validate_color(color: Option<String>) -> Result<Option<String>, AppError> {
    let Some(color) = color else {
        return Ok(None);
    };
    let color = color.trim();
    if color.is_empty() {
        return Ok(None);
    }
    if color.chars().count() > MAX_COLOR_LEN {
        return Err(AppError::BadRequest(format!(
            "color must be at most {MAX_COLOR_LEN} characters"
        )));
    }
    Ok(Some(color.to_string()))
}

/// 새 아티클을 추가합니다.
///
/// `parent_id`가 있으면 해당 사용자의 아티클이어야 하며,
/// 새 경로는 `부모 경로 + 부모 id`입니다. 없으면 루트 아티클(`""`)이 됩니다.
pub async fn add_article(
    pool: &SqlitePool,
    user_id: i64,
    req: CreateArticleRequest,
) -> Result<Article, AppError> {
    let title = validate_title(&req.title)?;
    let tag_ids = IdPath::tag_set(req.tag_ids).map_err(invalid_tags)?;
    let color = validate_color(req.color)?;

    let parent_path = match req.parent_id {
        Some(parent_id) => {
            let parent = db::get_user_article(pool, parent_id, user_id)
                .await?
                .ok_or_else(|| {
                    AppError::BadRequest(format!("parent article {parent_id} does not exist"))
                })?;
            parent
                .parent_path
                .append_id(parent.id)
                .map_err(|e| corrupt_path(parent.id, e))?
        }
        None => IdPath::root(),
    };

    let new = NewArticle {
        title,
        content: req.content,
        create_user_id: user_id,
        now: now(),
        parent_path,
        tag_ids,
        list_subarticle: req.list_subarticle,
        color,
    };
    let id = db::insert_article(pool, &new).await?;

    tracing::info!(article_id = id, user_id, parent_id = ?req.parent_id, "article created");

    db::get_article(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created article".to_string()))
}

/// 아티클을 수정합니다. `parent_article_id`가 있으면 서브트리 전체를 이동합니다.
///
/// ## 이동 처리
/// 1. 대상 부모가 자기 자신이거나 자손이면 `InvalidMoveTarget`
/// 2. 새 부모의 전체 경로 `new_parent_path = 새 부모 경로 + 새 부모 id`
/// 3. 자손 경로의 접두사 `old_full = 이전 경로 + id`를 `new_full = new_parent_path + id`로 교체
/// 4. 자손을 다시 읽어 각 경로가 `IdPath::rebase`로 계산한 값과 같은지 확인.
///    다르거나 행 수가 맞지 않으면 롤백하고 `Internal`
/// 5. 자기 `parent_path`를 `new_parent_path`로 변경
pub async fn update_article(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    req: UpdateArticleRequest,
) -> Result<Article, AppError> {
    // ── 검증: 어떤 변경보다도 먼저 ──
    let title = req.title.as_deref().map(validate_title).transpose()?;
    let tag_ids = req
        .tag_ids
        .map(IdPath::tag_set)
        .transpose()
        .map_err(invalid_tags)?;
    let color = match req.color {
        Some(color) => Some(validate_color(Some(color))?),
        None => None,
    };

    let mut changes = ArticleChanges {
        title,
        content: req.content,
        parent_path: None,
        tag_ids,
        list_subarticle: req.list_subarticle,
        color,
    };

    let mut tx = pool.begin_with(BEGIN_WRITE).await?;

    let article = db::get_user_article(&mut *tx, id, user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(new_parent_id) = req.parent_article_id {
        if new_parent_id == id {
            tracing::debug!(article_id = id, "move rejected: target is the article itself");
            return Err(AppError::InvalidMoveTarget);
        }

        let descendants = db::list_descendants(&mut *tx, id).await?;
        let descendant_ids: HashSet<i64> = descendants.iter().map(|row| row.id).collect();
        if descendant_ids.contains(&new_parent_id) {
            tracing::debug!(
                article_id = id,
                new_parent_id,
                "move rejected: target is a descendant"
            );
            return Err(AppError::InvalidMoveTarget);
        }

        let new_parent = db::get_user_article(&mut *tx, new_parent_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!("parent article {new_parent_id} does not exist"))
            })?;
        let new_parent_path = new_parent
            .parent_path
            .append_id(new_parent.id)
            .map_err(|e| corrupt_path(new_parent.id, e))?;

        if new_parent_path != article.parent_path {
            let old_full = article
                .parent_path
                .append_id(id)
                .map_err(|e| corrupt_path(id, e))?;
            let new_full = new_parent_path
                .append_id(id)
                .map_err(|e| corrupt_path(id, e))?;

            // 쓰기 전에 기대값을 계산합니다. 접두사가 맞지 않는 자손은 이미 손상된 데이터입니다.
            let expected: HashMap<i64, IdPath> = descendants
                .iter()
                .map(|row| {
                    row.parent_path
                        .rebase(&old_full, &new_full)
                        .map(|path| (row.id, path))
                        .map_err(|e| corrupt_path(row.id, e))
                })
                .collect::<Result<_, _>>()?;

            let rewritten = db::replace_path_prefix(&mut *tx, &old_full, &new_full).await?;
            if rewritten != descendants.len() as u64 {
                return Err(AppError::Internal(format!(
                    "moving article {id}: rewrote {rewritten} descendant paths, expected {}",
                    descendants.len()
                )));
            }
            verify_rewritten(&mut tx, id, &expected).await?;

            tracing::info!(
                article_id = id,
                user_id,
                from = %old_full,
                to = %new_full,
                descendants = rewritten,
                "article moved"
            );
            changes.parent_path = Some(new_parent_path);
        }
    }

    let updated = db::update_article_fields(&mut *tx, id, &changes, &now()).await?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }
    tx.commit().await?;

    tracing::debug!(article_id = id, user_id, "article updated");

    db::get_article(pool, id).await?.ok_or(AppError::NotFound)
}

/// 이동 직후 자손 경로가 기대값과 정확히 같은지 확인합니다.
async fn verify_rewritten(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
    expected: &HashMap<i64, IdPath>,
) -> Result<(), AppError> {
    // 새 경로에도 `#id#`가 들어 있으므로 같은 자손 조회로 다시 읽을 수 있습니다.
    let rows = db::list_descendants(&mut **tx, id).await?;
    if rows.len() != expected.len() {
        return Err(AppError::Internal(format!(
            "moving article {id}: found {} descendants after rewrite, expected {}",
            rows.len(),
            expected.len()
        )));
    }
    for row in &rows {
        if expected.get(&row.id) != Some(&row.parent_path) {
            return Err(AppError::Internal(format!(
                "moving article {id}: descendant {} has path {} after rewrite",
                row.id, row.parent_path
            )));
        }
    }
    Ok(())
}

/// 아티클을 삭제합니다.
///
/// - 없는(또는 남의) 아티클: 아무것도 하지 않고 성공 (멱등 삭제)
/// - 자손이 있고 `force`가 아님: `HasChildren`, 아무것도 변경하지 않음
/// - 그 외: 자신 + 모든 자손, 그리고 이들을 가리키는 즐겨찾기/연결을 한 번에 삭제
pub async fn remove_article(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    force: bool,
) -> Result<RemovedArticle, AppError> {
    let mut tx = pool.begin_with(BEGIN_WRITE).await?;

    let Some(article) = db::get_user_article(&mut *tx, id, user_id).await? else {
        return Ok(RemovedArticle {
            parent_id: None,
            removed_ids: Vec::new(),
        });
    };

    let descendants = db::list_descendants(&mut *tx, id).await?;
    if !descendants.is_empty() && !force {
        tracing::debug!(
            article_id = id,
            descendants = descendants.len(),
            "delete blocked: article has children"
        );
        return Err(AppError::HasChildren);
    }

    let mut ids = Vec::with_capacity(descendants.len() + 1);
    ids.push(id);
    ids.extend(descendants.iter().map(|row| row.id));

    // 정리 쿼리는 서브트리 조건으로 대상을 다시 고르므로 아티클 삭제가 마지막이어야 합니다.
    let favorites = db::delete_favorites_in_subtree(&mut *tx, id).await?;
    let relations = db::delete_relations_in_subtree(&mut *tx, id).await?;
    let articles = db::delete_subtree(&mut *tx, id).await?;
    if articles != ids.len() as u64 {
        return Err(AppError::Internal(format!(
            "removing article {id}: deleted {articles} rows, expected {}",
            ids.len()
        )));
    }
    tx.commit().await?;

    tracing::info!(
        article_id = id,
        user_id,
        articles,
        favorites,
        relations,
        "article removed"
    );

    Ok(RemovedArticle {
        parent_id: article.parent_path.parent_id(),
        removed_ids: ids,
    })
}

/// 본문 조회: 아티클 전체 + 부모 id + 즐겨찾기 여부
pub async fn get_content(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
) -> Result<ArticleContent, AppError> {
    let article = db::get_user_article(pool, id, user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let is_favorite = db::get_favorite(pool, id, user_id).await?.is_some();

    Ok(ArticleContent {
        parent_id: article.parent_path.parent_id(),
        article,
        is_favorite,
    })
}

/// 직속 자식 목록과, 있다면 이 아티클의 부모(위로 가기용)
pub async fn get_children(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
) -> Result<ChildrenListing, AppError> {
    let rows = db::select_self_and_parent(pool, id, user_id).await?;
    if !rows.iter().any(|row| row.id == id) {
        return Err(AppError::NotFound);
    }
    let parent = rows.into_iter().find(|row| row.id != id);

    let children = db::list_children(pool, id, user_id).await?;
    Ok(ChildrenListing { parent, children })
}

/// 직속 자식의 전체 레코드 (`list_subarticle` 화면용)
pub async fn get_children_detail(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
) -> Result<Vec<Article>, AppError> {
    db::get_user_article(pool, id, user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    db::list_children_detail(pool, id, user_id).await
}

/// 이 아티클에서 연결된 아티클 목록
pub async fn get_related(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
) -> Result<Vec<ArticleSummary>, AppError> {
    db::get_user_article(pool, id, user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    db::list_related_articles(pool, id, user_id).await
}

/// `root_id`를 루트로 하는 서브트리 전체
pub async fn get_article_tree(
    pool: &SqlitePool,
    user_id: i64,
    root_id: i64,
) -> Result<ArticleTreeNode, AppError> {
    db::get_user_article(pool, root_id, user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let rows = db::list_subtree_rows(pool, root_id).await?;
    tree::build_tree(root_id, &rows)
        .map_err(|e| AppError::Internal(format!("article tree {root_id}: {e}")))?
        .ok_or(AppError::NotFound)
}

/// 키워드/태그 검색 + 페이지네이션. 최근 수정순입니다.
pub async fn get_article_list(
    pool: &SqlitePool,
    user_id: i64,
    query: ArticleQuery,
) -> Result<ArticlePage, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let keyword = query
        .keyword
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());
    let tag_ids = IdPath::tag_set(query.tag_ids).map_err(invalid_tags)?;

    let filter = ArticleFilter {
        tag_ids: tag_ids.into(),
    };
    let offset = u64::from(page - 1) * u64::from(page_size);

    let (total, rows) = match keyword.as_deref() {
        // 키워드가 있으면 소유자/태그 조건까지만 SQL로 거르고, 나머지는 스니펫과 같은 비교로
        Some(keyword) => {
            let matched: Vec<Article> = db::search_articles(pool, user_id, &filter, None)
                .await?
                .into_iter()
                .filter(|article| {
                    contains_ignore_case(&article.title, keyword)
                        || contains_ignore_case(&article.content, keyword)
                })
                .collect();
            let total = matched.len() as i64;
            let rows: Vec<Article> = matched
                .into_iter()
                .skip(offset as usize)
                .take(page_size as usize)
                .collect();
            (total, rows)
        }
        None => {
            let total = db::count_articles(pool, user_id, &filter).await?;
            let page = Some((i64::from(page_size), offset as i64));
            (total, db::search_articles(pool, user_id, &filter, page).await?)
        }
    };

    let items = rows
        .into_iter()
        .map(|article| ArticleListItem {
            snippet: extract_snippet(&article.content, keyword.as_deref()),
            id: article.id,
            title: article.title,
            color: article.color,
            tag_ids: article.tag_ids,
            update_time: article.update_time,
        })
        .collect();

    Ok(ArticlePage {
        total,
        page,
        page_size,
        items,
    })
}

/// 본문에서 키워드 주변을 잘라냅니다 (문자 단위).
///
/// - 첫 번째 대소문자 무시 매칭 위치 `m`에 대해 `[max(0, m-30), min(L, m+30))`
/// - 키워드가 없거나 매칭이 없으면 `[0, min(L, 30))`
pub fn extract_snippet(content: &str, keyword: Option<&str>) -> String {
    let chars: Vec<char> = content.chars().collect();
    let (start, end) = match keyword.and_then(|k| find_ignore_case(&chars, k)) {
        Some(m) => (
            m.saturating_sub(SNIPPET_RADIUS),
            (m + SNIPPET_RADIUS).min(chars.len()),
        ),
        None => (0, SNIPPET_RADIUS.min(chars.len())),
    };
    chars[start..end].iter().collect()
}

/// 검색 필터와 스니펫이 같은 비교 규칙을 쓰도록 `find_ignore_case`를 공유합니다.
fn contains_ignore_case(text: &str, keyword: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    find_ignore_case(&chars, keyword).is_some()
}

/// 문자 단위 유니코드 소문자 비교로 첫 매칭 위치(문자 인덱스)를 찾습니다.
fn find_ignore_case(haystack: &[char], needle: &str) -> Option<usize> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| {
        window
            .iter()
            .zip(&needle)
            .all(|(a, b)| a == b || a.to_lowercase().eq(b.to_lowercase()))
    })
}

/// 즐겨찾기 설정/해제. 설정 후의 즐겨찾기 행을 반환합니다 (해제 시 `None`).
pub async fn set_favorite(
    pool: &SqlitePool,
    user_id: i64,
    article_id: i64,
    favorite: bool,
) -> Result<Option<ArticleFavorite>, AppError> {
    db::get_user_article(pool, article_id, user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if favorite {
        db::add_favorite(pool, article_id, user_id).await?;
    } else {
        db::remove_favorite(pool, article_id, user_id).await?;
    }
    tracing::debug!(article_id, user_id, favorite, "favorite updated");

    db::get_favorite(pool, article_id, user_id).await
}

/// 사용자가 즐겨찾기한 아티클 목록
pub async fn list_favorites(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<ArticleSummary>, AppError> {
    db::list_favorite_articles(pool, user_id).await
}

/// `from → to` 연결 설정/해제. 두 아티클 모두 사용자의 것이어야 합니다.
pub async fn set_article_relate(
    pool: &SqlitePool,
    user_id: i64,
    from_article_id: i64,
    to_article_id: i64,
    related: bool,
) -> Result<Option<ArticleRelation>, AppError> {
    if from_article_id == to_article_id {
        return Err(AppError::BadRequest(
            "an article cannot be related to itself".to_string(),
        ));
    }
    db::get_user_article(pool, from_article_id, user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    db::get_user_article(pool, to_article_id, user_id)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest(format!("related article {to_article_id} does not exist"))
        })?;

    if related {
        db::add_relation(pool, from_article_id, to_article_id, user_id).await?;
    } else {
        db::remove_relation(pool, from_article_id, to_article_id, user_id).await?;
    }
    tracing::debug!(from_article_id, to_article_id, user_id, related, "relation updated");

    db::get_relation(pool, from_article_id, to_article_id, user_id).await
}
