//! # 아티클 데이터베이스 쿼리 모듈
//!
//! `articles` 테이블에 대한 CRUD 쿼리 함수들이 정의되어 있습니다.
//!
//! 모든 함수는 `sqlx::Executor`를 받으므로 `&SqlitePool`로도,
//! 트랜잭션 안에서는 `&mut *tx`로도 호출할 수 있습니다.
//! 에러 발생 시 `AppError`를 반환합니다.
//!
//! ## 소유자 범위
//! 목록/검색/본문/자식 조회는 `create_user_id`로 범위를 좁힙니다.
//! 경로 기반 자손 조회(`list_descendants`, `list_subtree_rows`)와
//! 경로 일괄 변경(`replace_path_prefix`)은 경로 매칭만 사용합니다.

use crate::error::AppError;
use crate::models::*;
use crate::services::path::{self, IdPath};
use sqlx::{Executor, QueryBuilder, Sqlite};

const ARTICLE_COLUMNS: &str = "id, title, content, create_user_id, create_time, update_time, \
                               parent_path, tag_ids, list_subarticle, color";

/// 새 아티클을 삽입하고 생성된 id를 반환합니다.
pub async fn insert_article<'e, E>(executor: E, new: &NewArticle) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    // sqlx::query(): 결과 행이 필요 없는 INSERT/UPDATE/DELETE에 사용
    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, content, create_user_id, create_time, update_time,
                              parent_path, tag_ids, list_subarticle, color)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    // .bind(): SQL의 ? 자리에 순서대로 값을 대입합니다 (SQL 인젝션 방지).
    .bind(&new.title)
    .bind(&new.content)
    .bind(new.create_user_id)
    .bind(&new.now)
    .bind(&new.now)
    // IdPath → "#1#2#" 문자열 인코딩은 여기(영속성 경계)에서만 일어납니다.
    .bind(new.parent_path.to_string())
    .bind(new.tag_ids.to_string())
    .bind(new.list_subarticle)
    .bind(&new.color)
    // .execute(): 쿼리 실행, .await?: 비동기 완료를 기다리고 에러면 즉시 반환
    .execute(executor)
    .await?;

    // AUTOINCREMENT 컬럼이므로 삭제된 id가 재사용되지 않습니다.
    Ok(result.last_insert_rowid())
}

/// ID로 단일 아티클을 조회합니다 (소유자 무관).
///
/// # 반환값
/// - `Ok(Some(Article))`: 아티클을 찾은 경우
/// - `Ok(None)`: 해당 ID의 아티클이 없는 경우
pub async fn get_article<'e, E>(executor: E, id: i64) -> Result<Option<Article>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    // query_as::<_, Article>: 결과 행을 Article 구조체로 자동 변환 (FromRow)
    let article = sqlx::query_as::<_, Article>(
        r#"
        SELECT id, title, content, create_user_id, create_time, update_time,
               parent_path, tag_ids, list_subarticle, color
        FROM articles
        WHERE id = ?
        "#,
    )
    .bind(id)
    // fetch_optional: 0행이면 None, 1행이면 Some
    .fetch_optional(executor)
    .await?;

    Ok(article)
}

/// 해당 사용자가 소유한 아티클만 조회합니다.
pub async fn get_user_article<'e, E>(
    executor: E,
    id: i64,
    user_id: i64,
) -> Result<Option<Article>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let article = sqlx::query_as::<_, Article>(
        r#"
        SELECT id, title, content, create_user_id, create_time, update_time,
               parent_path, tag_ids, list_subarticle, color
        FROM articles
        WHERE id = ? AND create_user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(article)
}

/// 아티클 자신과 직속 부모를 한 번의 쿼리로 가져옵니다.
///
/// 부모는 "아티클의 `parent_path`가 `#부모id#`로 끝나는 행"으로 찾습니다.
/// 패턴 끝에 `%`가 없으므로 마지막 id만 매칭됩니다.
/// 결과는 0~2행이며, 호출하는 쪽에서 `id`로 자신과 부모를 구분합니다.
pub async fn select_self_and_parent<'e, E>(
    executor: E,
    id: i64,
    user_id: i64,
) -> Result<Vec<ArticleSummary>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, ArticleSummary>(
        r#"
        SELECT id, title, color
        FROM articles
        WHERE create_user_id = ?
          AND (id = ?
               OR (SELECT parent_path FROM articles WHERE id = ?) LIKE '%#' || id || '#')
        "#,
    )
    .bind(user_id)
    .bind(id)
    .bind(id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// 아티클을 부분 업데이트합니다 (PATCH 방식).
///
/// `update_time`은 항상 갱신되고, `changes`에서 `Some`인 필드만 SQL에 포함됩니다.
/// 영향받은 행 수를 반환합니다 (0이면 해당 아티클이 없음).
pub async fn update_article_fields<'e, E>(
    executor: E,
    id: i64,
    changes: &ArticleChanges,
    now: &str,
) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    // QueryBuilder: 바인딩 값의 타입이 제각각이라 문자열 조립 대신 push_bind를 씁니다.
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE articles SET update_time = ");
    builder.push_bind(now.to_string());

    if let Some(title) = &changes.title {
        builder.push(", title = ").push_bind(title.clone());
    }
    if let Some(content) = &changes.content {
        builder.push(", content = ").push_bind(content.clone());
    }
    if let Some(parent_path) = &changes.parent_path {
        builder.push(", parent_path = ").push_bind(parent_path.to_string());
    }
    if let Some(tag_ids) = &changes.tag_ids {
        builder.push(", tag_ids = ").push_bind(tag_ids.to_string());
    }
    if let Some(list_subarticle) = changes.list_subarticle {
        builder.push(", list_subarticle = ").push_bind(list_subarticle);
    }
    if let Some(color) = &changes.color {
        builder.push(", color = ").push_bind(color.clone());
    }

    builder.push(" WHERE id = ").push_bind(id);

    let result = builder.build().execute(executor).await?;
    Ok(result.rows_affected())
}

/// 서브트리(루트 + 모든 자손)의 id를 고르는 서브쿼리. 바인딩 2개: `root_id`, `id_pattern(root_id)`
///
/// 삭제 대상 id를 하나씩 바인딩하면 SQLite 변수 개수 제한(32766)에 걸리므로,
/// 정리 쿼리들은 모두 이 서브쿼리로 대상을 다시 고릅니다.
pub(crate) const SUBTREE_IDS: &str =
    "SELECT id FROM articles WHERE id = ? OR parent_path LIKE ?";

/// 루트와 모든 자손을 삭제합니다. 삭제된 행 수를 반환합니다.
///
/// 즐겨찾기/연결 정리 쿼리가 같은 서브쿼리를 쓰므로 반드시 그 뒤에 호출해야 합니다.
pub async fn delete_subtree<'e, E>(executor: E, root_id: i64) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    // 자손 조회와 같은 조건: 자기 자신 OR 경로에 #root_id#가 있는 행
    let result = sqlx::query("DELETE FROM articles WHERE id = ? OR parent_path LIKE ?")
        .bind(root_id)
        .bind(path::id_pattern(root_id))
        .execute(executor)
        .await?;

    // rows_affected(): DELETE로 실제 지워진 행 수
    Ok(result.rows_affected())
}

/// 모든 자손(자식, 손자, ...)을 조회합니다. 자기 자신은 포함하지 않습니다.
///
/// `parent_path LIKE '%#id#%'`: 경로 어딘가에 `#id#`가 있으면 자손입니다.
pub async fn list_descendants<'e, E>(executor: E, id: i64) -> Result<Vec<ArticleTreeRow>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, ArticleTreeRow>(
        r#"
        SELECT id, title, color, parent_path
        FROM articles
        WHERE parent_path LIKE ?
        ORDER BY id
        "#,
    )
    .bind(path::id_pattern(id))
    // fetch_all: 조건에 맞는 모든 행을 Vec으로
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// 루트 자신과 모든 자손을 트리 조립용 행으로 조회합니다.
///
/// 반환 순서는 보장하지 않습니다. 트리 빌더가 순서와 무관하게 조립합니다.
pub async fn list_subtree_rows<'e, E>(
    executor: E,
    root_id: i64,
) -> Result<Vec<ArticleTreeRow>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, ArticleTreeRow>(
        r#"
        SELECT id, title, color, parent_path
        FROM articles
        WHERE id = ? OR parent_path LIKE ?
        "#,
    )
    .bind(root_id)
    .bind(path::id_pattern(root_id))
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// 경로가 `old_prefix`로 시작하는 모든 행의 앞부분을 `new_prefix`로 바꿉니다.
///
/// 접두사 뒤의 나머지 문자열은 그대로 보존됩니다.
/// ```text
/// old_prefix = #1#2#      new_prefix = #1#3#2#
/// #1#2#      → #1#3#2#
/// #1#2#8#    → #1#3#2#8#
/// ```
/// LIKE 대신 `substr` 비교를 쓰므로 접두사 일치만 정확히 검사합니다.
/// 변경된 행 수를 반환합니다.
pub async fn replace_path_prefix<'e, E>(
    executor: E,
    old_prefix: &IdPath,
    new_prefix: &IdPath,
) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    if old_prefix.is_empty() {
        // 빈 접두사는 테이블 전체와 일치합니다.
        return Err(AppError::Internal(
            "refusing to rewrite paths with an empty prefix".to_string(),
        ));
    }

    let old = old_prefix.to_string();
    // 경로는 ASCII(#과 숫자)뿐이라 바이트 길이 = SQLite substr의 문자 길이
    let old_len = old.len() as i64;

    let result = sqlx::query(
        r#"
        UPDATE articles
        SET parent_path = ? || substr(parent_path, ?)
        WHERE substr(parent_path, 1, ?) = ?
        "#,
    )
    .bind(new_prefix.to_string())
    .bind(old_len + 1)
    .bind(old_len)
    .bind(&old)
    .execute(executor)
    .await?;

    // 접두사로 시작했던 행 수. 서비스 계층이 자손 수와 비교합니다.
    Ok(result.rows_affected())
}

/// 직속 자식만 조회합니다 (경로가 정확히 `#id#`로 끝나는 행).
pub async fn list_children<'e, E>(
    executor: E,
    id: i64,
    user_id: i64,
) -> Result<Vec<ArticleSummary>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, ArticleSummary>(
        r#"
        SELECT id, title, color
        FROM articles
        WHERE create_user_id = ? AND parent_path LIKE ?
        ORDER BY id
        "#,
    )
    .bind(user_id)
    // child_pattern: '%#id#' (끝에 %가 없어 마지막 id만 매칭)
    .bind(path::child_pattern(id))
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// 직속 자식의 전체 레코드를 조회합니다.
pub async fn list_children_detail<'e, E>(
    executor: E,
    id: i64,
    user_id: i64,
) -> Result<Vec<Article>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, Article>(
        r#"
        SELECT id, title, content, create_user_id, create_time, update_time,
               parent_path, tag_ids, list_subarticle, color
        FROM articles
        WHERE create_user_id = ? AND parent_path LIKE ?
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .bind(path::child_pattern(id))
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// 검색 조건. 키워드 비교는 유니코드 대소문자 처리를 위해 서비스 계층이 맡습니다.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub tag_ids: Vec<i64>,
}

/// 태그 조건에 맞는 아티클을 최근 수정순으로 조회합니다.
///
/// `page`가 `Some((limit, offset))`이면 한 페이지만, `None`이면 조건에 맞는 전체를 가져옵니다.
pub async fn search_articles<'e, E>(
    executor: E,
    user_id: i64,
    filter: &ArticleFilter,
    page: Option<(i64, i64)>,
) -> Result<Vec<Article>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    // push(): SQL 조각을 그대로 이어 붙임 / push_bind(): ? 자리표시자 + 값 바인딩
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT ");
    builder.push(ARTICLE_COLUMNS).push(" FROM articles");
    push_filter(&mut builder, user_id, filter);
    builder.push(" ORDER BY update_time DESC, id DESC");
    if let Some((limit, offset)) = page {
        builder
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
    }

    // build_query_as: 조립한 쿼리의 결과 행을 Article(FromRow)로 변환
    let rows = builder.build_query_as::<Article>().fetch_all(executor).await?;
    Ok(rows)
}

/// `search_articles`와 같은 조건의 전체 건수
pub async fn count_articles<'e, E>(
    executor: E,
    user_id: i64,
    filter: &ArticleFilter,
) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM articles");
    push_filter(&mut builder, user_id, filter);

    // build_query_scalar + fetch_one: 단일 값 하나(COUNT 결과)만 꺼냅니다.
    let total = builder.build_query_scalar::<i64>().fetch_one(executor).await?;
    Ok(total)
}

/// WHERE 절: 소유자 + 태그 AND 조건
fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, user_id: i64, filter: &ArticleFilter) {
    builder.push(" WHERE create_user_id = ").push_bind(user_id);

    // 태그마다 AND 조건 하나: tag_ids에 #t#가 모두 들어 있어야 합니다.
    for tag_id in &filter.tag_ids {
        builder
            .push(" AND tag_ids LIKE ")
            .push_bind(path::id_pattern(*tag_id));
    }
}
