//! # 즐겨찾기/연결 데이터베이스 쿼리 모듈
//!
//! ## 테이블 구조
//! - `article_favorites`: 사용자 ↔ 아티클 즐겨찾기 (N:M)
//! - `article_relations`: 아티클 → 아티클 방향성 연결, 만든 사용자 범위
//!
//! 두 테이블 모두 외래키 CASCADE에 기대지 않습니다.
//! 아티클 삭제 시 서비스 계층이 `delete_*_in_subtree`를 명시적으로 호출합니다.

use crate::db::articles::SUBTREE_IDS;
use crate::error::AppError;
use crate::models::*;
use crate::services::path;
use sqlx::{Executor, Sqlite};

/// 즐겨찾기를 추가합니다.
///
/// `INSERT OR IGNORE`: (article_id, user_id)가 이미 있으면 아무 일도 하지 않습니다.
pub async fn add_favorite<'e, E>(executor: E, article_id: i64, user_id: i64) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    // UNIQUE(article_id, user_id) 제약에 걸리면 OR IGNORE가 조용히 건너뜁니다.
    sqlx::query("INSERT OR IGNORE INTO article_favorites (article_id, user_id) VALUES (?, ?)")
        .bind(article_id)
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(())
}

/// 즐겨찾기를 해제합니다. 실제로 지워졌으면 `true`
pub async fn remove_favorite<'e, E>(
    executor: E,
    article_id: i64,
    user_id: i64,
) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM article_favorites WHERE article_id = ? AND user_id = ?")
        .bind(article_id)
        .bind(user_id)
        .execute(executor)
        .await?;

    // rows_affected(): 지워진 행 수. 0이면 처음부터 즐겨찾기가 아니었음
    Ok(result.rows_affected() > 0)
}

pub async fn get_favorite<'e, E>(
    executor: E,
    article_id: i64,
    user_id: i64,
) -> Result<Option<ArticleFavorite>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let favorite = sqlx::query_as::<_, ArticleFavorite>(
        "SELECT id, article_id, user_id FROM article_favorites WHERE article_id = ? AND user_id = ?",
    )
    .bind(article_id)
    .bind(user_id)
    // fetch_optional: 0 또는 1행 → Option
    .fetch_optional(executor)
    .await?;

    Ok(favorite)
}

/// 사용자가 즐겨찾기한 아티클 목록 (최근 추가순)
pub async fn list_favorite_articles<'e, E>(
    executor: E,
    user_id: i64,
) -> Result<Vec<ArticleSummary>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, ArticleSummary>(
        r#"
        SELECT a.id, a.title, a.color
        FROM articles a
        JOIN article_favorites f ON f.article_id = a.id
        WHERE f.user_id = ?
        -- 즐겨찾기 id는 추가 순서대로 증가합니다.
        ORDER BY f.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// 서브트리(루트 + 자손)에 속한 아티클의 즐겨찾기를 모두 삭제합니다 (사용자 무관).
pub async fn delete_favorites_in_subtree<'e, E>(executor: E, root_id: i64) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    // format!으로 서브쿼리 문자열만 끼워 넣고, 값은 모두 bind로 전달합니다.
    let sql = format!("DELETE FROM article_favorites WHERE article_id IN ({SUBTREE_IDS})");
    let result = sqlx::query(&sql)
        .bind(root_id)
        .bind(path::id_pattern(root_id))
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// `from → to` 연결을 추가합니다. 이미 있으면 무시합니다.
pub async fn add_relation<'e, E>(
    executor: E,
    from_article_id: i64,
    to_article_id: i64,
    user_id: i64,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO article_relations (from_article_id, to_article_id, user_id)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(from_article_id)
    .bind(to_article_id)
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn remove_relation<'e, E>(
    executor: E,
    from_article_id: i64,
    to_article_id: i64,
    user_id: i64,
) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        DELETE FROM article_relations
        WHERE from_article_id = ? AND to_article_id = ? AND user_id = ?
        "#,
    )
    .bind(from_article_id)
    .bind(to_article_id)
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_relation<'e, E>(
    executor: E,
    from_article_id: i64,
    to_article_id: i64,
    user_id: i64,
) -> Result<Option<ArticleRelation>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let relation = sqlx::query_as::<_, ArticleRelation>(
        r#"
        SELECT id, from_article_id, to_article_id, user_id
        FROM article_relations
        WHERE from_article_id = ? AND to_article_id = ? AND user_id = ?
        "#,
    )
    .bind(from_article_id)
    .bind(to_article_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(relation)
}

/// `from_article_id`에서 나가는 연결의 대상 아티클들
///
/// ```text
/// from_article_id ──(article_relations, user_id)──→ to_article_id = articles.id
/// ```
pub async fn list_related_articles<'e, E>(
    executor: E,
    from_article_id: i64,
    user_id: i64,
) -> Result<Vec<ArticleSummary>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, ArticleSummary>(
        r#"
        SELECT a.id, a.title, a.color
        FROM articles a
        -- 연결의 도착점(to)을 articles와 조인해 제목/색상을 가져옵니다.
        JOIN article_relations r ON r.to_article_id = a.id
        WHERE r.from_article_id = ? AND r.user_id = ?
        ORDER BY r.id
        "#,
    )
    .bind(from_article_id)
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// 서브트리에 속한 아티클이 어느 쪽 끝에든 걸린 연결을 모두 삭제합니다.
pub async fn delete_relations_in_subtree<'e, E>(executor: E, root_id: i64) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "DELETE FROM article_relations \
         WHERE from_article_id IN ({SUBTREE_IDS}) OR to_article_id IN ({SUBTREE_IDS})"
    );
    // 서브쿼리가 두 번 나오므로 (root_id, 패턴) 쌍도 두 번 바인딩합니다.
    let pattern = path::id_pattern(root_id);
    let result = sqlx::query(&sql)
        .bind(root_id)
        .bind(&pattern)
        .bind(root_id)
        .bind(&pattern)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}
