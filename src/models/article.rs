use serde::{Deserialize, Serialize};

use crate::services::path::IdPath;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub create_user_id: i64,
    pub create_time: String,
    pub update_time: String,
    #[sqlx(try_from = "String")]
    pub parent_path: IdPath,
    #[sqlx(try_from = "String")]
    pub tag_ids: IdPath,
    pub list_subarticle: bool,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub color: Option<String>,
}

/// 트리 조립에 필요한 최소 컬럼
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleTreeRow {
    pub id: i64,
    pub title: String,
    pub color: Option<String>,
    #[sqlx(try_from = "String")]
    pub parent_path: IdPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleTreeNode {
    pub id: i64,
    pub title: String,
    pub color: Option<String>,
    pub children: Vec<ArticleTreeNode>,
}

/// INSERT에 쓰는 값 묶음. 경로와 시각은 서비스가 채웁니다.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub create_user_id: i64,
    pub now: String,
    pub parent_path: IdPath,
    pub tag_ids: IdPath,
    pub list_subarticle: bool,
    pub color: Option<String>,
}

/// UPDATE에 쓰는 부분 변경. `None`인 필드는 건드리지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub parent_path: Option<IdPath>,
    pub tag_ids: Option<IdPath>,
    pub list_subarticle: Option<bool>,
    /// `Some(None)`이면 색상을 지웁니다.
    pub color: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(default)]
    pub list_subarticle: bool,
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    /// 지정하면 이 아티클(과 서브트리 전체)을 해당 부모 아래로 이동합니다.
    pub parent_article_id: Option<i64>,
    pub tag_ids: Option<Vec<i64>>,
    pub list_subarticle: Option<bool>,
    /// 빈 문자열은 색상 제거로 처리합니다.
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleQuery {
    pub keyword: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleListItem {
    pub id: i64,
    pub title: String,
    pub snippet: String,
    pub color: Option<String>,
    pub tag_ids: IdPath,
    pub update_time: String,
}

#[derive(Debug, Serialize)]
pub struct ArticlePage {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<ArticleListItem>,
}

#[derive(Debug, Serialize)]
pub struct ArticleContent {
    #[serde(flatten)]
    pub article: Article,
    pub parent_id: Option<i64>,
    pub is_favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct ChildrenListing {
    pub parent: Option<ArticleSummary>,
    pub children: Vec<ArticleSummary>,
}

#[derive(Debug, Serialize)]
pub struct RemovedArticle {
    /// 삭제된 아티클의 원래 부모 (화면 이동용)
    pub parent_id: Option<i64>,
    pub removed_ids: Vec<i64>,
}
