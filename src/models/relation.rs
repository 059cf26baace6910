use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ArticleFavorite {
    pub id: i64,
    pub article_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ArticleRelation {
    pub id: i64,
    pub from_article_id: i64,
    pub to_article_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetFavoriteRequest {
    pub favorite: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetRelatedRequest {
    pub related: bool,
}
