//! Blog/news post model and DTOs.
//!
//! Authors and tags are join rows; updates that supply `author_ids` or
//! `tag_ids` replace the whole set.

use eduportal_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::tag::Tag;

/// A row from the `posts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Post {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub category_id: Option<DbId>,
    pub is_published: bool,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Public author info attached to a post.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PostAuthor {
    pub id: DbId,
    pub name: String,
}

/// A post enriched with its authors (in display order) and tags.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub authors: Vec<PostAuthor>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePost {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[validate(url)]
    pub cover_image_url: Option<String>,
    pub category_id: Option<DbId>,
    pub is_published: Option<bool>,
    #[serde(default)]
    pub author_ids: Vec<DbId>,
    #[serde(default)]
    pub tag_ids: Vec<DbId>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePost {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    pub content: Option<String>,
    #[validate(url)]
    pub cover_image_url: Option<String>,
    pub category_id: Option<DbId>,
    pub is_published: Option<bool>,
    pub author_ids: Option<Vec<DbId>>,
    pub tag_ids: Option<Vec<DbId>>,
}

/// Query parameters for `GET /posts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostListParams {
    /// Category slug filter.
    pub category: Option<String>,
    /// Tag slug filter.
    pub tag: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
