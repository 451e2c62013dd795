//! Repository for `posts` and their `post_authors` / `post_tags` join rows.

use std::collections::{HashMap, HashSet};

use eduportal_core::types::DbId;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::models::post::{CreatePost, Post, PostAuthor, PostDetail, UpdatePost};
use crate::models::tag::Tag;

const COLUMNS: &str = "id, title, slug, excerpt, content, cover_image_url, category_id, \
                       is_published, published_at, created_at, updated_at";

const P_COLUMNS: &str = "p.id, p.title, p.slug, p.excerpt, p.content, p.cover_image_url, \
                         p.category_id, p.is_published, p.published_at, p.created_at, \
                         p.updated_at";

#[derive(FromRow)]
struct AuthorRow {
    post_id: DbId,
    id: DbId,
    name: String,
}

#[derive(FromRow)]
struct TagRow {
    post_id: DbId,
    #[sqlx(flatten)]
    tag: Tag,
}

/// Filters for listing posts.
#[derive(Debug, Clone, Default)]
pub struct PostFilter<'a> {
    pub published_only: bool,
    pub category_slug: Option<&'a str>,
    pub tag_slug: Option<&'a str>,
}

/// Provides CRUD operations for posts.
pub struct PostRepo;

impl PostRepo {
    /// Insert a post with its authors and tags in one transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePost,
        slug: &str,
    ) -> Result<PostDetail, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO posts \
                (title, slug, excerpt, content, cover_image_url, category_id, is_published, \
                 published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, false), \
                     CASE WHEN COALESCE($7, false) THEN NOW() END) \
             RETURNING {COLUMNS}"
        );
        let post = sqlx::query_as::<_, Post>(&query)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.excerpt)
            .bind(&input.content)
            .bind(&input.cover_image_url)
            .bind(input.category_id)
            .bind(input.is_published)
            .fetch_one(&mut *tx)
            .await?;

        replace_authors(&mut tx, post.id, &input.author_ids).await?;
        replace_tags(&mut tx, post.id, &input.tag_ids).await?;

        tx.commit().await?;
        Self::load_detail(pool, post).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM posts WHERE id = $1");
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A post with authors and tags, by slug.
    pub async fn find_detail_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<PostDetail>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM posts WHERE slug = $1");
        let post = sqlx::query_as::<_, Post>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await?;
        match post {
            Some(post) => Ok(Some(Self::load_detail(pool, post).await?)),
            None => Ok(None),
        }
    }

    /// List posts (newest publication first) with authors and tags.
    pub async fn list(
        pool: &PgPool,
        filter: &PostFilter<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {P_COLUMNS} FROM posts p \
             LEFT JOIN categories c ON c.id = p.category_id \
             WHERE ($1 = false OR p.is_published) \
               AND ($2::TEXT IS NULL OR c.slug = $2) \
               AND ($3::TEXT IS NULL OR EXISTS ( \
                    SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
                    WHERE pt.post_id = p.id AND t.slug = $3)) \
             ORDER BY COALESCE(p.published_at, p.created_at) DESC, p.id DESC \
             LIMIT $4 OFFSET $5"
        );
        let posts = sqlx::query_as::<_, Post>(&query)
            .bind(filter.published_only)
            .bind(filter.category_slug)
            .bind(filter.tag_slug)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        Self::load_details(pool, posts).await
    }

    /// Update a post. Supplied `author_ids` / `tag_ids` replace the existing
    /// sets within the same transaction.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePost,
        slug: Option<&str>,
    ) -> Result<Option<PostDetail>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE posts SET \
                title = COALESCE($2, title), \
                slug = COALESCE($3, slug), \
                excerpt = COALESCE($4, excerpt), \
                content = COALESCE($5, content), \
                cover_image_url = COALESCE($6, cover_image_url), \
                category_id = COALESCE($7, category_id), \
                is_published = COALESCE($8, is_published), \
                published_at = CASE \
                    WHEN $8 = true AND published_at IS NULL THEN NOW() \
                    WHEN $8 = false THEN NULL \
                    ELSE published_at END \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let Some(post) = sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.excerpt)
            .bind(&input.content)
            .bind(&input.cover_image_url)
            .bind(input.category_id)
            .bind(input.is_published)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        if let Some(author_ids) = &input.author_ids {
            replace_authors(&mut tx, id, author_ids).await?;
        }
        if let Some(tag_ids) = &input.tag_ids {
            replace_tags(&mut tx, id, tag_ids).await?;
        }

        tx.commit().await?;
        Ok(Some(Self::load_detail(pool, post).await?))
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_detail(pool: &PgPool, post: Post) -> Result<PostDetail, sqlx::Error> {
        let mut details = Self::load_details(pool, vec![post]).await?;
        Ok(details.remove(0))
    }

    /// Attach authors and tags to a page of posts with one query each.
    async fn load_details(pool: &PgPool, posts: Vec<Post>) -> Result<Vec<PostDetail>, sqlx::Error> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<DbId> = posts.iter().map(|p| p.id).collect();

        let author_rows = sqlx::query_as::<_, AuthorRow>(
            "SELECT pa.post_id, u.id, u.name \
             FROM post_authors pa JOIN users u ON u.id = pa.user_id \
             WHERE pa.post_id = ANY($1) \
             ORDER BY pa.post_id, pa.sort_order",
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let tag_rows = sqlx::query_as::<_, TagRow>(
            "SELECT pt.post_id, t.id, t.name, t.slug, t.created_at, t.updated_at \
             FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
             WHERE pt.post_id = ANY($1) \
             ORDER BY pt.post_id, t.name",
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let mut authors: HashMap<DbId, Vec<PostAuthor>> = HashMap::new();
        for row in author_rows {
            authors.entry(row.post_id).or_default().push(PostAuthor {
                id: row.id,
                name: row.name,
            });
        }
        let mut tags: HashMap<DbId, Vec<Tag>> = HashMap::new();
        for row in tag_rows {
            tags.entry(row.post_id).or_default().push(row.tag);
        }

        Ok(posts
            .into_iter()
            .map(|post| PostDetail {
                authors: authors.remove(&post.id).unwrap_or_default(),
                tags: tags.remove(&post.id).unwrap_or_default(),
                post,
            })
            .collect())
    }
}

/// Drop repeated ids, keeping first occurrence order.
fn dedup_ids(ids: &[DbId]) -> Vec<DbId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

async fn replace_authors(
    tx: &mut Transaction<'_, Postgres>,
    post_id: DbId,
    author_ids: &[DbId],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM post_authors WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    let ids = dedup_ids(author_ids);
    if ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        "INSERT INTO post_authors (post_id, user_id, sort_order) \
         SELECT $1, a.user_id, (a.ord - 1)::INTEGER \
         FROM UNNEST($2::BIGINT[]) WITH ORDINALITY AS a(user_id, ord)",
    )
    .bind(post_id)
    .bind(&ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn replace_tags(
    tx: &mut Transaction<'_, Postgres>,
    post_id: DbId,
    tag_ids: &[DbId],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    let ids = dedup_ids(tag_ids);
    if ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        "INSERT INTO post_tags (post_id, tag_id) SELECT $1, UNNEST($2::BIGINT[])",
    )
    .bind(post_id)
    .bind(&ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(dedup_ids(&[]).is_empty());
    }
}
