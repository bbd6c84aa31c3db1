use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::data::post_repository::{
    NewPost, PostQuery, PostRepository, PostSort, SortDirection, SortField,
};
use crate::domain::error::DomainError;
use crate::domain::post::Post;

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    published: bool,
    user_id: i64,
    tag_ids: Vec<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const SELECT_POSTS: &str = r#"
    SELECT
        p.id,
        p.title,
        p.content,
        p.published,
        p.user_id,
        COALESCE(
            ARRAY_AGG(pt.tag_id ORDER BY pt.tag_id) FILTER (WHERE pt.tag_id IS NOT NULL),
            '{}'
        ) AS tag_ids,
        p.created_at,
        p.updated_at
    FROM posts p
    LEFT JOIN post_tags pt ON pt.post_id = p.id
"#;

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_post_db_error)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (title, content, published, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.published)
        .bind(input.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_post_db_error)?;

        replace_post_tags(&mut tx, id, &input.tag_ids)
            .await
            .map_err(map_post_db_error)?;
        tx.commit().await.map_err(map_post_db_error)?;

        self.get_post(id)
            .await?
            .ok_or_else(|| DomainError::Unexpected(format!("post {id} vanished after insert")))
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let sql = format!("{SELECT_POSTS} WHERE p.id = $1 GROUP BY p.id");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn update_post(&self, post: &Post) -> Result<Option<Post>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_post_db_error)?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE posts
            SET title = $2,
                content = $3,
                published = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.published)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_post_db_error)?;

        if updated.is_none() {
            return Ok(None);
        }

        replace_post_tags(&mut tx, post.id, &post.tag_ids)
            .await
            .map_err(map_post_db_error)?;
        tx.commit().await.map_err(map_post_db_error)?;

        self.get_post(post.id).await
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(&self, query: PostQuery) -> Result<Vec<Post>, DomainError> {
        let sql = format!(
            "{SELECT_POSTS} WHERE p.published = $1 GROUP BY p.id ORDER BY {} LIMIT $2 OFFSET $3",
            order_by(query.sort)
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(query.published)
            .bind(query.pagination.limit())
            .bind(query.pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        rows.into_iter().map(map_row_to_post).collect()
    }

    async fn count_posts(&self, published: bool) -> Result<i64, DomainError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM posts
            WHERE published = $1
            "#,
        )
        .bind(published)
        .fetch_one(&self.pool)
        .await
        .map_err(map_post_db_error)
    }

    async fn list_posts_by_tag(&self, tag_id: i64) -> Result<Vec<Post>, DomainError> {
        let sql = format!(
            "{SELECT_POSTS}
            WHERE p.published = TRUE
              AND EXISTS (SELECT 1 FROM post_tags t WHERE t.post_id = p.id AND t.tag_id = $1)
            GROUP BY p.id
            ORDER BY {}",
            order_by(PostSort::default())
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(tag_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        rows.into_iter().map(map_row_to_post).collect()
    }
}

async fn replace_post_tags(
    conn: &mut PgConnection,
    post_id: i64,
    tag_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO post_tags (post_id, tag_id)
        SELECT $1, UNNEST($2::BIGINT[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(post_id)
    .bind(tag_ids)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn order_by(sort: PostSort) -> &'static str {
    match (sort.field, sort.direction) {
        (SortField::CreatedAt, SortDirection::Asc) => "p.created_at ASC, p.id ASC",
        (SortField::CreatedAt, SortDirection::Desc) => "p.created_at DESC, p.id DESC",
        (SortField::UpdatedAt, SortDirection::Asc) => "p.updated_at ASC, p.id ASC",
        (SortField::UpdatedAt, SortDirection::Desc) => "p.updated_at DESC, p.id DESC",
        (SortField::Title, SortDirection::Asc) => "p.title ASC, p.id ASC",
        (SortField::Title, SortDirection::Desc) => "p.title DESC, p.id DESC",
        (SortField::Id, SortDirection::Asc) => "p.id ASC",
        (SortField::Id, SortDirection::Desc) => "p.id DESC",
    }
}

fn map_row_to_post(row: PostRow) -> Result<Post, DomainError> {
    Post::new(
        row.id,
        row.title,
        row.content,
        row.published,
        row.user_id,
        row.tag_ids,
        row.created_at,
        row.updated_at,
    )
    .map_err(|err| DomainError::Unexpected(err.to_string()))
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23503") {
            let resource = match db_err.constraint() {
                Some("posts_user_id_fkey") => "user",
                Some("post_tags_tag_id_fkey") => "tag",
                _ => "post reference",
            };
            return DomainError::NotFound(resource.to_string());
        }
    }
    DomainError::Unexpected(err.to_string())
}
