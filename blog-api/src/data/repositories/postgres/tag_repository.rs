use async_trait::async_trait;
use sqlx::PgPool;

use crate::data::tag_repository::TagRepository;
use crate::domain::error::DomainError;
use crate::domain::tag::Tag;

#[derive(Debug, Clone)]
pub(crate) struct PostgresTagRepository {
    pool: PgPool,
}

impl PostgresTagRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn create_tag(&self, name: &str) -> Result<Tag, DomainError> {
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            INSERT INTO tags (name)
            VALUES ($1)
            RETURNING id, name
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_tag_db_error)?;

        map_row_to_tag(row)
    }

    async fn get_tag(&self, id: i64) -> Result<Option<Tag>, DomainError> {
        let row = sqlx::query_as::<_, TagRow>("SELECT id, name FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_tag_db_error)?;

        row.map(map_row_to_tag).transpose()
    }

    async fn list_tags(&self, name_contains: Option<&str>) -> Result<Vec<Tag>, DomainError> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, name
            FROM tags
            WHERE $1::TEXT IS NULL OR POSITION(LOWER($1) IN LOWER(name)) > 0
            ORDER BY name, id
            "#,
        )
        .bind(name_contains)
        .fetch_all(&self.pool)
        .await
        .map_err(map_tag_db_error)?;

        rows.into_iter().map(map_row_to_tag).collect()
    }

    async fn find_all_by_id(&self, ids: &[i64]) -> Result<Vec<Tag>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, name
            FROM tags
            WHERE id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_tag_db_error)?;

        rows.into_iter().map(map_row_to_tag).collect()
    }

    async fn update_tag(&self, tag: &Tag) -> Result<Option<Tag>, DomainError> {
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            UPDATE tags
            SET name = $2
            WHERE id = $1
            RETURNING id, name
            "#,
        )
        .bind(tag.id)
        .bind(&tag.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_tag_db_error)?;

        row.map(map_row_to_tag).transpose()
    }

    async fn delete_tag(&self, id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_tag_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}

fn map_row_to_tag(row: TagRow) -> Result<Tag, DomainError> {
    Tag::new(row.id, row.name).map_err(|err| DomainError::Unexpected(err.to_string()))
}

fn map_tag_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return DomainError::AlreadyExists("tag name".to_string());
        }
    }
    DomainError::Unexpected(err.to_string())
}
