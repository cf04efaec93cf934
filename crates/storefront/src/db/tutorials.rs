//! Care tutorial repository.

use serde::Deserialize;
use sqlx::PgPool;

use kanak_core::{MetalType, TutorialId};

use super::RepositoryError;
use crate::models::catalog::CareTutorial;

const TUTORIAL_COLUMNS: &str =
    "id, title, slug, metal, body, video_url, sort_order, is_published, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct TutorialInput {
    pub title: String,
    pub slug: String,
    pub metal: Option<MetalType>,
    pub body: String,
    pub video_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

const fn default_published() -> bool {
    true
}

/// Repository for care tutorial database operations.
pub struct TutorialRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TutorialRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Published tutorials. Filtering by metal keeps the general ones too.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(
        &self,
        metal: Option<MetalType>,
    ) -> Result<Vec<CareTutorial>, RepositoryError> {
        let tutorials = sqlx::query_as::<_, CareTutorial>(&format!(
            r"
            SELECT {TUTORIAL_COLUMNS} FROM store.care_tutorials
            WHERE is_published
              AND ($1::store.metal_type IS NULL OR metal IS NULL OR metal = $1)
            ORDER BY sort_order, title
            "
        ))
        .bind(metal)
        .fetch_all(self.pool)
        .await?;

        Ok(tutorials)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_published(&self, slug: &str) -> Result<Option<CareTutorial>, RepositoryError> {
        let tutorial = sqlx::query_as::<_, CareTutorial>(&format!(
            "SELECT {TUTORIAL_COLUMNS} FROM store.care_tutorials WHERE slug = $1 AND is_published"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(tutorial)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &TutorialInput) -> Result<CareTutorial, RepositoryError> {
        sqlx::query_as::<_, CareTutorial>(&format!(
            r"
            INSERT INTO store.care_tutorials
                (title, slug, metal, body, video_url, sort_order, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TUTORIAL_COLUMNS}
            "
        ))
        .bind(&input.title)
        .bind(&input.slug)
        .bind(input.metal)
        .bind(&input.body)
        .bind(&input.video_url)
        .bind(input.sort_order)
        .bind(input.is_published)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "tutorial slug already exists"))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the tutorial doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        id: TutorialId,
        input: &TutorialInput,
    ) -> Result<CareTutorial, RepositoryError> {
        sqlx::query_as::<_, CareTutorial>(&format!(
            r"
            UPDATE store.care_tutorials
            SET title = $2, slug = $3, metal = $4, body = $5, video_url = $6,
                sort_order = $7, is_published = $8
            WHERE id = $1
            RETURNING {TUTORIAL_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.slug)
        .bind(input.metal)
        .bind(&input.body)
        .bind(&input.video_url)
        .bind(input.sort_order)
        .bind(input.is_published)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "tutorial slug already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the tutorial doesn't exist.
    pub async fn delete(&self, id: TutorialId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.care_tutorials WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Insert or update by slug. Used by catalog seeding.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, input: &TutorialInput) -> Result<TutorialId, RepositoryError> {
        let (id,): (TutorialId,) = sqlx::query_as(
            r"
            INSERT INTO store.care_tutorials
                (title, slug, metal, body, video_url, sort_order, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (slug) DO UPDATE SET
                title = EXCLUDED.title, metal = EXCLUDED.metal, body = EXCLUDED.body,
                video_url = EXCLUDED.video_url, sort_order = EXCLUDED.sort_order,
                is_published = EXCLUDED.is_published
            RETURNING id
            ",
        )
        .bind(&input.title)
        .bind(&input.slug)
        .bind(input.metal)
        .bind(&input.body)
        .bind(&input.video_url)
        .bind(input.sort_order)
        .bind(input.is_published)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }
}
