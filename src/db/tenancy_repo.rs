// src/db/tenancy_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;

/// De onde o resolvedor de tenant descobre a academia de um usuário.
#[async_trait]
pub trait AcademyDirectory: Send + Sync {
    /// `None` tanto para usuário sem academia quanto para usuário inexistente:
    /// nos dois casos o escopo resultante é vazio.
    async fn academy_of(&self, user_id: Uuid) -> Result<Option<Uuid>, AppError>;
}

#[derive(Clone)]
pub struct TenancyRepository {
    pool: PgPool,
}

impl TenancyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AcademyDirectory for TenancyRepository {
    async fn academy_of(&self, user_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let academy = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT academy_id FROM users WHERE id = $1",
        )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        // Linha ausente (None) e coluna nula (Some(None)) dão no mesmo
        Ok(academy.flatten())
    }
}
