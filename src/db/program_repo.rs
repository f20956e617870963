// src/db/program_repo.rs

use sqlx::PgPool;

use crate::{common::error::AppError, models::programs::Program, services::guard::AuthorizedContext};

#[derive(Clone)]
pub struct ProgramRepository {
    pool: PgPool,
}

impl ProgramRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Programas da academia; cargos com atribuição só veem os que treinam.
    pub async fn list_scoped(&self, ctx: &AuthorizedContext) -> Result<Vec<Program>, AppError> {
        let mut scoped = ctx.scoped_query(
            "SELECT id, academy_id, name, age_group, coach_id FROM programs",
            "academy_id",
        );

        if let Some(coach_id) = ctx.assignment() {
            scoped.and_eq("coach_id", coach_id);
        }

        scoped.order_by("name");
        scoped.fetch_all(&self.pool).await
    }
}
