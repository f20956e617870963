// src/models/programs.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::tenancy::TenantScoped;

// Um programa de treino (turma / faixa etária) de uma academia
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: Uuid,
    pub academy_id: Uuid,
    #[schema(example = "Sub-15 Manhã")]
    pub name: String,
    #[schema(example = "U15")]
    pub age_group: Option<String>,
    // Treinador responsável; é a segunda dimensão de escopo
    pub coach_id: Option<Uuid>,
}

impl TenantScoped for Program {
    fn academy_id(&self) -> Option<Uuid> {
        Some(self.academy_id)
    }
}
