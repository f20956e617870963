// src/handlers/programs.rs

use axum::{extract::State, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{Guarded, ProgramsRead},
    models::programs::Program,
};

// GET /api/programs
#[utoipa::path(
    get,
    path = "/api/programs",
    tag = "Programs",
    responses(
        (status = 200, description = "Programas da academia (treinadores: só os seus)", body = Vec<Program>),
        (status = 403, description = "Sem permissão programs:read")
    ),
    security(("session_cookie" = []))
)]
pub async fn list_programs(
    State(app_state): State<AppState>,
    guard: Guarded<ProgramsRead>,
) -> Result<Json<Vec<Program>>, AppError> {
    let programs = app_state.program_repo.list_scoped(guard.context()).await?;
    Ok(Json(programs))
}
