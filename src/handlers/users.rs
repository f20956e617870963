// src/handlers/users.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{Guarded, UsersRead, UsersUpdate},
    models::users::{ListUsersQuery, UpdateUserAcademyPayload, User},
};

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Usuários visíveis no escopo do chamador", body = Vec<User>),
        (status = 403, description = "Sem permissão users:read")
    ),
    security(("session_cookie" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    guard: Guarded<UsersRead>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    query.validate().map_err(AppError::ValidationError)?;

    let users = app_state.users.list_scoped(guard.context(), &query).await?;
    Ok(Json(users))
}

// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "ID do Usuário")
    ),
    responses(
        (status = 200, description = "O usuário", body = User),
        (status = 404, description = "Inexistente ou fora do escopo")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    guard: Guarded<UsersRead>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = app_state
        .users
        .find_scoped(guard.context(), user_id)
        .await?
        .ok_or(AppError::NotFound("Usuário"))?;

    Ok(Json(user))
}

// PUT /api/users/{id}/academy
#[utoipa::path(
    put,
    path = "/api/users/{id}/academy",
    tag = "Users",
    request_body = UpdateUserAcademyPayload,
    params(
        ("id" = Uuid, Path, description = "ID do Usuário")
    ),
    responses(
        (status = 200, description = "Usuário com a nova academia", body = User),
        (status = 403, description = "Registro ou academia de destino fora do escopo"),
        (status = 404, description = "Usuário ou academia inexistente")
    ),
    security(("session_cookie" = []))
)]
pub async fn update_user_academy(
    State(app_state): State<AppState>,
    guard: Guarded<UsersUpdate>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserAcademyPayload>,
) -> Result<Json<User>, AppError> {
    // A academia de destino é a minha?
    guard.ensure_can_assign(payload.academy_id)?;

    // O escopo vai no WHERE do próprio UPDATE
    let updated = match app_state
        .users
        .update_academy_scoped(guard.context(), user_id, payload.academy_id)
        .await?
    {
        Some(user) => user,
        None => {
            // Nada foi alterado: inexistente (404) ou de outra academia (403)
            let current = app_state
                .users
                .find_by_id(user_id)
                .await?
                .ok_or(AppError::NotFound("Usuário"))?;

            guard.ensure_contains(current.academy_id)?;
            return Err(guard.stale_scope(current.academy_id));
        }
    };

    tracing::info!(
        actor = %guard.principal().user_id,
        %user_id,
        academy_id = ?updated.academy_id,
        "Academia do usuário atualizada"
    );
    Ok(Json(updated))
}
