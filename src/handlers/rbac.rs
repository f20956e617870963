// src/handlers/rbac.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{Guarded, ManageRoles},
    },
    models::rbac::{MenuItem, ModuleWithPermissions, Permission, ReplaceRolePermissionsPayload, Role},
};

// GET /api/roles
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "RBAC",
    responses(
        (status = 200, description = "Todos os cargos", body = Vec<Role>),
        (status = 403, description = "Apenas administradores")
    ),
    security(("session_cookie" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    _guard: Guarded<ManageRoles>,
) -> Result<Json<Vec<Role>>, AppError> {
    let roles = app_state.rbac_service.list_roles().await?;
    Ok(Json(roles))
}

// GET /api/modules (a tela de edição de permissões usa isto)
#[utoipa::path(
    get,
    path = "/api/modules",
    tag = "RBAC",
    responses(
        (status = 200, description = "Módulos com suas permissões", body = Vec<ModuleWithPermissions>),
        (status = 403, description = "Apenas administradores")
    ),
    security(("session_cookie" = []))
)]
pub async fn list_modules(
    State(app_state): State<AppState>,
    _guard: Guarded<ManageRoles>,
) -> Result<Json<Vec<ModuleWithPermissions>>, AppError> {
    let modules = app_state.rbac_service.list_modules_with_permissions().await?;
    Ok(Json(modules))
}

// GET /api/roles/{id}/permissions
#[utoipa::path(
    get,
    path = "/api/roles/{id}/permissions",
    tag = "RBAC",
    params(
        ("id" = Uuid, Path, description = "ID do Cargo")
    ),
    responses(
        (status = 200, description = "Permissões concedidas ao cargo", body = Vec<Permission>),
        (status = 404, description = "Cargo não encontrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn list_role_permissions(
    State(app_state): State<AppState>,
    _guard: Guarded<ManageRoles>,
    Path(role_id): Path<Uuid>,
) -> Result<Json<Vec<Permission>>, AppError> {
    let permissions = app_state.rbac_service.list_role_permissions(role_id).await?;
    Ok(Json(permissions))
}

// PUT /api/roles/{id}/permissions
#[utoipa::path(
    put,
    path = "/api/roles/{id}/permissions",
    tag = "RBAC",
    request_body = ReplaceRolePermissionsPayload,
    params(
        ("id" = Uuid, Path, description = "ID do Cargo")
    ),
    responses(
        (status = 200, description = "O novo conjunto completo de permissões", body = Vec<Permission>),
        (status = 400, description = "Algum id de permissão não existe; nada foi alterado"),
        (status = 404, description = "Cargo não encontrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn replace_role_permissions(
    State(app_state): State<AppState>,
    _guard: Guarded<ManageRoles>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<ReplaceRolePermissionsPayload>,
) -> Result<Json<Vec<Permission>>, AppError> {
    let permissions = app_state
        .rbac_service
        .replace_role_permissions(role_id, payload.permission_ids)
        .await?;

    Ok(Json(permissions))
}

// DELETE /api/roles/{id}
#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    tag = "RBAC",
    params(
        ("id" = Uuid, Path, description = "ID do Cargo")
    ),
    responses(
        (status = 204, description = "Cargo excluído"),
        (status = 404, description = "Cargo não encontrado"),
        (status = 409, description = "Ainda há usuários com este cargo")
    ),
    security(("session_cookie" = []))
)]
pub async fn delete_role(
    State(app_state): State<AppState>,
    _guard: Guarded<ManageRoles>,
    Path(role_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.rbac_service.delete_role(role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/menu
#[utoipa::path(
    get,
    path = "/api/menu",
    tag = "RBAC",
    responses(
        (status = 200, description = "Itens de menu que o usuário pode acessar", body = Vec<MenuItem>),
        (status = 401, description = "Sem sessão válida")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_menu(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    let items = app_state.access.accessible_menu_items(&principal).await?;
    Ok(Json(items))
}
