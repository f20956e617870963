// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use crate::handlers;
use crate::middleware::auth::SESSION_COOKIE;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::get_me,

        // --- RBAC ---
        handlers::rbac::list_roles,
        handlers::rbac::list_modules,
        handlers::rbac::list_role_permissions,
        handlers::rbac::replace_role_permissions,
        handlers::rbac::delete_role,
        handlers::rbac::get_menu,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user_academy,

        // --- Programs ---
        handlers::programs::list_programs,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Principal,
            models::auth::LoginUserPayload,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::Action,
            models::rbac::Module,
            models::rbac::Permission,
            models::rbac::ModuleWithPermissions,
            models::rbac::ReplaceRolePermissionsPayload,
            models::rbac::MenuItem,

            // --- Users ---
            models::users::User,
            models::users::UserSort,
            models::users::UpdateUserAcademyPayload,

            // --- Programs ---
            models::programs::Program,
        )
    ),
    tags(
        (name = "Auth", description = "Login, logout e sessão atual"),
        (name = "RBAC", description = "Controle de Acesso (Cargos, Permissões e Menu)"),
        (name = "Users", description = "Usuários da academia"),
        (name = "Programs", description = "Programas de treino")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(
                ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))
            ),
        );
    }
}
