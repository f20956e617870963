// src/router.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout));

    // Tudo abaixo exige sessão; os guardas de cargo/permissão ficam nos extratores
    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        .route("/menu", get(handlers::rbac::get_menu))
        // Administração de cargos (apenas admin)
        .route("/roles", get(handlers::rbac::list_roles))
        .route("/roles/{id}", delete(handlers::rbac::delete_role))
        .route(
            "/roles/{id}/permissions",
            get(handlers::rbac::list_role_permissions).put(handlers::rbac::replace_role_permissions),
        )
        .route("/modules", get(handlers::rbac::list_modules))
        // Recursos com escopo de academia
        .route("/users", get(handlers::users::list_users))
        .route("/users/{id}", get(handlers::users::get_user))
        .route("/users/{id}/academy", put(handlers::users::update_user_academy))
        .route("/programs", get(handlers::programs::list_programs))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .with_state(app_state)
}
