// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    common::error::AppError,
    config::{AppConfig, AppState},
    models::auth::Principal,
    services::token::TokenCodec,
};

// O nome do cookie que carrega o token de sessão (o único portador aceito)
pub const SESSION_COOKIE: &str = "auth_token";

/// Lê o cookie de sessão e verifica o token.
/// Ausente, expirado ou adulterado: tudo vira `None` ("anônimo").
pub fn resolve_session(headers: &HeaderMap, tokens: &TokenCodec) -> Option<Principal> {
    let jar = CookieJar::from_headers(headers);
    let cookie = jar.get(SESSION_COOKIE)?;
    tokens.verify(cookie.value())
}

/// Variante para rotas sem caminho anônimo.
pub fn require_session(headers: &HeaderMap, tokens: &TokenCodec) -> Result<Principal, AppError> {
    resolve_session(headers, tokens).ok_or(AppError::Unauthenticated)
}

// O principal já resolvido pelo `auth_guard` fica nos extensions; senão, resolve agora
pub(crate) fn session_from_parts(parts: &Parts, app_state: &AppState) -> Option<Principal> {
    parts
        .extensions
        .get::<Principal>()
        .cloned()
        .or_else(|| resolve_session(&parts.headers, &app_state.tokens))
}

pub fn session_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.is_production())
        .path("/")
        .max_age(cookie::time::Duration::seconds(config.session_ttl.num_seconds()))
        .build()
}

// Valor vazio, Max-Age=0 e Expires no passado: o navegador descarta o cookie
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    cookie.make_removal();
    cookie
}

// O middleware em si: barra quem não tem sessão e guarda o principal na requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = require_session(request.headers(), &app_state.tokens)?;

    // Insere o principal nos "extensions" da requisição
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

// Extrator para obter o principal autenticado diretamente nos handlers
pub struct AuthenticatedUser(pub Principal);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        session_from_parts(parts, &app_state)
            .map(AuthenticatedUser)
            .ok_or(AppError::Unauthenticated)
    }
}
