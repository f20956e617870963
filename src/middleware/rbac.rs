// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::{marker::PhantomData, ops::Deref};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::session_from_parts,
    models::rbac::Action,
    services::{
        access::SUPERUSER_ROLE,
        guard::{AuthorizedContext, GuardSpec},
    },
};

/// 1. O Trait que define o que uma rota exige
pub trait Requirement: Send + Sync + 'static {
    const SPEC: GuardSpec;
}

/// 2. O Extractor (Guardião): só existe se o `RouteGuard` liberou a requisição
pub struct Guarded<R>(pub AuthorizedContext, PhantomData<R>);

impl<R> Guarded<R> {
    pub fn context(&self) -> &AuthorizedContext {
        &self.0
    }
}

impl<R> Deref for Guarded<R> {
    type Target = AuthorizedContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// 3. Implementação do FromRequestParts
impl<R, S> FromRequestParts<S> for Guarded<R>
where
    R: Requirement,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // A. Sessão (do `auth_guard` ou do cookie)
        let principal = session_from_parts(parts, &app_state);

        // B. Cargo -> permissão -> escopo, sempre nesta ordem
        let ctx = app_state.guard.guard(principal, &R::SPEC).await?;

        Ok(Guarded(ctx, PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS REQUISITOS (TIPOS)
// ---

pub struct ManageRoles;
impl Requirement for ManageRoles {
    const SPEC: GuardSpec = GuardSpec::roles(&[SUPERUSER_ROLE]);
}

pub struct UsersRead;
impl Requirement for UsersRead {
    const SPEC: GuardSpec = GuardSpec::module("users", Action::Read);
}

pub struct UsersUpdate;
impl Requirement for UsersUpdate {
    const SPEC: GuardSpec = GuardSpec::module("users", Action::Update);
}

pub struct ProgramsRead;
impl Requirement for ProgramsRead {
    const SPEC: GuardSpec = GuardSpec::module("programs", Action::Read);
}
