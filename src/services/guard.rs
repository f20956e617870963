// src/services/guard.rs

use sqlx::{Encode, Postgres, Type};
use uuid::Uuid;

use crate::{
    common::error::{AppError, ForbiddenReason},
    db::scoped_query::ScopedQuery,
    models::{
        auth::Principal,
        rbac::Action,
        tenancy::{ScopePredicate, TenantFilter, TenantScoped},
    },
    services::{
        access::AccessControl,
        tenancy_service::TenantScopeResolver,
    },
};

/// O que uma rota exige além de uma sessão válida.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardSpec {
    pub required_roles: Option<&'static [&'static str]>,
    pub required_module: Option<(&'static str, Action)>,
}

impl GuardSpec {
    pub const fn authenticated() -> Self {
        Self {
            required_roles: None,
            required_module: None,
        }
    }

    pub const fn roles(roles: &'static [&'static str]) -> Self {
        Self {
            required_roles: Some(roles),
            required_module: None,
        }
    }

    pub const fn module(name: &'static str, action: Action) -> Self {
        Self {
            required_roles: None,
            required_module: Some((name, action)),
        }
    }
}

/// Contexto já autorizado e com escopo resolvido.
///
/// Só o `RouteGuard` constrói um; a lógica de negócio monta TODAS as consultas
/// sobre dados de academia a partir dele e nunca recalcula o escopo por conta própria.
#[derive(Debug, Clone)]
pub struct AuthorizedContext {
    principal: Principal,
    tenant: TenantFilter,
    assigned_to: Option<Uuid>,
}

impl AuthorizedContext {
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn tenant(&self) -> TenantFilter {
        self.tenant
    }

    /// Segunda dimensão (ex.: treinador só vê os próprios programas).
    pub fn assignment(&self) -> Option<Uuid> {
        self.assigned_to
    }

    /// Consulta SQL já com o escopo de academia na cláusula WHERE.
    pub fn scoped_query<'args>(&self, select: &str, academy_column: &'static str) -> ScopedQuery<'args> {
        ScopedQuery::new(select, &self.tenant, academy_column)
    }

    /// `UPDATE` cujo WHERE já começa pelo escopo de academia.
    pub fn scoped_update<'args, T>(
        &self,
        table: &'static str,
        column: &'static str,
        value: T,
        academy_column: &'static str,
    ) -> ScopedQuery<'args>
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        ScopedQuery::update(table, column, value, &self.tenant, academy_column)
    }

    /// Predicado em memória, componível com `.and(...)`.
    pub fn predicate<T: TenantScoped>(&self) -> ScopePredicate<T> {
        self.tenant.predicate()
    }

    /// Mutação sobre um registro existente de outra academia: `Forbidden`.
    pub fn ensure_contains(&self, record_academy: Option<Uuid>) -> Result<(), AppError> {
        self.tenant
            .ensure_contains(record_academy)
            .inspect_err(|_| self.log_tenant_denial(record_academy))
    }

    /// Atribuir algo a uma academia que não é a sua: `Forbidden`.
    pub fn ensure_can_assign(&self, target_academy: Option<Uuid>) -> Result<(), AppError> {
        self.tenant
            .ensure_can_assign(target_academy)
            .inspect_err(|_| self.log_tenant_denial(target_academy))
    }

    /// A mutação escopada não afetou nada, mas o registro existe e está no escopo:
    /// ele mudou de academia no meio do caminho.
    pub fn stale_scope(&self, record_academy: Option<Uuid>) -> AppError {
        self.log_tenant_denial(record_academy);
        AppError::Forbidden(ForbiddenReason::TenantMismatch)
    }

    fn log_tenant_denial(&self, academy: Option<Uuid>) {
        tracing::warn!(
            user_id = %self.principal.user_id,
            role = %self.principal.role_name,
            scope = ?self.tenant,
            target_academy = ?academy,
            "Acesso negado: {}",
            ForbiddenReason::TenantMismatch
        );
    }
}

/// Ponto único de controle: sessão -> cargo -> permissão -> escopo.
#[derive(Clone)]
pub struct RouteGuard {
    access: AccessControl,
    tenancy: TenantScopeResolver,
}

impl RouteGuard {
    pub fn new(access: AccessControl, tenancy: TenantScopeResolver) -> Self {
        Self { access, tenancy }
    }

    pub fn require_authenticated(&self, principal: Option<Principal>) -> Result<Principal, AppError> {
        principal.ok_or(AppError::Unauthenticated)
    }

    pub fn require_role(&self, principal: Option<Principal>, roles: &[&str]) -> Result<Principal, AppError> {
        let principal = self.require_authenticated(principal)?;

        if roles.iter().any(|role| *role == principal.role_name) {
            return Ok(principal);
        }

        tracing::warn!(
            user_id = %principal.user_id,
            role = %principal.role_name,
            required = ?roles,
            "Acesso negado: {}",
            ForbiddenReason::RoleMismatch
        );
        Err(AppError::Forbidden(ForbiddenReason::RoleMismatch))
    }

    pub async fn require_module_permission(
        &self,
        principal: Option<Principal>,
        module: &str,
        action: Action,
    ) -> Result<Principal, AppError> {
        let principal = self.require_authenticated(principal)?;

        self.access
            .authorize(Some(&principal), module, action)
            .await?
            .into_result()
            .inspect_err(|_| {
                tracing::warn!(
                    user_id = %principal.user_id,
                    role = %principal.role_name,
                    module,
                    action = %action,
                    "Acesso negado: {}",
                    ForbiddenReason::MissingPermission
                )
            })?;

        Ok(principal)
    }

    /// Cada passo interrompe no primeiro erro, nesta ordem.
    pub async fn guard(&self, principal: Option<Principal>, spec: &GuardSpec) -> Result<AuthorizedContext, AppError> {
        // 1. Sessão
        let mut principal = self.require_authenticated(principal)?;

        // 2. Cargo
        if let Some(roles) = spec.required_roles {
            principal = self.require_role(Some(principal), roles)?;
        }

        // 3. Módulo + ação
        if let Some((module, action)) = spec.required_module {
            principal = self.require_module_permission(Some(principal), module, action).await?;
        }

        // 4. Escopo de academia
        let tenant = self.tenancy.scope_for(&principal).await?;
        let assigned_to = self.tenancy.assignment_for(&principal);

        Ok(AuthorizedContext {
            principal,
            tenant,
            assigned_to,
        })
    }
}
