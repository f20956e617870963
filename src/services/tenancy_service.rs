// src/services/tenancy_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AcademyDirectory,
    models::{auth::Principal, tenancy::TenantFilter},
    services::access::is_superuser,
};

/// Resolvedor de tenant: descobre a qual academia o principal está preso.
#[derive(Clone)]
pub struct TenantScopeResolver {
    directory: Arc<dyn AcademyDirectory>,
    // Cargos cujo escopo ainda é estreitado aos registros atribuídos a eles (ex.: treinador)
    assignment_scoped_roles: Arc<[String]>,
}

impl TenantScopeResolver {
    pub fn new(directory: Arc<dyn AcademyDirectory>, assignment_scoped_roles: &[String]) -> Self {
        Self {
            directory,
            assignment_scoped_roles: assignment_scoped_roles.into(),
        }
    }

    pub async fn scope_for(&self, principal: &Principal) -> Result<TenantFilter, AppError> {
        if is_superuser(principal) {
            return Ok(TenantFilter::Unrestricted);
        }

        match self.directory.academy_of(principal.user_id).await? {
            Some(academy_id) => Ok(TenantFilter::RestrictedTo(academy_id)),
            None => {
                // Sem academia não é erro nem privilégio: simplesmente não vê nada
                tracing::debug!(user_id = %principal.user_id, "Usuário sem academia; escopo vazio");
                Ok(TenantFilter::Empty)
            }
        }
    }

    /// Segunda dimensão de escopo: `Some(user_id)` quando o cargo só enxerga
    /// o que foi atribuído ao próprio usuário.
    pub fn assignment_for(&self, principal: &Principal) -> Option<Uuid> {
        if is_superuser(principal) {
            return None;
        }

        self.assignment_scoped_roles
            .iter()
            .any(|role| *role == principal.role_name)
            .then_some(principal.user_id)
    }
}
