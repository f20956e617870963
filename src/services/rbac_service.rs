// src/services/rbac_service.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::RbacStore;
use crate::models::rbac::{ModuleWithPermissions, Permission, Role};

/// Ferramentas de administração de cargos (todas atrás do guarda de admin).
#[derive(Clone)]
pub struct RbacService {
    store: Arc<dyn RbacStore>,
}

impl RbacService {
    pub fn new(store: Arc<dyn RbacStore>) -> Self {
        Self { store }
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.store.list_roles().await
    }

    pub async fn list_modules_with_permissions(&self) -> Result<Vec<ModuleWithPermissions>, AppError> {
        self.store.list_modules_with_permissions().await
    }

    pub async fn list_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, AppError> {
        // Cargo inexistente é 404, não uma lista vazia
        if self.store.find_role(role_id).await?.is_none() {
            return Err(AppError::NotFound("Cargo"));
        }
        self.store.list_role_permissions(role_id).await
    }

    /// Substituição em massa: o conjunto enviado passa a ser o conjunto inteiro do cargo.
    pub async fn replace_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: Vec<Uuid>,
    ) -> Result<Vec<Permission>, AppError> {
        // Semântica de conjunto: ids repetidos e ordem não importam
        let ids: Vec<Uuid> = permission_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let updated = self
            .store
            .replace_role_permissions(role_id, &ids)
            .await
            .inspect_err(|e| tracing::warn!(%role_id, "Substituição de permissões recusada: {}", e))?;

        tracing::info!(%role_id, total = updated.len(), "✅ Permissões do cargo substituídas");
        Ok(updated)
    }

    pub async fn delete_role(&self, role_id: Uuid) -> Result<(), AppError> {
        self.store.delete_role(role_id).await?;
        tracing::info!(%role_id, "Cargo excluído");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::rbac::Action;

    #[tokio::test]
    async fn duplicates_collapse_into_a_set() {
        let store = MemoryStore::new();
        let role = store.add_role("coach");
        let module = store.add_module("programs", Some("/programs"), 1);
        let read = store.add_permission(&module, Action::Read);
        let service = RbacService::new(Arc::new(store));

        let updated = service
            .replace_role_permissions(role.id, vec![read.id, read.id, read.id])
            .await
            .unwrap();

        assert_eq!(updated, vec![read]);
    }

    #[tokio::test]
    async fn unknown_role_is_not_found() {
        let service = RbacService::new(Arc::new(MemoryStore::new()));

        assert!(matches!(
            service.list_role_permissions(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.replace_role_permissions(Uuid::new_v4(), vec![]).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn role_in_use_cannot_be_deleted() {
        let store = MemoryStore::new();
        let role = store.add_role("player");
        store.add_user(Uuid::new_v4(), &role, None);
        let unused = store.add_role("legacy");
        let service = RbacService::new(Arc::new(store));

        assert!(matches!(service.delete_role(role.id).await, Err(AppError::RoleInUse)));
        assert!(service.delete_role(unused.id).await.is_ok());
        assert!(matches!(service.delete_role(unused.id).await, Err(AppError::NotFound(_))));
    }
}
