// src/services/access.rs

use std::sync::Arc;

use crate::{
    common::error::{AppError, ForbiddenReason},
    db::RbacStore,
    models::{
        auth::Principal,
        rbac::{Action, MenuItem, Module, PermissionGraph},
    },
};

/// O único cargo que ignora o grafo de permissões e o escopo de academia.
/// Nenhum outro lugar do código compara nomes de cargo com literais.
pub const SUPERUSER_ROLE: &str = "admin";

pub fn is_superuser(principal: &Principal) -> bool {
    principal.role_name == SUPERUSER_ROLE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied(Denial::Unauthenticated) => Err(AppError::Unauthenticated),
            Decision::Denied(Denial::Forbidden) => {
                Err(AppError::Forbidden(ForbiddenReason::MissingPermission))
            }
        }
    }
}

/// Motor de autorização: decide `(principal, módulo, ação)` e deriva o menu.
///
/// Cada chamada a `authorize` relê o grafo do cargo; quem precisa de várias
/// decisões na mesma requisição pode carregar o grafo uma vez (`load_graph`)
/// e usar `decide`.
#[derive(Clone)]
pub struct AccessControl {
    store: Arc<dyn RbacStore>,
}

impl AccessControl {
    pub fn new(store: Arc<dyn RbacStore>) -> Self {
        Self { store }
    }

    pub async fn load_graph(&self, principal: &Principal) -> Result<PermissionGraph, AppError> {
        self.store.role_grants(principal.role_id).await
    }

    pub fn decide(principal: &Principal, graph: &PermissionGraph, module: &str, action: Action) -> Decision {
        if is_superuser(principal) || graph.allows(module, action) {
            Decision::Allowed
        } else {
            Decision::Denied(Denial::Forbidden)
        }
    }

    pub async fn authorize(
        &self,
        principal: Option<&Principal>,
        module: &str,
        action: Action,
    ) -> Result<Decision, AppError> {
        let Some(principal) = principal else {
            return Ok(Decision::Denied(Denial::Unauthenticated));
        };

        // O admin nem chega a consultar o banco
        if is_superuser(principal) {
            return Ok(Decision::Allowed);
        }

        let graph = self.load_graph(principal).await?;
        Ok(Self::decide(principal, &graph, module, action))
    }

    /// Módulos que o principal enxerga no menu, na ordem de exibição.
    ///
    /// - admin: todos os módulos ativos com rota, menos as telas de autoatendimento;
    /// - demais: módulos ativos com rota onde o cargo tem QUALQUER ação.
    pub async fn accessible_modules(&self, principal: &Principal) -> Result<Vec<Module>, AppError> {
        let active = self.store.active_modules().await?;

        let modules = if is_superuser(principal) {
            active
                .into_iter()
                .filter(|m| m.route.is_some() && !m.is_self_service)
                .collect()
        } else {
            let graph = self.load_graph(principal).await?;
            active
                .into_iter()
                .filter(|m| m.route.is_some() && graph.touches(&m.name))
                .collect()
        };

        Ok(modules)
    }

    pub async fn accessible_menu_items(&self, principal: &Principal) -> Result<Vec<MenuItem>, AppError> {
        let modules = self.accessible_modules(principal).await?;
        Ok(modules.iter().filter_map(MenuItem::from_module).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use uuid::Uuid;

    fn principal_for(role: &crate::models::rbac::Role) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            email: "alguem@academia.com".into(),
            role_id: role.id,
            role_name: role.name.clone(),
        }
    }

    #[tokio::test]
    async fn anonymous_is_unauthenticated() {
        let access = AccessControl::new(Arc::new(MemoryStore::new()));

        let decision = access.authorize(None, "users", Action::Read).await.unwrap();

        assert_eq!(decision, Decision::Denied(Denial::Unauthenticated));
        assert!(matches!(decision.into_result(), Err(AppError::Unauthenticated)));
    }

    #[tokio::test]
    async fn admin_is_allowed_everything_without_any_grant() {
        let store = MemoryStore::new();
        let admin = store.add_role(SUPERUSER_ROLE);
        let access = AccessControl::new(Arc::new(store));
        let p = principal_for(&admin);

        for module in ["users", "programs", "nao_existe"] {
            for action in Action::ALL {
                let decision = access.authorize(Some(&p), module, action).await.unwrap();
                assert!(decision.is_allowed(), "{}:{}", module, action);
            }
        }
    }

    #[tokio::test]
    async fn grant_is_exact_per_action() {
        let store = MemoryStore::new();
        let coach = store.add_role("coach");
        let programs = store.add_module("programs", Some("/programs"), 1);
        let read = store.add_permission(&programs, Action::Read);
        store.add_permission(&programs, Action::Delete);
        store.grant(&coach, &read);
        let access = AccessControl::new(Arc::new(store));
        let p = principal_for(&coach);

        assert!(access.authorize(Some(&p), "programs", Action::Read).await.unwrap().is_allowed());
        assert_eq!(
            access.authorize(Some(&p), "programs", Action::Delete).await.unwrap(),
            Decision::Denied(Denial::Forbidden)
        );
    }

    #[tokio::test]
    async fn admin_menu_skips_self_service_and_routeless_modules() {
        let store = MemoryStore::new();
        let admin = store.add_role(SUPERUSER_ROLE);
        store.add_module("users", Some("/users"), 2);
        store.add_module("programs", Some("/programs"), 1);
        store.add_module("reports_api", None, 3);
        store.add_self_service_module("my_profile", "/me", 0);
        let hidden = store.add_module("medals", Some("/medals"), 4);
        store.set_module_active(hidden.id, false);
        let access = AccessControl::new(Arc::new(store));

        let names: Vec<String> = access
            .accessible_menu_items(&principal_for(&admin))
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();

        assert_eq!(names, vec!["programs", "users"]);
    }
}
