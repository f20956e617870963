// src/db/memory_store.rs

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::rbac_repo::{group_by_module, RbacStore};
use crate::db::tenancy_repo::AcademyDirectory;
use crate::db::user_repo::UserStore;
use crate::models::auth::LoginIdentity;
use crate::models::rbac::{Action, Module, ModuleWithPermissions, Permission, PermissionGraph, Role};
use crate::models::users::{ListUsersQuery, User, UserSort};
use crate::services::guard::AuthorizedContext;

struct UserRecord {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct State {
    roles: HashMap<Uuid, Role>,
    modules: Vec<Module>,
    permissions: HashMap<Uuid, (Uuid, Action)>,
    grants: HashMap<Uuid, BTreeSet<Uuid>>,
    users: HashMap<Uuid, UserRecord>,
}

impl State {
    fn module(&self, module_id: Uuid) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    fn permission(&self, permission_id: Uuid) -> Option<Permission> {
        let (module_id, action) = *self.permissions.get(&permission_id)?;
        let module = self.module(module_id)?;
        Some(Permission {
            id: permission_id,
            module_id,
            module_name: module.name.clone(),
            action,
        })
    }

    fn role_permissions(&self, role_id: Uuid) -> Vec<Permission> {
        let mut permissions: Vec<Permission> = self
            .grants
            .get(&role_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.permission(*id))
            .collect();

        permissions.sort_by_key(|p| {
            let order = self.module(p.module_id).map(|m| m.display_order).unwrap_or(i32::MAX);
            (order, p.module_name.clone(), p.action.as_str())
        });
        permissions
    }
}

/// Implementação em memória de `RbacStore`, `AcademyDirectory` e `UserStore`.
///
/// Os clones compartilham o mesmo estado, então a mesma instância pode servir
/// aos dois traits. Os métodos `add_*`/`grant`/`set_module_active` semeiam os dados.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_role(&self, name: &str) -> Role {
        let role = Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.write().roles.insert(role.id, role.clone());
        role
    }

    pub fn add_module(&self, name: &str, route: Option<&str>, display_order: i32) -> Module {
        let module = Module {
            id: Uuid::new_v4(),
            name: name.to_string(),
            display_name: None,
            icon: None,
            route: route.map(str::to_string),
            is_active: true,
            display_order,
            is_self_service: false,
        };
        self.write().modules.push(module.clone());
        module
    }

    /// Tela "meu próprio registro" (ex.: perfil do jogador).
    pub fn add_self_service_module(&self, name: &str, route: &str, display_order: i32) -> Module {
        let mut module = self.add_module(name, Some(route), display_order);
        module.is_self_service = true;
        if let Some(stored) = self.write().modules.iter_mut().find(|m| m.id == module.id) {
            stored.is_self_service = true;
        }
        module
    }

    pub fn add_permission(&self, module: &Module, action: Action) -> Permission {
        let id = Uuid::new_v4();
        self.write().permissions.insert(id, (module.id, action));
        Permission {
            id,
            module_id: module.id,
            module_name: module.name.clone(),
            action,
        }
    }

    pub fn grant(&self, role: &Role, permission: &Permission) {
        self.write()
            .grants
            .entry(role.id)
            .or_default()
            .insert(permission.id);
    }

    pub fn set_module_active(&self, module_id: Uuid, is_active: bool) {
        if let Some(module) = self.write().modules.iter_mut().find(|m| m.id == module_id) {
            module.is_active = is_active;
        }
    }

    pub fn add_user(&self, user_id: Uuid, role: &Role, academy_id: Option<Uuid>) {
        let user = User {
            id: user_id,
            email: format!("{}@academia.com", user_id),
            full_name: format!("{} {}", role.name, &user_id.simple().to_string()[..8]),
            role_id: role.id,
            academy_id,
            created_at: Utc::now(),
        };
        self.write().users.insert(
            user_id,
            UserRecord {
                user,
                password_hash: String::new(),
            },
        );
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RbacStore for MemoryStore {
    async fn find_role(&self, role_id: Uuid) -> Result<Option<Role>, AppError> {
        Ok(self.read().roles.get(&role_id).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let mut roles: Vec<Role> = self.read().roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn role_grants(&self, role_id: Uuid) -> Result<PermissionGraph, AppError> {
        let state = self.read();
        let graph = state
            .role_permissions(role_id)
            .into_iter()
            .filter(|p| state.module(p.module_id).is_some_and(|m| m.is_active))
            .map(|p| (p.module_name, p.action))
            .collect();
        Ok(graph)
    }

    async fn active_modules(&self) -> Result<Vec<Module>, AppError> {
        let mut modules: Vec<Module> = self
            .read()
            .modules
            .iter()
            .filter(|m| m.is_active)
            .cloned()
            .collect();
        modules.sort_by(|a, b| (a.display_order, &a.name).cmp(&(b.display_order, &b.name)));
        Ok(modules)
    }

    async fn list_modules_with_permissions(&self) -> Result<Vec<ModuleWithPermissions>, AppError> {
        let state = self.read();
        let mut modules = state.modules.clone();
        modules.sort_by(|a, b| (a.display_order, &a.name).cmp(&(b.display_order, &b.name)));

        let mut permissions: Vec<Permission> = state
            .permissions
            .keys()
            .filter_map(|id| state.permission(*id))
            .collect();
        permissions.sort_by_key(|p| p.action.as_str());

        Ok(group_by_module(modules, permissions))
    }

    async fn list_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, AppError> {
        Ok(self.read().role_permissions(role_id))
    }

    async fn replace_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<Vec<Permission>, AppError> {
        // Um único lock de escrita faz o papel da transação
        let mut state = self.write();

        if !state.roles.contains_key(&role_id) {
            return Err(AppError::NotFound("Cargo"));
        }

        let unknown: Vec<Uuid> = permission_ids
            .iter()
            .filter(|id| !state.permissions.contains_key(*id))
            .copied()
            .collect();

        if !unknown.is_empty() {
            return Err(AppError::UnknownPermissions(unknown));
        }

        state
            .grants
            .insert(role_id, permission_ids.iter().copied().collect());

        Ok(state.role_permissions(role_id))
    }

    async fn delete_role(&self, role_id: Uuid) -> Result<(), AppError> {
        let mut state = self.write();

        if !state.roles.contains_key(&role_id) {
            return Err(AppError::NotFound("Cargo"));
        }
        if state.users.values().any(|record| record.user.role_id == role_id) {
            return Err(AppError::RoleInUse);
        }

        state.roles.remove(&role_id);
        state.grants.remove(&role_id);
        Ok(())
    }
}

#[async_trait]
impl AcademyDirectory for MemoryStore {
    async fn academy_of(&self, user_id: Uuid) -> Result<Option<Uuid>, AppError> {
        Ok(self
            .read()
            .users
            .get(&user_id)
            .and_then(|record| record.user.academy_id))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_login_identity(&self, email: &str) -> Result<Option<LoginIdentity>, AppError> {
        let state = self.read();
        let identity = state
            .users
            .values()
            .find(|record| record.user.email == email)
            .and_then(|record| {
                let role = state.roles.get(&record.user.role_id)?;
                Some(LoginIdentity {
                    id: record.user.id,
                    email: record.user.email.clone(),
                    password_hash: record.password_hash.clone(),
                    role_id: role.id,
                    role_name: role.name.clone(),
                })
            });
        Ok(identity)
    }

    async fn list_scoped(&self, ctx: &AuthorizedContext, query: &ListUsersQuery) -> Result<Vec<User>, AppError> {
        let term = query
            .search
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());

        let predicate = ctx.predicate::<User>().and(move |user| match &term {
            Some(term) => {
                user.full_name.to_lowercase().contains(term) || user.email.to_lowercase().contains(term)
            }
            None => true,
        });

        let mut users = predicate.filter(self.read().users.values().map(|record| record.user.clone()));
        match query.sort {
            UserSort::Name => users.sort_by(|a, b| a.full_name.cmp(&b.full_name)),
            UserSort::Email => users.sort_by(|a, b| a.email.cmp(&b.email)),
            UserSort::CreatedAt => users.sort_by_key(|u| u.created_at),
        }

        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit()).unwrap_or(0);
        Ok(users.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_scoped(&self, ctx: &AuthorizedContext, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self
            .read()
            .users
            .get(&id)
            .map(|record| record.user.clone())
            .filter(|user| ctx.predicate::<User>().matches(user)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.read().users.get(&id).map(|record| record.user.clone()))
    }

    async fn update_academy_scoped(
        &self,
        ctx: &AuthorizedContext,
        id: Uuid,
        academy_id: Option<Uuid>,
    ) -> Result<Option<User>, AppError> {
        // Checagem e escrita sob o mesmo lock, como o WHERE do UPDATE
        let mut state = self.write();
        let Some(record) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if !ctx.tenant().matches(record.user.academy_id) {
            return Ok(None);
        }

        record.user.academy_id = academy_id;
        Ok(Some(record.user.clone()))
    }
}
