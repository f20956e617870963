// src/db/rbac_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::rbac::{Action, Module, ModuleWithPermissions, Permission, PermissionGraph, Role};

/// Tudo o que o motor de autorização e as ferramentas de admin precisam ler
/// (ou substituir) sobre cargos, módulos e permissões.
#[async_trait]
pub trait RbacStore: Send + Sync {
    async fn find_role(&self, role_id: Uuid) -> Result<Option<Role>, AppError>;

    async fn list_roles(&self) -> Result<Vec<Role>, AppError>;

    /// Grafo módulo -> ações do cargo, apenas com módulos ATIVOS.
    /// Cargo sem concessões devolve um grafo vazio.
    async fn role_grants(&self, role_id: Uuid) -> Result<PermissionGraph, AppError>;

    /// Módulos ativos, ordenados por `display_order`.
    async fn active_modules(&self) -> Result<Vec<Module>, AppError>;

    async fn list_modules_with_permissions(&self) -> Result<Vec<ModuleWithPermissions>, AppError>;

    async fn list_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, AppError>;

    /// Substitui TODO o conjunto de permissões do cargo, tudo-ou-nada.
    /// `NotFound` se o cargo não existe, `UnknownPermissions` se algum id não existe;
    /// em ambos os casos as concessões anteriores ficam intactas.
    async fn replace_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<Vec<Permission>, AppError>;

    /// Recusa com `RoleInUse` enquanto algum usuário apontar para o cargo.
    async fn delete_role(&self, role_id: Uuid) -> Result<(), AppError>;
}

const MODULE_COLUMNS: &str =
    "id, name, display_name, icon, route, is_active, display_order, is_self_service";

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Permissões do cargo com o nome do módulo; aceita pool ou transação
    async fn fetch_role_permissions<'e, E>(
        executor: E,
        role_id: Uuid,
    ) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.module_id, m.name AS module_name, p.action
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            JOIN modules m ON m.id = p.module_id
            WHERE rp.role_id = $1
            ORDER BY m.display_order, m.name, p.action
            "#,
        )
            .bind(role_id)
            .fetch_all(executor)
            .await?;

        Ok(permissions)
    }
}

#[async_trait]
impl RbacStore for RbacRepository {
    async fn find_role(&self, role_id: Uuid) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    async fn role_grants(&self, role_id: Uuid) -> Result<PermissionGraph, AppError> {
        // Módulo inativo nunca concede nada, qualquer que seja a concessão
        let rows = sqlx::query_as::<_, (String, Action)>(
            r#"
            SELECT m.name, p.action
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            JOIN modules m ON m.id = p.module_id
            WHERE rp.role_id = $1
              AND m.is_active = true
            "#,
        )
            .bind(role_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    async fn active_modules(&self) -> Result<Vec<Module>, AppError> {
        let modules = sqlx::query_as::<_, Module>(&format!(
            "SELECT {MODULE_COLUMNS} FROM modules WHERE is_active = true ORDER BY display_order, name"
        ))
            .fetch_all(&self.pool)
            .await?;

        Ok(modules)
    }

    async fn list_modules_with_permissions(&self) -> Result<Vec<ModuleWithPermissions>, AppError> {
        let modules = sqlx::query_as::<_, Module>(&format!(
            "SELECT {MODULE_COLUMNS} FROM modules ORDER BY display_order, name"
        ))
            .fetch_all(&self.pool)
            .await?;

        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.module_id, m.name AS module_name, p.action
            FROM permissions p
            JOIN modules m ON m.id = p.module_id
            ORDER BY p.action
            "#,
        )
            .fetch_all(&self.pool)
            .await?;

        Ok(group_by_module(modules, permissions))
    }

    async fn list_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, AppError> {
        Self::fetch_role_permissions(&self.pool, role_id).await
    }

    async fn replace_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<Vec<Permission>, AppError> {
        // 1. Inicia Transação (READ COMMITTED: ninguém enxerga o estado intermediário vazio)
        let mut tx = self.pool.begin().await?;

        // 2. Trava o cargo; substituições concorrentes no mesmo cargo ficam em fila
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = $1 FOR UPDATE")
            .bind(role_id)
            .fetch_optional(&mut *tx)
            .await?;

        if role.is_none() {
            // Sair daqui descarta `tx`, que faz rollback automático
            return Err(AppError::NotFound("Cargo"));
        }

        // 3. Todos os ids precisam existir
        let known = sqlx::query_scalar::<_, Uuid>("SELECT id FROM permissions WHERE id = ANY($1)")
            .bind(permission_ids)
            .fetch_all(&mut *tx)
            .await?;

        let unknown: Vec<Uuid> = permission_ids
            .iter()
            .filter(|id| !known.contains(*id))
            .copied()
            .collect();

        if !unknown.is_empty() {
            return Err(AppError::UnknownPermissions(unknown));
        }

        // 4. Apaga tudo e insere o conjunto novo
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        if !permission_ids.is_empty() {
            // Inserção em massa usando UNNEST
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                SELECT $1, unnest($2::uuid[])
                "#,
            )
                .bind(role_id)
                .bind(permission_ids)
                .execute(&mut *tx)
                .await?;
        }

        let updated = Self::fetch_role_permissions(&mut *tx, role_id).await?;

        // 5. Commit
        tx.commit().await?;

        Ok(updated)
    }

    async fn delete_role(&self, role_id: Uuid) -> Result<(), AppError> {
        // Checagem e exclusão no mesmo comando: não há janela entre as duas
        let result = sqlx::query(
            r#"
            DELETE FROM roles r
            WHERE r.id = $1
              AND NOT EXISTS (SELECT 1 FROM users u WHERE u.role_id = r.id)
            "#,
        )
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                // A FK users.role_id também protege contra um usuário criado no meio do caminho
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::RoleInUse;
                    }
                }
                e.into()
            })?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nada foi apagado: ou o cargo não existe, ou ainda está em uso
        match self.find_role(role_id).await? {
            None => Err(AppError::NotFound("Cargo")),
            Some(_) => Err(AppError::RoleInUse),
        }
    }
}

/// Agrupa as permissões debaixo do seu módulo, preservando a ordem dos módulos.
pub(crate) fn group_by_module(
    modules: Vec<Module>,
    permissions: Vec<Permission>,
) -> Vec<ModuleWithPermissions> {
    modules
        .into_iter()
        .map(|module| {
            let permissions = permissions
                .iter()
                .filter(|p| p.module_id == module.id)
                .cloned()
                .collect();
            ModuleWithPermissions { module, permissions }
        })
        .collect()
}
