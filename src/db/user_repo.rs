// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::LoginIdentity,
        users::{ListUsersQuery, User},
    },
    services::guard::AuthorizedContext,
};

const USER_SELECT: &str = "SELECT id, email, full_name, role_id, academy_id, created_at FROM users";
const USER_COLUMNS: &str = "id, email, full_name, role_id, academy_id, created_at";

/// Acesso aos usuários. Leituras e mutações de dados de academia recebem o
/// `AuthorizedContext`; só `find_by_id` e o login ignoram o escopo.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_login_identity(&self, email: &str) -> Result<Option<LoginIdentity>, AppError>;

    async fn list_scoped(&self, ctx: &AuthorizedContext, query: &ListUsersQuery) -> Result<Vec<User>, AppError>;

    async fn find_scoped(&self, ctx: &AuthorizedContext, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// `None`: nenhuma linha no escopo com esse id (inexistente OU de outra academia).
    async fn update_academy_scoped(
        &self,
        ctx: &AuthorizedContext,
        id: Uuid,
        academy_id: Option<Uuid>,
    ) -> Result<Option<User>, AppError>;
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    // Usado apenas pelo login: o usuário com o nome do cargo e o hash da senha
    async fn find_login_identity(&self, email: &str) -> Result<Option<LoginIdentity>, AppError> {
        let identity = sqlx::query_as::<_, LoginIdentity>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.role_id, r.name AS role_name
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.email = $1
            "#,
        )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(identity)
    }

    // Lista com escopo: o filtro de academia vem primeiro, a busca e a paginação depois
    async fn list_scoped(
        &self,
        ctx: &AuthorizedContext,
        query: &ListUsersQuery,
    ) -> Result<Vec<User>, AppError> {
        let mut scoped = ctx.scoped_query(USER_SELECT, "academy_id");

        if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
            scoped.and_search(&["full_name", "email"], term);
        }

        scoped
            .order_by(query.sort.column())
            .paginate(query.limit(), query.offset());

        scoped.fetch_all(&self.pool).await
    }

    // Fora do escopo é indistinguível de inexistente
    async fn find_scoped(&self, ctx: &AuthorizedContext, id: Uuid) -> Result<Option<User>, AppError> {
        let mut scoped = ctx.scoped_query(USER_SELECT, "academy_id");
        scoped.and_eq("id", id);
        scoped.fetch_optional(&self.pool).await
    }

    // Sem escopo: só para distinguir 404 de 403 depois de uma mutação que não afetou nada
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_academy_scoped(
        &self,
        ctx: &AuthorizedContext,
        id: Uuid,
        academy_id: Option<Uuid>,
    ) -> Result<Option<User>, AppError> {
        let mut scoped = ctx.scoped_update("users", "academy_id", academy_id, "academy_id");
        scoped.and_eq("id", id).returning(USER_COLUMNS);

        scoped.fetch_optional(&self.pool).await.map_err(|e| match e {
            // Academia inexistente
            AppError::DatabaseError(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                AppError::NotFound("Academia")
            }
            other => other,
        })
    }
}
