// src/db/scoped_query.rs

use sqlx::{postgres::PgRow, Encode, Executor, FromRow, Postgres, QueryBuilder, Type};

use crate::{common::error::AppError, models::tenancy::TenantFilter};

/// Tradução SQL do `TenantFilter`.
///
/// O construtor escreve `WHERE <escopo do tenant>` antes de tudo; depois disso
/// só existem métodos que acrescentam `AND ...`, ordenação e paginação. Quem
/// monta a consulta consegue estreitar o resultado, nunca alargar.
///
/// Nomes de colunas entram como `&'static str`: nunca vêm do cliente.
pub struct ScopedQuery<'args> {
    builder: QueryBuilder<'args, Postgres>,
    matches_nothing: bool,
}

impl<'args> ScopedQuery<'args> {
    pub fn new(select: &str, tenant: &TenantFilter, academy_column: &'static str) -> Self {
        Self::scoped(QueryBuilder::new(select), tenant, academy_column)
    }

    /// `UPDATE <tabela> SET <coluna> = $1 WHERE <escopo do tenant>`.
    ///
    /// O escopo faz parte da própria mutação: um registro de outra academia
    /// simplesmente não é afetado (zero linhas), sem janela entre checar e gravar.
    pub fn update<T>(
        table: &'static str,
        column: &'static str,
        value: T,
        tenant: &TenantFilter,
        academy_column: &'static str,
    ) -> Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        let mut builder = QueryBuilder::new("UPDATE ");
        builder.push(table).push(" SET ").push(column).push(" = ").push_bind(value);
        Self::scoped(builder, tenant, academy_column)
    }

    fn scoped(
        mut builder: QueryBuilder<'args, Postgres>,
        tenant: &TenantFilter,
        academy_column: &'static str,
    ) -> Self {
        builder.push(" WHERE ");

        match tenant {
            TenantFilter::Unrestricted => {
                builder.push("TRUE");
            }
            TenantFilter::RestrictedTo(academy_id) => {
                builder.push(academy_column).push(" = ").push_bind(*academy_id);
            }
            TenantFilter::Empty => {
                builder.push("FALSE");
            }
        }

        Self {
            builder,
            matches_nothing: matches!(tenant, TenantFilter::Empty),
        }
    }

    pub fn and_eq<T>(&mut self, column: &'static str, value: T) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        self.builder.push(" AND ").push(column).push(" = ").push_bind(value);
        self
    }

    /// `AND (col1 ILIKE '%termo%' OR col2 ILIKE '%termo%' ...)`
    pub fn and_search(&mut self, columns: &[&'static str], term: &str) -> &mut Self {
        if columns.is_empty() {
            return self;
        }

        let pattern = format!("%{}%", term.trim());
        self.builder.push(" AND (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                self.builder.push(" OR ");
            }
            self.builder.push(*column).push(" ILIKE ").push_bind(pattern.clone());
        }
        self.builder.push(")");
        self
    }

    pub fn order_by(&mut self, column: &'static str) -> &mut Self {
        self.builder.push(" ORDER BY ").push(column);
        self
    }

    pub fn paginate(&mut self, limit: i64, offset: i64) -> &mut Self {
        self.builder
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        self
    }

    pub fn returning(&mut self, columns: &'static str) -> &mut Self {
        self.builder.push(" RETURNING ").push(columns);
        self
    }

    pub fn sql(&self) -> &str {
        self.builder.sql()
    }

    pub async fn fetch_all<'e, T, E>(mut self, executor: E) -> Result<Vec<T>, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        E: Executor<'e, Database = Postgres>,
    {
        // Escopo vazio: nem vale a viagem até o banco
        if self.matches_nothing {
            return Ok(Vec::new());
        }

        let rows = self.builder.build_query_as::<T>().fetch_all(executor).await?;
        Ok(rows)
    }

    pub async fn fetch_optional<'e, T, E>(mut self, executor: E) -> Result<Option<T>, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        E: Executor<'e, Database = Postgres>,
    {
        if self.matches_nothing {
            return Ok(None);
        }

        let row = self.builder.build_query_as::<T>().fetch_optional(executor).await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SELECT: &str = "SELECT id, academy_id FROM users";

    #[test]
    fn admin_scope_is_a_tautology() {
        let query = ScopedQuery::new(SELECT, &TenantFilter::Unrestricted, "academy_id");
        assert_eq!(query.sql(), "SELECT id, academy_id FROM users WHERE TRUE");
    }

    #[test]
    fn empty_scope_matches_nothing() {
        let query = ScopedQuery::new(SELECT, &TenantFilter::Empty, "academy_id");
        assert_eq!(query.sql(), "SELECT id, academy_id FROM users WHERE FALSE");
        assert!(query.matches_nothing);
    }

    #[test]
    fn caller_filters_come_after_the_tenant_predicate() {
        let mut query = ScopedQuery::new(
            SELECT,
            &TenantFilter::RestrictedTo(Uuid::new_v4()),
            "academy_id",
        );
        query
            .and_eq("coach_id", Uuid::new_v4())
            .and_search(&["full_name", "email"], " ana ")
            .order_by("full_name")
            .paginate(20, 40);

        assert_eq!(
            query.sql(),
            "SELECT id, academy_id FROM users WHERE academy_id = $1 \
             AND coach_id = $2 \
             AND (full_name ILIKE $3 OR email ILIKE $4) \
             ORDER BY full_name LIMIT $5 OFFSET $6"
        );
    }

    #[test]
    fn update_carries_the_tenant_predicate_in_its_where_clause() {
        let mut query = ScopedQuery::update(
            "users",
            "academy_id",
            Some(Uuid::new_v4()),
            &TenantFilter::RestrictedTo(Uuid::new_v4()),
            "academy_id",
        );
        query.and_eq("id", Uuid::new_v4()).returning("id, academy_id");

        assert_eq!(
            query.sql(),
            "UPDATE users SET academy_id = $1 WHERE academy_id = $2 AND id = $3 RETURNING id, academy_id"
        );
    }

    #[test]
    fn update_without_an_academy_touches_no_row() {
        let mut query = ScopedQuery::update("users", "academy_id", None::<Uuid>, &TenantFilter::Empty, "academy_id");
        query.and_eq("id", Uuid::new_v4());

        assert_eq!(query.sql(), "UPDATE users SET academy_id = $1 WHERE FALSE AND id = $2");
        assert!(query.matches_nothing);
    }

    #[tokio::test]
    async fn empty_scope_never_touches_the_database() {
        // Pool preguiçoso apontando para lugar nenhum: se a consulta fosse executada, falharia
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://ninguem@127.0.0.1:1/nada")
            .unwrap();

        let rows: Vec<(Uuid, Option<Uuid>)> = ScopedQuery::new(SELECT, &TenantFilter::Empty, "academy_id")
            .fetch_all(&pool)
            .await
            .unwrap();

        assert!(rows.is_empty());
    }
}
