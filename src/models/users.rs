// src/models/users.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::tenancy::TenantScoped;

// Representa um usuário vindo do banco de dados (sem o hash da senha)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "jogador@academia.com")]
    pub email: String,
    #[schema(example = "João Silva")]
    pub full_name: String,
    pub role_id: Uuid,
    pub academy_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TenantScoped for User {
    fn academy_id(&self) -> Option<Uuid> {
        self.academy_id
    }
}

// Colunas pelas quais o cliente pode ordenar (nunca texto livre no SQL)
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum UserSort {
    #[default]
    Name,
    Email,
    CreatedAt,
}

impl UserSort {
    pub fn column(&self) -> &'static str {
        match self {
            UserSort::Name => "full_name",
            UserSort::Email => "email",
            UserSort::CreatedAt => "created_at",
        }
    }
}

// GET /api/users?search=&sort=&page=&perPage=
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    #[serde(default)]
    #[param(inline)]
    pub sort: UserSort,
    #[validate(range(min = 1, max = 100_000, message = "A página deve estar entre 1 e 100000."))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100, message = "Entre 1 e 100 itens por página."))]
    pub per_page: Option<i64>,
}

impl ListUsersQuery {
    pub const DEFAULT_PER_PAGE: i64 = 20;

    pub fn limit(&self) -> i64 {
        self.per_page.unwrap_or(Self::DEFAULT_PER_PAGE)
    }

    // Satura em vez de estourar: consultas não validadas ainda geram um OFFSET válido
    pub fn offset(&self) -> i64 {
        self.page
            .unwrap_or(1)
            .saturating_sub(1)
            .max(0)
            .saturating_mul(self.limit())
    }
}

// PUT /api/users/{id}/academy
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserAcademyPayload {
    // null = remover o usuário da academia (apenas admin)
    pub academy_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_to_first_page() {
        let query = ListUsersQuery { search: None, sort: UserSort::Name, page: None, per_page: None };
        assert_eq!(query.limit(), 20);
        assert_eq!(query.offset(), 0);

        let query = ListUsersQuery { search: None, sort: UserSort::Email, page: Some(3), per_page: Some(10) };
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn huge_page_is_rejected_and_offset_never_overflows() {
        let query = ListUsersQuery { search: None, sort: UserSort::Name, page: Some(i64::MAX), per_page: Some(100) };

        let errors = query.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("page"));
        assert_eq!(query.offset(), i64::MAX);

        let query = ListUsersQuery { search: None, sort: UserSort::Name, page: Some(i64::MIN), per_page: None };
        assert_eq!(query.offset(), 0);
    }
}
