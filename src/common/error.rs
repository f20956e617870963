// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Motivo concreto de uma negação `Forbidden`.
/// Só aparece nos logs; a resposta HTTP é sempre a mesma.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    RoleMismatch,
    MissingPermission,
    TenantMismatch,
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ForbiddenReason::RoleMismatch => "cargo não autorizado",
            ForbiddenReason::MissingPermission => "permissão ausente",
            ForbiddenReason::TenantMismatch => "academia diferente",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Erro da substituição em massa: ids de permissão que não existem
    #[error("Permissões desconhecidas: {0:?}")]
    UnknownPermissions(Vec<Uuid>),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    // Token ausente, expirado ou adulterado: todos viram a mesma coisa
    #[error("Não autenticado")]
    Unauthenticated,

    #[error("Acesso negado ({0})")]
    Forbidden(ForbiddenReason),

    #[error("{0} não encontrado(a)")]
    NotFound(&'static str),

    #[error("O cargo ainda está atribuído a usuários")]
    RoleInUse,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::UnknownPermissions(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RoleInUse => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                })
            }
            // Ferramenta de administração: o detalhe não vaza nada de controle de acesso
            AppError::UnknownPermissions(ids) => json!({
                "error": "Uma ou mais permissões não existem.",
                "details": { "permissionIds": ids },
            }),
            AppError::InvalidCredentials => json!({ "error": "E-mail ou senha inválidos." }),
            AppError::Unauthenticated => json!({ "error": "Você precisa estar logado." }),
            // O motivo já foi logado por quem negou; aqui ele é descartado.
            AppError::Forbidden(_) => json!({ "error": "Acesso negado." }),
            AppError::NotFound(entity) => json!({ "error": format!("{} não encontrado(a).", entity) }),
            AppError::RoleInUse => json!({
                "error": "Não é possível excluir um cargo que ainda está atribuído a usuários."
            }),

            // Todos os outros erros viram 500.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                json!({ "error": "Ocorreu um erro inesperado." })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn forbidden_reasons_collapse_to_one_body() {
        let (s1, b1) = body_of(AppError::Forbidden(ForbiddenReason::RoleMismatch)).await;
        let (s2, b2) = body_of(AppError::Forbidden(ForbiddenReason::TenantMismatch)).await;
        let (s3, b3) = body_of(AppError::Forbidden(ForbiddenReason::MissingPermission)).await;

        assert_eq!(s1, StatusCode::FORBIDDEN);
        assert_eq!(s1, s2);
        assert_eq!(s2, s3);
        assert_eq!(b1, b2);
        assert_eq!(b2, b3);
    }

    #[tokio::test]
    async fn unknown_permissions_carry_the_offending_ids() {
        let id = Uuid::new_v4();
        let (status, body) = body_of(AppError::UnknownPermissions(vec![id])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["permissionIds"][0], id.to_string());
    }

    #[tokio::test]
    async fn internal_errors_hide_the_cause() {
        let (status, body) = body_of(AppError::InternalServerError(anyhow::anyhow!("segredo"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("segredo"));
    }
}
