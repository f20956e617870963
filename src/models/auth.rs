// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// A identidade verificada de UMA requisição.
// Só é criada a partir de um token válido e nunca é persistida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: Uuid,
    #[schema(example = "treinador@academia.com")]
    pub email: String,
    pub role_id: Uuid,
    #[schema(example = "coach")]
    pub role_name: String,
}

// Estrutura de dados ("claims") dentro do JWT.
// Exatamente estes campos; nada além disso é confiável.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub role_id: Uuid,
    pub role_name: String,
    pub exp: i64, // Expiration time (timestamp UNIX)
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            role_id: claims.role_id,
            role_name: claims.role_name,
        }
    }
}

// Linha usada apenas no login: usuário + nome do cargo + hash
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoginIdentity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role_id: Uuid,
    pub role_name: String,
}

impl LoginIdentity {
    pub fn into_principal(self) -> Principal {
        Principal {
            user_id: self.id,
            email: self.email,
            role_id: self.role_id,
            role_name: self.role_name,
        }
    }
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "gerente@academia.com")]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}
