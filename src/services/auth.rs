// src/services/auth.rs

use std::sync::Arc;

use bcrypt::verify;
use chrono::Duration;

use crate::{
    common::error::AppError,
    db::UserStore,
    models::auth::Principal,
    services::token::TokenCodec,
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenCodec,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenCodec, session_ttl: Duration) -> Self {
        Self { users, tokens, session_ttl }
    }

    /// Confere as credenciais e devolve o token assinado junto com o principal.
    pub async fn login_user(&self, email: &str, password: &str) -> Result<(String, Principal), AppError> {
        let identity = self.users
            .find_login_identity(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = identity.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        ?;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let principal = identity.into_principal();
        let token = self.tokens.sign(&principal, self.session_ttl)?;

        tracing::info!(user_id = %principal.user_id, role = %principal.role_name, "Login efetuado");
        Ok((token, principal))
    }
}
