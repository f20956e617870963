// src/services/token.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    models::auth::{Claims, Principal},
};

/// Assina e verifica o token de sessão (HS256).
///
/// Não tem estado além das chaves, que são montadas uma única vez a partir do
/// segredo da configuração; clonar é barato e seguro entre requisições.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expirou é expirou: sem tolerância de relógio
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;

        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(validation),
        }
    }

    pub fn sign(&self, principal: &Principal, ttl: Duration) -> Result<String, AppError> {
        let expires_at = Utc::now() + ttl;

        let claims = Claims {
            user_id: principal.user_id,
            email: principal.email.clone(),
            role_id: principal.role_id,
            role_name: principal.role_name.clone(),
            exp: expires_at.timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Falha fechada: qualquer problema (formato, assinatura, expiração) vira `None`.
    pub fn verify(&self, token: &str) -> Option<Principal> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims.into()),
            Err(e) => {
                tracing::debug!("Token rejeitado: {:?}", e.kind());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn principal() -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            email: "gerente@academia.com".into(),
            role_id: Uuid::new_v4(),
            role_name: "academy_manager".into(),
        }
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let codec = TokenCodec::new("segredo-de-teste-com-tamanho-suficiente");
        let p = principal();

        let token = codec.sign(&p, Duration::minutes(5)).unwrap();

        assert_eq!(codec.verify(&token), Some(p));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = TokenCodec::new("segredo-de-teste-com-tamanho-suficiente");

        let token = codec.sign(&principal(), Duration::seconds(-1)).unwrap();

        assert_eq!(codec.verify(&token), None);
    }

    #[test]
    fn altering_any_single_character_invalidates_the_token() {
        let codec = TokenCodec::new("segredo-de-teste-com-tamanho-suficiente");
        let token = codec.sign(&principal(), Duration::minutes(5)).unwrap();

        for (i, c) in token.char_indices() {
            if c == '.' {
                continue;
            }
            let replacement = if c == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + 1, &replacement.to_string());

            assert_eq!(codec.verify(&tampered), None, "posição {} aceita após alteração", i);
        }
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let ours = TokenCodec::new("segredo-de-teste-com-tamanho-suficiente");
        let theirs = TokenCodec::new("outro-segredo-qualquer-tambem-comprido");

        let token = theirs.sign(&principal(), Duration::minutes(5)).unwrap();

        assert_eq!(ours.verify(&token), None);
        assert_eq!(ours.verify("isto.nao.eh-um-jwt"), None);
        assert_eq!(ours.verify(""), None);
    }
}
