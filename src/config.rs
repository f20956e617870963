// src/config.rs

use anyhow::{bail, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, str::FromStr, sync::Arc, time::Duration};

use crate::{
    db::{
        AcademyDirectory, ProgramRepository, RbacRepository, RbacStore, TenancyRepository, UserRepository,
        UserStore,
    },
    services::{
        access::AccessControl,
        auth::AuthService,
        guard::RouteGuard,
        rbac_service::RbacService,
        tenancy_service::TenantScopeResolver,
        token::TokenCodec,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Configuração imutável, lida uma vez na inicialização e compartilhada via `Arc`.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub environment: Environment,
    pub session_ttl: chrono::Duration,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub assignment_scoped_roles: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave -> valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        if jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET não pode ser vazio");
        }
        if jwt_secret.len() < 32 {
            tracing::warn!("JWT_SECRET tem menos de 32 bytes");
        }

        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        };

        let ttl_days: i64 = parse_or(&lookup, "SESSION_TTL_DAYS", 7)?;
        let acquire_secs: u64 = parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 3)?;

        let assignment_scoped_roles = lookup("ASSIGNMENT_SCOPED_ROLES")
            .unwrap_or_else(|| "coach".to_string())
            .split(',')
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url,
            jwt_secret,
            environment,
            session_ttl: chrono::Duration::days(ttl_days),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
            assignment_scoped_roles,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} inválido: {:?}", key, raw)),
        None => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub tokens: TokenCodec,
    pub access: AccessControl,
    pub guard: RouteGuard,
    pub rbac_service: RbacService,
    pub auth_service: AuthService,
    pub users: Arc<dyn UserStore>,
    pub program_repo: ProgramRepository,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let rbac_store = Arc::new(RbacRepository::new(db_pool.clone()));
        let directory = Arc::new(TenancyRepository::new(db_pool.clone()));
        let users = Arc::new(UserRepository::new(db_pool.clone()));

        Ok(Self::assemble(config, db_pool, rbac_store, directory, users))
    }

    /// Monta o gráfico de dependências sobre os armazenamentos informados.
    pub fn assemble(
        config: AppConfig,
        db_pool: PgPool,
        rbac_store: Arc<dyn RbacStore>,
        directory: Arc<dyn AcademyDirectory>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let tokens = TokenCodec::new(&config.jwt_secret);
        let access = AccessControl::new(rbac_store.clone());
        let tenancy = TenantScopeResolver::new(directory, &config.assignment_scoped_roles);
        let guard = RouteGuard::new(access.clone(), tenancy);

        let auth_service = AuthService::new(users.clone(), tokens.clone(), config.session_ttl);

        Self {
            program_repo: ProgramRepository::new(db_pool.clone()),
            rbac_service: RbacService::new(rbac_store),
            config: Arc::new(config),
            db_pool,
            tokens,
            access,
            guard,
            auth_service,
            users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_keys_are_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/academia"),
            ("JWT_SECRET", "um-segredo-bem-comprido-para-os-testes"),
        ]))
        .unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert!(!config.is_production());
        assert_eq!(config.session_ttl, chrono::Duration::days(7));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.assignment_scoped_roles, vec!["coach".to_string()]);
    }

    #[test]
    fn production_and_custom_role_list_are_honoured() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/academia"),
            ("JWT_SECRET", "um-segredo-bem-comprido-para-os-testes"),
            ("APP_ENV", "production"),
            ("SESSION_TTL_DAYS", "1"),
            ("ASSIGNMENT_SCOPED_ROLES", " coach , assistant_coach ,"),
        ]))
        .unwrap();

        assert!(config.is_production());
        assert_eq!(config.session_ttl, chrono::Duration::days(1));
        assert_eq!(config.assignment_scoped_roles, vec!["coach", "assistant_coach"]);
    }

    #[test]
    fn missing_or_blank_secret_refuses_to_start() {
        assert!(AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "   "),
        ]))
        .is_err());
    }

    #[test]
    fn malformed_numbers_are_reported() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "um-segredo-bem-comprido-para-os-testes"),
            ("DB_MAX_CONNECTIONS", "muitas"),
        ]));

        assert!(result.is_err());
    }
}
