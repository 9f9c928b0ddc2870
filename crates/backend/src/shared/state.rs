use std::sync::Arc;

use crate::domain::a001_pass::service::PassService;
use crate::shared::config::AuthConfig;
use crate::system::auth::jwt;

/// Общее состояние HTTP-обработчиков
#[derive(Clone)]
pub struct AppState {
    pub passes: PassService,
    pub auth: Arc<AuthSettings>,
}

/// Параметры аутентификации администратора
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password_hash: Option<String>,
    pub token_lifetime_hours: i64,
}

impl AuthSettings {
    /// Если секрет не задан в конфигурации, генерируется новый:
    /// выданные токены перестают действовать после перезапуска.
    pub fn from_config(config: &AuthConfig) -> Self {
        let jwt_secret = match config.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                tracing::warn!("auth.jwt_secret is not set, using a generated secret");
                jwt::generate_jwt_secret()
            }
        };
        if config.admin_password_hash.is_none() {
            tracing::warn!("auth.admin_password_hash is not set, admin login is disabled");
        }

        Self {
            jwt_secret,
            admin_username: config.admin_username.clone(),
            admin_password_hash: config.admin_password_hash.clone(),
            token_lifetime_hours: config.token_lifetime_hours,
        }
    }
}

impl AppState {
    pub fn new(passes: PassService, auth: AuthSettings) -> Self {
        Self {
            passes,
            auth: Arc::new(auth),
        }
    }
}
