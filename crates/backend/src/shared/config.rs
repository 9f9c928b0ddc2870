use contracts::shared::catalog::Catalog;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub barcodes: BarcodeConfig,
    /// Каталог мероприятий; если секция не задана, используется встроенный
    #[serde(default)]
    pub catalog: Catalog,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub dir: String,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".into(),
            level: "info,sqlx=warn,sea_orm=warn".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Секрет подписи JWT; если не задан, генерируется при старте
    pub jwt_secret: Option<String>,
    pub admin_username: String,
    /// Argon2 PHC-строка; без неё вход администратора отключён
    pub admin_password_hash: Option<String>,
    pub token_lifetime_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            admin_username: "admin".into(),
            admin_password_hash: None,
            token_lifetime_hours: 24,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BarcodeConfig {
    pub prefix: String,
    pub width: usize,
}

impl Default for BarcodeConfig {
    fn default() -> Self {
        Self {
            prefix: "CYP".into(),
            width: 4,
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 5000

[database]
path = "target/db/gatepass.db"

[logging]
dir = "logs"
level = "info,sqlx=warn,sea_orm=warn"

[auth]
admin_username = "admin"
token_lifetime_hours = 24

[barcodes]
prefix = "CYP"
width = 4
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. `GATEPASS_CONFIG` environment variable
/// 2. Next to the executable (for production)
/// 3. Current working directory (for development)
/// 4. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    let mut candidates = Vec::new();
    if let Ok(path) = std::env::var("GATEPASS_CONFIG") {
        candidates.push(PathBuf::from(path));
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.push(exe_dir.join("config.toml"));
        }
    }
    candidates.push(PathBuf::from("config.toml"));

    for config_path in candidates {
        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            let contents = std::fs::read_to_string(&config_path)?;
            return parse_config(&contents);
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

/// Parse and validate configuration text
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    config
        .catalog
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid catalog in config: {}", e))?;
    if config.barcodes.prefix.is_empty()
        || !config.barcodes.prefix.chars().all(|c| c.is_ascii_alphabetic())
    {
        anyhow::bail!("Barcode prefix must be non-empty and alphabetic");
    }
    Ok(config)
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the current directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path = Path::new(&config.database.path);

    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    Ok(std::env::current_dir()?.join(db_path))
}
