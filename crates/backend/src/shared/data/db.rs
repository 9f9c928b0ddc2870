use contracts::domain::a001_pass::aggregate::Pass;
use contracts::domain::common::AggregateRoot;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use std::path::Path;

pub async fn initialize_database(db_file: &Path) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Opening database {}", absolute_path.display());
    let conn = Database::connect(&db_url).await?;

    ensure_schema(&conn).await?;

    Ok(conn)
}

/// Ensure required tables exist (minimal schema bootstrap)
pub async fn ensure_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let table = Pass::full_name();

    let check_pass_table = format!(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='{}';",
        table
    );
    let pass_table_exists = conn
        .query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            check_pass_table,
        ))
        .await?;

    if pass_table_exists.is_empty() {
        tracing::info!("Creating {} table", table);
    }

    let statements = [
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY NOT NULL,
                barcode TEXT NOT NULL UNIQUE,
                attendee_name TEXT,
                pass_type TEXT NOT NULL,
                events_json TEXT NOT NULL DEFAULT '[]',
                total_price INTEGER NOT NULL DEFAULT 0,
                email TEXT,
                phone TEXT,
                is_scanned INTEGER NOT NULL DEFAULT 0,
                scan_time TEXT,
                is_sold INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 0
            );
            "#
        ),
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_pass_type ON {table} (pass_type);"),
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_is_scanned ON {table} (is_scanned);"),
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table} (created_at);"),
    ];

    for sql in statements {
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql))
            .await?;
    }

    Ok(())
}

/// In-memory database with the schema applied
#[cfg(test)]
pub async fn connect_in_memory() -> anyhow::Result<DatabaseConnection> {
    let mut opt = sea_orm::ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(opt).await?;
    ensure_schema(&conn).await?;
    Ok(conn)
}

/// File database in the temp dir; its pool holds several connections
#[cfg(test)]
pub async fn connect_temp_file() -> anyhow::Result<(DatabaseConnection, std::path::PathBuf)> {
    let path = std::env::temp_dir().join(format!("gatepass-{}.db", uuid::Uuid::new_v4()));
    let conn = initialize_database(&path).await?;
    Ok((conn, path))
}

#[cfg(test)]
pub fn remove_temp_file(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}
