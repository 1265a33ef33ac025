use crate::config::Config;
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

/// Handle on the relational store. Constructed once at startup and shared
/// through `AppState`; the schema is migrated idempotently before the handle
/// is handed out.
pub struct Database {
    // keeps the underlying libsql database alive for the connection's lifetime
    _db: LibsqlDatabase,
    conn: Connection,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    async fn migrate(conn: &Connection) -> Result<()> {
        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(conn, filename, sql).await?;
        }

        for (filename, sql) in crate::accounts::migrations() {
            Self::run_migration(conn, filename, sql).await?;
        }

        for (filename, sql) in crate::catalog::migrations() {
            Self::run_migration(conn, filename, sql).await?;
        }

        Ok(())
    }

    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(cfg.app.get_db());

        let db = Builder::new_local(&path).build().await?;
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        Self::migrate(&conn).await?;

        Ok(Database { _db: db, conn })
    }

    /// An in-memory store with the full schema applied. Used by the tests;
    /// every instance is independent.
    pub async fn in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;

        Self::migrate(&conn).await?;

        Ok(Database { _db: db, conn })
    }
}
