use anyhow::Result;
use libsql::Connection;

use crate::model::User;

/// Data access for user identities.
pub struct Accounts<'a> {
    conn: &'a Connection,
}

impl<'a> Accounts<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Inserts a new user. Returns `None` when the username is already
    /// taken: the UNIQUE constraint on `users.username` is the authoritative
    /// check, so two concurrent registrations cannot both succeed.
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<User>> {
        let query = r#"
            INSERT INTO users (username, password_hash)
            VALUES (?, ?)
            RETURNING id, username, password_hash
        "#;

        let mut rows = match self
            .conn
            .query(query, libsql::params![username, password_hash])
            .await
        {
            Ok(rows) => rows,
            Err(e) if e.to_string().contains("UNIQUE constraint failed") => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_user(&row)?))
        } else {
            anyhow::bail!("Failed to create user")
        }
    }

    /// Exact, case-sensitive username lookup.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = r#"
            SELECT id, username, password_hash
            FROM users WHERE username = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![username]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_user(&row)?))
        } else {
            Ok(None)
        }
    }

    fn row_to_user(&self, row: &libsql::Row) -> Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
        })
    }
}
