// SQLite-backed key-value store: plain string keys plus sorted sets.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Transaction};

/// One write inside a multi-command transaction (see [`Database::exec`]).
#[derive(Debug, Clone, PartialEq)]
pub enum KvCommand {
    Set { key: String, value: String },
    ZAdd { key: String, score: f64, member: String },
}

/// Key-value persistence with a small command surface: `get`/`set`, sorted
/// sets ordered by score, and atomic multi-command execution.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS zset (
                key    TEXT NOT NULL,
                member TEXT NOT NULL,
                score  REAL NOT NULL,
                PRIMARY KEY (key, member)
            );

            CREATE INDEX IF NOT EXISTS idx_zset_key_score ON zset(key, score);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Read a string value. Returns `None` if the key does not exist.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM kv WHERE key = ?1")
            .context("failed to prepare get query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query kv")?;

        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to read kv row")?)),
            None => Ok(None),
        }
    }

    /// Store `value` under `key`, overwriting any previous value.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .context("failed to set key")?;
        Ok(())
    }

    /// Add `member` to the sorted set at `key`, or update its score.
    pub fn zadd(&self, key: &str, score: f64, member: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO zset (key, member, score) VALUES (?1, ?2, ?3)",
            params![key, member, score],
        )
        .context("failed to add sorted set member")?;
        Ok(())
    }

    /// Members of the sorted set at `key`, highest score first, for the
    /// inclusive index range `start..=stop`. Negative indices count from the
    /// end, so `(0, -1)` returns every member.
    pub fn zrevrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let len = self.zcard(key)? as i64;
        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if len == 0 || start > stop {
            return Ok(Vec::new());
        }

        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT member FROM zset WHERE key = ?1
                 ORDER BY score DESC, member DESC
                 LIMIT ?2 OFFSET ?3",
            )
            .context("failed to prepare zrevrange query")?;

        let members = stmt
            .query_map(params![key, stop - start + 1, start], |row| row.get(0))
            .context("failed to query sorted set")?
            .collect::<std::result::Result<Vec<String>, _>>()
            .context("failed to map sorted set rows")?;

        Ok(members)
    }

    /// Number of members in the sorted set at `key`.
    pub fn zcard(&self, key: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM zset WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .context("failed to count sorted set members")?;
        Ok(count as usize)
    }

    /// Apply every command in one transaction: all of them land or none do.
    pub fn exec(&self, commands: &[KvCommand]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        for command in commands {
            apply(&tx, command)?;
        }
        tx.commit().context("failed to commit transaction")?;
        Ok(())
    }
}

fn apply(tx: &Transaction<'_>, command: &KvCommand) -> Result<()> {
    match command {
        KvCommand::Set { key, value } => {
            tx.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .with_context(|| format!("failed to set {key} in transaction"))?;
        }
        KvCommand::ZAdd { key, score, member } => {
            tx.execute(
                "INSERT OR REPLACE INTO zset (key, member, score) VALUES (?1, ?2, ?3)",
                params![key, member, score],
            )
            .with_context(|| format!("failed to zadd {key} in transaction"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    // ------------------------------------------------------------------
    // Schema / open
    // ------------------------------------------------------------------

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"kv".to_string()));
        assert!(tables.contains(&"zset".to_string()));
    }

    // ------------------------------------------------------------------
    // Strings
    // ------------------------------------------------------------------

    #[test]
    fn get_returns_none_for_missing_key() {
        let db = test_db();
        assert!(db.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn set_overwrites_previous_value() {
        let db = test_db();
        db.set("key", "1").unwrap();
        db.set("key", "2").unwrap();
        assert_eq!(db.get("key").unwrap().as_deref(), Some("2"));
    }

    // ------------------------------------------------------------------
    // Sorted sets
    // ------------------------------------------------------------------

    #[test]
    fn zrevrange_orders_by_score_descending() {
        let db = test_db();
        db.zadd("idx", 10.0, "a").unwrap();
        db.zadd("idx", 30.0, "c").unwrap();
        db.zadd("idx", 20.0, "b").unwrap();

        assert_eq!(db.zrevrange("idx", 0, -1).unwrap(), vec!["c", "b", "a"]);
        assert_eq!(db.zrevrange("idx", 0, 1).unwrap(), vec!["c", "b"]);
        assert_eq!(db.zrevrange("idx", 1, 1).unwrap(), vec!["b"]);
        assert_eq!(db.zrevrange("idx", -2, -1).unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn zrevrange_out_of_range_is_empty() {
        let db = test_db();
        assert!(db.zrevrange("idx", 0, -1).unwrap().is_empty());

        db.zadd("idx", 1.0, "a").unwrap();
        assert!(db.zrevrange("idx", 5, 10).unwrap().is_empty());
        assert_eq!(db.zrevrange("idx", 0, 100).unwrap(), vec!["a"]);
    }

    #[test]
    fn zadd_updates_existing_member_score() {
        let db = test_db();
        db.zadd("idx", 1.0, "a").unwrap();
        db.zadd("idx", 2.0, "b").unwrap();
        db.zadd("idx", 3.0, "a").unwrap();

        assert_eq!(db.zcard("idx").unwrap(), 2);
        assert_eq!(db.zrevrange("idx", 0, -1).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn sorted_sets_are_scoped_by_key() {
        let db = test_db();
        db.zadd("one", 1.0, "a").unwrap();
        db.zadd("two", 1.0, "b").unwrap();

        assert_eq!(db.zrevrange("one", 0, -1).unwrap(), vec!["a"]);
        assert_eq!(db.zcard("two").unwrap(), 1);
        assert_eq!(db.zcard("three").unwrap(), 0);
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    #[test]
    fn exec_applies_all_commands() {
        let db = test_db();
        db.exec(&[
            KvCommand::Set {
                key: "a".into(),
                value: "1".into(),
            },
            KvCommand::Set {
                key: "latest".into(),
                value: "a".into(),
            },
            KvCommand::ZAdd {
                key: "idx".into(),
                score: 5.0,
                member: "a".into(),
            },
        ])
        .unwrap();

        assert_eq!(db.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(db.get("latest").unwrap().as_deref(), Some("a"));
        assert_eq!(db.zrevrange("idx", 0, -1).unwrap(), vec!["a"]);
    }

    #[test]
    fn exec_rolls_back_on_failure() {
        let db = test_db();
        {
            let conn = db.conn();
            // Make any write to the zset table fail.
            conn.execute_batch(
                "CREATE TRIGGER reject_zset BEFORE INSERT ON zset
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
        }

        let result = db.exec(&[
            KvCommand::Set {
                key: "a".into(),
                value: "1".into(),
            },
            KvCommand::ZAdd {
                key: "idx".into(),
                score: 1.0,
                member: "a".into(),
            },
        ]);

        assert!(result.is_err());
        assert!(db.get("a").unwrap().is_none(), "set must be rolled back");
    }

    #[test]
    fn data_persists_across_reopen() {
        let db_path = std::env::temp_dir().join(format!("newsangle_kv_{}.db", std::process::id()));
        let db_path_str = db_path.to_str().unwrap();
        let _ = std::fs::remove_file(&db_path);

        {
            let db = Database::open(db_path_str).unwrap();
            db.set("k", "v").unwrap();
            db.zadd("idx", 1.0, "m").unwrap();
        }

        let db = Database::open(db_path_str).unwrap();
        assert_eq!(db.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(db.zrevrange("idx", 0, -1).unwrap(), vec!["m"]);

        drop(db);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(format!("{db_path_str}-wal"));
        let _ = std::fs::remove_file(format!("{db_path_str}-shm"));
    }
}
