//! The embedded relational store (schema half of component C5).
//!
//! Schema is spec.md §6's literal text, which combines
//! `original_source/src/database.c`'s `players` table shape (explicit
//! float columns) with `original_source/src/save.c`'s `blocks` table shape
//! (composite primary key) — see spec.md §9(c) and DESIGN.md for why those
//! two source files disagree and which one this crate follows.

use rusqlite::{params, Connection, OptionalExtension};

use super::PersistenceError;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY,
    x REAL NOT NULL,
    y REAL NOT NULL,
    z REAL NOT NULL,
    pitch REAL NOT NULL,
    yaw REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS blocks (
    cx INTEGER NOT NULL,
    cz INTEGER NOT NULL,
    bx INTEGER NOT NULL,
    by INTEGER NOT NULL,
    bz INTEGER NOT NULL,
    block INTEGER NOT NULL,
    PRIMARY KEY (cx, cz, bx, by, bz)
);
CREATE INDEX IF NOT EXISTS blocks_cxcz ON blocks(cx, cz);
";

#[derive(Debug, Clone, Copy)]
pub struct PlayerRecord {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub pitch: f64,
    pub yaw: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct BlockRecord {
    pub cx: i32,
    pub cz: i32,
    pub bx: i32,
    pub by: i32,
    pub bz: i32,
    pub block: i32,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &std::path::Path) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path).map_err(|e| PersistenceError::OpenFailed(e.to_string()))?;
        conn.execute_batch(SCHEMA).map_err(|e| PersistenceError::OpenFailed(e.to_string()))?;
        Ok(Store { conn })
    }

    pub fn begin(&self) -> Result<(), PersistenceError> {
        self.conn.execute_batch("BEGIN;").map_err(step_error)
    }

    pub fn commit_and_reopen(&self) -> Result<(), PersistenceError> {
        self.conn.execute_batch("COMMIT;BEGIN;").map_err(step_error)
    }

    pub fn commit_final(&self) -> Result<(), PersistenceError> {
        self.conn.execute_batch("COMMIT;").map_err(step_error)
    }

    pub fn put_player(&self, record: PlayerRecord) -> Result<(), PersistenceError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO players (id, x, y, z, pitch, yaw) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![record.id, record.x, record.y, record.z, record.pitch, record.yaw],
            )
            .map_err(step_error)?;
        Ok(())
    }

    pub fn put_block(&self, record: BlockRecord) -> Result<(), PersistenceError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO blocks (cx, cz, bx, by, bz, block) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![record.cx, record.cz, record.bx, record.by, record.bz, record.block],
            )
            .map_err(step_error)?;
        Ok(())
    }

    pub fn get_player(&self, id: i64) -> Result<Option<PlayerRecord>, PersistenceError> {
        self.conn
            .query_row(
                "SELECT id, x, y, z, pitch, yaw FROM players WHERE id = ?1",
                params![id],
                |row| {
                    Ok(PlayerRecord {
                        id: row.get(0)?,
                        x: row.get(1)?,
                        y: row.get(2)?,
                        z: row.get(3)?,
                        pitch: row.get(4)?,
                        yaw: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(step_error)
    }

    pub fn get_blocks(&self, cx: i32, cz: i32) -> Result<Vec<BlockRecord>, PersistenceError> {
        let mut stmt = self
            .conn
            .prepare("SELECT cx, cz, bx, by, bz, block FROM blocks WHERE cx = ?1 AND cz = ?2")
            .map_err(step_error)?;
        let rows = stmt
            .query_map(params![cx, cz], |row| {
                Ok(BlockRecord {
                    cx: row.get(0)?,
                    cz: row.get(1)?,
                    bx: row.get(2)?,
                    by: row.get(3)?,
                    bz: row.get(4)?,
                    block: row.get(5)?,
                })
            })
            .map_err(step_error)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(step_error)?);
        }
        Ok(out)
    }
}

fn step_error(e: rusqlite::Error) -> PersistenceError {
    PersistenceError::StepFailed(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_expected_tables() {
        let store = Store::open(&std::path::PathBuf::from(":memory:")).unwrap();
        store.begin().unwrap();
        store.put_block(BlockRecord { cx: 0, cz: 0, bx: 1, by: 2, bz: 3, block: 5 }).unwrap();
        let blocks = store.get_blocks(0, 0).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block, 5);
        store.commit_final().unwrap();
    }

    #[test]
    fn put_block_is_idempotent() {
        let store = Store::open(&std::path::PathBuf::from(":memory:")).unwrap();
        store.begin().unwrap();
        let rec = BlockRecord { cx: 0, cz: 0, bx: 1, by: 2, bz: 3, block: 5 };
        store.put_block(rec).unwrap();
        store.put_block(rec).unwrap();
        let blocks = store.get_blocks(0, 0).unwrap();
        assert_eq!(blocks.len(), 1);
        store.commit_final().unwrap();
    }

    #[test]
    fn get_player_returns_none_when_absent() {
        let store = Store::open(&std::path::PathBuf::from(":memory:")).unwrap();
        assert!(store.get_player(1).unwrap().is_none());
    }
}
