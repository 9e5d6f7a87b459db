use std::path::Path;
use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, OpenFlags};

pub const TRACE: &str = "trace.sqlite3";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS processes(
    id             INTEGER NOT NULL PRIMARY KEY,
    run_id         INTEGER NOT NULL,
    parent         INTEGER,
    timestamp      INTEGER NOT NULL,
    exit_timestamp INTEGER,
    is_thread      BOOLEAN NOT NULL,
    exitcode       INTEGER,
    cpu_time       INTEGER
);
CREATE INDEX IF NOT EXISTS proc_parent_idx ON processes(parent);

CREATE TABLE IF NOT EXISTS opened_files(
    id           INTEGER NOT NULL PRIMARY KEY,
    run_id       INTEGER NOT NULL,
    name         TEXT NOT NULL,
    timestamp    INTEGER NOT NULL,
    mode         INTEGER NOT NULL,
    is_directory BOOLEAN NOT NULL,
    process      INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS open_proc_idx ON opened_files(process);

CREATE TABLE IF NOT EXISTS executed_files(
    id         INTEGER NOT NULL PRIMARY KEY,
    name       TEXT NOT NULL,
    run_id     INTEGER NOT NULL,
    timestamp  INTEGER NOT NULL,
    process    INTEGER NOT NULL,
    argv       TEXT NOT NULL,
    envp       TEXT NOT NULL,
    workingdir TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS exec_proc_idx ON executed_files(process);

CREATE TABLE IF NOT EXISTS connections(
    id        INTEGER NOT NULL PRIMARY KEY,
    run_id    INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,
    process   INTEGER NOT NULL,
    inbound   INTEGER NOT NULL,
    family    TEXT NULL,
    protocol  TEXT NULL,
    address   TEXT NULL
);
CREATE INDEX IF NOT EXISTS connections_proc_idx ON connections(process);
";

/// Opens the store at `path` for writing, creating the file and schema
/// as needed.
pub fn create(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).with_context(|| {
        format!("failed to open trace store {}", path.display())
    })?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

pub fn open(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        return Err(anyhow!("trace store {} does not exist", path.display()));
    }
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Ok(Connection::open_with_flags(path, flags)?)
}
