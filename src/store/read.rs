use std::path::Path;
use anyhow::Result;
use rusqlite::{Connection as Db, Row};
use rusqlite::types::ValueRef;
use super::model::*;
use super::schema;

/// Read-only view of a trace store.
pub struct Store {
    conn: Db,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: schema::open(path)?,
        })
    }

    pub fn processes(&self) -> Result<Vec<Process>> {
        let mut stmt = self.conn.prepare("
            SELECT id, run_id, parent, timestamp, exit_timestamp, is_thread, exitcode, cpu_time
            FROM processes
            ORDER BY id
        ")?;

        let rows = stmt.query_map([], |row| {
            Ok(Process {
                id:             row.get(0)?,
                run:            row.get(1)?,
                parent:         row.get(2)?,
                timestamp:      row.get(3)?,
                exit_timestamp: row.get(4)?,
                is_thread:      row.get(5)?,
                exitcode:       row.get(6)?,
                cpu_time:       row.get(7)?,
            })
        })?;

        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn executed_files(&self) -> Result<Vec<ExecutedFile>> {
        let mut stmt = self.conn.prepare("
            SELECT id, name, run_id, timestamp, process, argv, envp, workingdir
            FROM executed_files
            ORDER BY id
        ")?;

        let rows = stmt.query_map([], |row| {
            Ok(ExecutedFile {
                id:         row.get(0)?,
                name:       text(row, 1)?,
                run:        row.get(2)?,
                timestamp:  row.get(3)?,
                process:    row.get(4)?,
                argv:       split_argv(&text(row, 5)?),
                envp:       split_argv(&text(row, 6)?),
                workingdir: text(row, 7)?,
            })
        })?;

        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn opened_files(&self) -> Result<Vec<OpenedFile>> {
        let mut stmt = self.conn.prepare("
            SELECT id, run_id, name, timestamp, mode, is_directory, process
            FROM opened_files
            ORDER BY id
        ")?;

        let rows = stmt.query_map([], |row| {
            Ok(OpenedFile {
                id:           row.get(0)?,
                run:          row.get(1)?,
                name:         text(row, 2)?,
                timestamp:    row.get(3)?,
                mode:         Mode(row.get(4)?),
                is_directory: row.get(5)?,
                process:      row.get(6)?,
            })
        })?;

        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Connections ordered by direction, address family, then time.
    pub fn connections(&self) -> Result<Vec<Connection>> {
        let mut stmt = self.conn.prepare("
            SELECT id, run_id, timestamp, process, inbound, family, protocol, address
            FROM connections
            ORDER BY inbound, family, timestamp, id
        ")?;

        let rows = stmt.query_map([], |row| {
            Ok(Connection {
                id:        row.get(0)?,
                run:       row.get(1)?,
                timestamp: row.get(2)?,
                process:   row.get(3)?,
                inbound:   row.get::<_, i64>(4)? != 0,
                family:    row.get(5)?,
                protocol:  row.get(6)?,
                address:   row.get(7)?,
            })
        })?;

        Ok(rows.collect::<Result<_, _>>()?)
    }
}

// Paths and arguments are raw bytes from the traced program.
fn text(row: &Row, index: usize) -> rusqlite::Result<String> {
    Ok(match row.get_ref(index)? {
        ValueRef::Text(b) | ValueRef::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        ValueRef::Null                        => String::new(),
        ValueRef::Integer(n)                  => n.to_string(),
        ValueRef::Real(n)                     => n.to_string(),
    })
}
