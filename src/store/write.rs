use std::path::Path;
use anyhow::Result;
use log::trace;
use rusqlite::{params, Connection};
use super::model::{join_argv, Mode};
use super::schema;

/// Appends rows for one run. Every writer starts a new run id.
pub struct Writer {
    conn: Connection,
    run:  i64,
}

impl Writer {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = schema::create(path)?;
        let run  = conn.query_row(
            "SELECT COALESCE(MAX(run_id) + 1, 0) FROM processes",
            [],
            |row| row.get(0),
        )?;
        trace!("writing run {} to {}", run, path.display());
        Ok(Self { conn, run })
    }

    pub fn run(&self) -> i64 {
        self.run
    }

    pub fn process(&mut self, parent: Option<i64>, timestamp: i64, is_thread: bool) -> Result<i64> {
        self.conn.execute("
            INSERT INTO processes(run_id, parent, timestamp, is_thread)
            VALUES (?1, ?2, ?3, ?4)
        ", params![self.run, parent, timestamp, is_thread])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn exit(&mut self, process: i64, timestamp: i64, exitcode: i32, cpu_time: Option<i64>) -> Result<()> {
        self.conn.execute("
            UPDATE processes SET exit_timestamp = ?2, exitcode = ?3, cpu_time = ?4
            WHERE id = ?1
        ", params![process, timestamp, exitcode, cpu_time.unwrap_or(-1)])?;
        Ok(())
    }

    pub fn exec<S: AsRef<str>>(&mut self, process: i64, name: &str, timestamp: i64, argv: &[S], envp: &[S], workingdir: &str) -> Result<i64> {
        self.conn.execute("
            INSERT INTO executed_files(name, run_id, timestamp, process, argv, envp, workingdir)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ", params![name, self.run, timestamp, process, join_argv(argv), join_argv(envp), workingdir])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn file(&mut self, process: i64, name: &str, timestamp: i64, mode: Mode, is_directory: bool) -> Result<i64> {
        self.conn.execute("
            INSERT INTO opened_files(run_id, name, timestamp, mode, is_directory, process)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ", params![self.run, name, timestamp, mode.0, is_directory, process])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn connect(&mut self, process: i64, timestamp: i64, inbound: bool, family: &str, protocol: &str, address: &str) -> Result<i64> {
        self.conn.execute("
            INSERT INTO connections(run_id, timestamp, process, inbound, family, protocol, address)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ", params![self.run, timestamp, process, inbound, family, protocol, address])?;
        Ok(self.conn.last_insert_rowid())
    }
}
