use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use rusqlite::{params, Connection};
use tempfile::Builder;
use super::schema;

/// Merges `traces` into `target`. Ids and run ids of each source are
/// shifted past the rows already merged so runs follow each other.
pub fn combine(traces: &[PathBuf], target: &Path) -> Result<()> {
    let dir = match target.parent() {
        Some(dir) if dir != Path::new("") => dir.to_path_buf(),
        _                                 => PathBuf::from("."),
    };

    let temp = Builder::new().prefix("trace_").suffix(".sqlite3").tempfile_in(&dir)?;
    let conn = schema::create(temp.path())?;

    for trace in traces {
        if !trace.is_file() {
            return Err(anyhow!("trace store {} does not exist", trace.display()));
        }
        append(&conn, trace).with_context(|| {
            format!("failed to combine {}", trace.display())
        })?;
    }

    drop(conn);
    temp.persist(target)?;

    info!("combined {} traces into {}", traces.len(), target.display());

    Ok(())
}

fn append(conn: &Connection, trace: &Path) -> Result<()> {
    let offset = |sql: &str| -> Result<i64> {
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    };

    let run  = offset("SELECT COALESCE(MAX(run_id) + 1, 0) FROM processes")?;
    let proc = offset("SELECT COALESCE(MAX(id), 0) FROM processes")?;
    let open = offset("SELECT COALESCE(MAX(id), 0) FROM opened_files")?;
    let exec = offset("SELECT COALESCE(MAX(id), 0) FROM executed_files")?;
    let sock = offset("SELECT COALESCE(MAX(id), 0) FROM connections")?;

    debug!("appending {} as run {}", trace.display(), run);

    conn.execute("ATTACH DATABASE ?1 AS source", [trace.to_string_lossy().into_owned()])?;

    let first = conn.query_row(
        "SELECT COALESCE(MIN(run_id), 0) FROM source.processes",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    let run = run - first;

    conn.execute("
        INSERT INTO processes(id, run_id, parent, timestamp, exit_timestamp, is_thread, exitcode, cpu_time)
        SELECT id + ?1, run_id + ?2, parent + ?1, timestamp, exit_timestamp, is_thread, exitcode, cpu_time
        FROM source.processes
    ", params![proc, run])?;

    conn.execute("
        INSERT INTO opened_files(id, run_id, name, timestamp, mode, is_directory, process)
        SELECT id + ?1, run_id + ?2, name, timestamp, mode, is_directory, process + ?3
        FROM source.opened_files
    ", params![open, run, proc])?;

    conn.execute("
        INSERT INTO executed_files(id, name, run_id, timestamp, process, argv, envp, workingdir)
        SELECT id + ?1, name, run_id + ?2, timestamp, process + ?3, argv, envp, workingdir
        FROM source.executed_files
    ", params![exec, run, proc])?;

    conn.execute("
        INSERT INTO connections(id, run_id, timestamp, process, inbound, family, protocol, address)
        SELECT id + ?1, run_id + ?2, timestamp, process + ?3, inbound, family, protocol, address
        FROM source.connections
    ", params![sock, run, proc])?;

    conn.execute("DETACH DATABASE source", [])?;

    Ok(())
}
