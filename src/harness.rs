use std::io::Write;
use std::path::Path;
use anyhow::{Context, Result};
use log::debug;
use tempfile::{Builder, TempPath};
use crate::report;
use crate::store::Store;
use crate::tracer::{Command, Status, Tracer};

/// Scratch trace store, deleted when dropped.
pub struct TempStore {
    path: TempPath,
}

impl TempStore {
    pub fn new() -> Result<Self> {
        let file = Builder::new().prefix("reprozip_").suffix(".sqlite3").tempfile();
        Ok(Self {
            path: file.context("failed to create temporary trace store")?.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Traces `cmd` into `store`, or into a scratch store when none is given,
/// and hands the store to `inspect` before it is released.
///
/// The scratch store is removed however this returns.
pub fn execute<R, F>(tracer: &dyn Tracer, cmd: &Command, store: Option<&Path>, verbosity: u64, inspect: F) -> Result<(i32, R)>
where
    F: FnOnce(&Path) -> Result<R>,
{
    let temp;
    let path = match store {
        Some(path) => path,
        None       => {
            temp = TempStore::new()?;
            temp.path()
        }
    };

    debug!("starting tracer, binary={:?}, argv={:?}", cmd.binary, cmd.argv);

    let status = tracer.trace(&cmd.binary, &cmd.argv, path, verbosity)?;
    let result = inspect(path)?;

    Ok((status, result))
}

/// Traces `cmd` into a scratch store and dumps what was recorded.
pub fn testrun<W: Write>(tracer: &dyn Tracer, cmd: &Command, verbosity: u64, out: &mut W) -> Result<i32> {
    let (status, ()) = execute(tracer, cmd, None, verbosity, |path| {
        writeln!(out, "\n\n{}", "-".repeat(79))?;
        report::print(&Store::open(path)?, out)
    })?;

    if let Some(warning) = Status::decode(status).warning() {
        writeln!(out, "\nWarning: {}", warning)?;
    }

    Ok(status)
}

#[cfg(test)]
mod test;
