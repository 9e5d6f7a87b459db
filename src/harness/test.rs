use std::cell::RefCell;
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Result};
use crate::store::Writer;
use crate::tracer::{Command, Tracer};
use super::*;

/// Records a single root process exiting with a fixed raw status.
struct Scripted {
    status: i32,
    store:  RefCell<Option<PathBuf>>,
}

struct Broken {
    store: RefCell<Option<PathBuf>>,
}

impl Scripted {
    fn new(status: i32) -> Self {
        Self {
            status: status,
            store:  RefCell::new(None),
        }
    }
}

impl Tracer for Scripted {
    fn trace(&self, binary: &Path, argv: &[String], store: &Path, _verbosity: u64) -> Result<i32> {
        *self.store.borrow_mut() = Some(store.to_owned());
        let mut w = Writer::open(store)?;
        let root  = w.process(None, 10, false)?;
        w.exec(root, &binary.to_string_lossy(), 10, argv, &[], "/")?;
        w.exit(root, 20, self.status, Some(5))?;
        Ok(self.status)
    }
}

impl Tracer for Broken {
    fn trace(&self, binary: &Path, _argv: &[String], store: &Path, _verbosity: u64) -> Result<i32> {
        *self.store.borrow_mut() = Some(store.to_owned());
        Err(anyhow!("failed to launch {}", binary.display()))
    }
}

fn command(args: &[&str]) -> Result<Command> {
    Command::new(&args.iter().map(|s| s.to_string()).collect::<Vec<_>>(), None)
}

#[test]
fn nonzero_exit() -> Result<()> {
    let tracer = Scripted::new(2);
    let mut out = Vec::new();

    let status = testrun(&tracer, &command(&["false"])?, 1, &mut out)?;
    let out    = String::from_utf8(out)?;

    assert_eq!(status, 2);
    assert!(out.contains("|    2  |"), "{}", out);
    assert!(!out.contains("sig"));
    assert!(out.ends_with("\nWarning: program exited with non-zero code 2\n"));

    Ok(())
}

#[test]
fn killed_by_signal() -> Result<()> {
    let tracer = Scripted::new(0x0109);
    let mut out = Vec::new();

    let status = testrun(&tracer, &command(&["sleep", "100"])?, 1, &mut out)?;
    let out    = String::from_utf8(out)?;

    assert_eq!(status, 0x0109);
    assert!(out.contains("| sig9  |"), "{}", out);
    assert!(out.ends_with("\nWarning: program appears to have been terminated by signal 9\n"));

    Ok(())
}

#[test]
fn clean_exit() -> Result<()> {
    let tracer = Scripted::new(0);
    let mut out = Vec::new();

    testrun(&tracer, &command(&["true"])?, 1, &mut out)?;
    let out = String::from_utf8(out)?;

    assert!(out.starts_with(&format!("\n\n{}\n", "-".repeat(79))));
    assert!(!out.contains("Warning"));

    Ok(())
}

#[test]
fn scratch_store_removed() -> Result<()> {
    let tracer = Scripted::new(0);
    let (_, seen) = execute(&tracer, &command(&["true"])?, None, 1, |path| {
        Ok(path.exists())
    })?;
    assert!(seen);

    let store = tracer.store.borrow().clone().ok_or_else(|| anyhow!("not traced"))?;
    assert!(!store.exists());

    Ok(())
}

#[test]
fn scratch_store_removed_on_error() -> Result<()> {
    let tracer = Broken { store: RefCell::new(None) };
    let result = execute(&tracer, &command(&["missing"])?, None, 1, |_| Ok(()));
    assert!(result.is_err());

    let store = tracer.store.borrow().clone().ok_or_else(|| anyhow!("not traced"))?;
    assert!(!store.exists());

    Ok(())
}

#[test]
fn caller_store_kept() -> Result<()> {
    let dir   = tempfile::tempdir()?;
    let path  = dir.path().join("kept.sqlite3");
    let tracer = Scripted::new(0);

    let (status, procs) = execute(&tracer, &command(&["true"])?, Some(&path), 1, |path| {
        Ok(Store::open(path)?.processes()?.len())
    })?;

    assert_eq!(status, 0);
    assert_eq!(procs, 1);
    assert!(path.exists());

    Ok(())
}
