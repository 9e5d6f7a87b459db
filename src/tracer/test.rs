use std::env;
use std::os::unix::process::ExitStatusExt;
use std::process;
use std::thread::sleep;
use std::time::Duration;
use anyhow::Result;
use tempfile::tempdir;
use crate::store::{Store, TRACE};
use super::*;

#[test]
fn status_decode() {
    assert_eq!(Status::decode(0),      Status::Exited(0));
    assert_eq!(Status::decode(2),      Status::Exited(2));
    assert_eq!(Status::decode(0x0109), Status::Signaled(9));
    assert_eq!(Status::Signaled(15).encode(), SIGNALED | 15);
    assert_eq!(Status::Exited(3).encode(), 3);
}

#[test]
fn status_warnings() {
    assert_eq!(Status::Exited(0).warning(), None);
    assert_eq!(
        Status::Exited(2).warning().as_deref(),
        Some("program exited with non-zero code 2"),
    );
    assert_eq!(
        Status::Signaled(9).warning().as_deref(),
        Some("program appears to have been terminated by signal 9"),
    );
    assert_eq!(Status::Signaled(9).to_string(), "sig9");
    assert!(Status::Exited(0).success());
}

#[test]
fn command_arg0() -> Result<()> {
    let cmdline = vec!["/bin/ls".to_owned(), "-l".to_owned()];

    let cmd = Command::new(&cmdline, None)?;
    assert_eq!(cmd.binary, PathBuf::from("/bin/ls"));
    assert_eq!(cmd.argv, vec!["/bin/ls", "-l"]);

    let cmd = Command::new(&cmdline, Some("listing"))?;
    assert_eq!(cmd.binary, PathBuf::from("/bin/ls"));
    assert_eq!(cmd.argv, vec!["listing", "-l"]);

    assert!(Command::new(&[], None).is_err());

    Ok(())
}

#[test]
fn trace_exit_code() -> Result<()> {
    let dir    = tempdir()?;
    let store  = dir.path().join(TRACE);
    let tracer = ProcTracer::new().interval(Duration::from_millis(1));
    let argv   = ["sh", "-c", "exit 3"].iter().map(|s| s.to_string()).collect::<Vec<_>>();

    let status = tracer.trace(Path::new("sh"), &argv, &store, 0)?;
    assert_eq!(Status::decode(status), Status::Exited(3));

    let store = Store::open(&store)?;
    let procs = store.processes()?;
    assert_eq!(procs[0].parent, None);
    assert_eq!(procs[0].exitcode, Some(3));
    assert!(procs[0].exit_timestamp.is_some());

    let execs = store.executed_files()?;
    assert_eq!(execs[0].process, procs[0].id);
    assert_eq!(execs[0].argv, argv);

    Ok(())
}

#[test]
fn trace_signal() -> Result<()> {
    let dir    = tempdir()?;
    let store  = dir.path().join(TRACE);
    let argv   = ["sh", "-c", "kill -9 $$"].iter().map(|s| s.to_string()).collect::<Vec<_>>();

    let status = ProcTracer::default().trace(Path::new("sh"), &argv, &store, 0)?;
    assert_eq!(Status::decode(status), Status::Signaled(9));

    Ok(())
}

#[test]
fn trace_missing_program() -> Result<()> {
    let dir   = tempdir()?;
    let store = dir.path().join(TRACE);
    let argv  = vec!["reprotrace-no-such-program".to_owned()];

    let result = ProcTracer::default().trace(Path::new(&argv[0]), &argv, &store, 0);
    assert!(result.is_err());

    Ok(())
}

#[test]
#[ignore]
fn terminate_after_trace() -> Result<()> {
    if env::var_os("REPROTRACE_SIGNAL_CHILD").is_none() {
        return Ok(());
    }

    let dir  = tempdir()?;
    let argv = vec!["true".to_owned()];
    ProcTracer::default().trace(Path::new("true"), &argv, &dir.path().join(TRACE), 0)?;

    unsafe { libc::raise(libc::SIGTERM) };
    sleep(Duration::from_millis(500));

    Ok(())
}

#[test]
fn default_signals_after_trace() -> Result<()> {
    let status = process::Command::new(env::current_exe()?)
        .args(&["tracer::test::terminate_after_trace", "--exact", "--ignored", "--nocapture"])
        .env("REPROTRACE_SIGNAL_CHILD", "1")
        .stdout(process::Stdio::null())
        .stderr(process::Stdio::null())
        .status()?;

    assert_eq!(status.signal(), Some(libc::SIGTERM));

    Ok(())
}
