use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use anyhow::{anyhow, Result};

pub use engine::ProcTracer;
pub use status::{Status, SIGNALED};

mod engine;
mod status;

#[cfg(target_os = "linux")]
#[path = "linux/mod.rs"]
mod monitor;

#[cfg(not(target_os = "linux"))]
#[path = "monitor.rs"]
mod monitor;

#[cfg(test)]
mod test;

/// Runs a program to completion while recording its activity into a
/// trace store.
///
/// Returns the raw exit status of the traced program (see [`Status`]).
/// An `Err` means the engine itself failed, not the program.
pub trait Tracer {
    fn trace(&self, binary: &Path, argv: &[String], store: &Path, verbosity: u64) -> Result<i32>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Command {
    pub binary: PathBuf,
    pub argv:   Vec<String>,
}

impl Command {
    /// `cmdline[0]` is the program to run; `arg0` replaces the first
    /// argument it sees.
    pub fn new(cmdline: &[String], arg0: Option<&str>) -> Result<Self> {
        let (binary, rest) = cmdline.split_first().ok_or_else(|| {
            anyhow!("missing command-line")
        })?;

        let mut argv = Vec::with_capacity(cmdline.len());
        argv.push(arg0.unwrap_or(binary).to_owned());
        argv.extend(rest.iter().cloned());

        Ok(Self {
            binary: PathBuf::from(binary),
            argv:   argv,
        })
    }
}

/// Microseconds since the epoch.
pub fn now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| {
        d.as_micros() as i64
    }).unwrap_or(0)
}
