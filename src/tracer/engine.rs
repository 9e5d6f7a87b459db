use std::env;
use std::mem;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::sleep;
use std::time::Duration;
use anyhow::{anyhow, Context, Result};
use errno::errno;
use libc::pid_t;
use log::{debug, info, warn};
use signal_hook::SigId;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag::register;
use signal_hook::low_level::{self, emulate_default_handler, unregister};
use crate::store::{Mode, Writer};
use super::monitor::Monitor;
use super::{now, Status, Tracer};

/// Tracer that observes the program from outside, sampling the process
/// tree while waiting for the root to exit.
pub struct ProcTracer {
    interval: Duration,
}

static ACTIVE:   AtomicUsize = AtomicUsize::new(0);
static DEFAULTS: Mutex<bool> = Mutex::new(false);

struct Interrupts {
    flag: Arc<AtomicBool>,
    ids:  Vec<SigId>,
}

impl ProcTracer {
    pub fn new() -> Self {
        Self {
            interval: Duration::from_millis(5),
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for ProcTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer for ProcTracer {
    fn trace(&self, binary: &Path, argv: &[String], store: &Path, verbosity: u64) -> Result<i32> {
        let mut writer = Writer::open(store)?;

        let image = which::which(binary).unwrap_or_else(|_| binary.to_path_buf());
        let cwd   = env::current_dir()?;
        let envp  = env::vars_os().map(|(k, v)| {
            format!("{}={}", k.to_string_lossy(), v.to_string_lossy())
        }).collect::<Vec<_>>();

        let interrupts = Interrupts::install()?;

        let mut cmd = process::Command::new(binary);
        if let Some((arg0, args)) = argv.split_first() {
            cmd.arg0(arg0).args(args);
        }

        let child = cmd.spawn().with_context(|| {
            format!("failed to launch {}", binary.display())
        })?;

        let pid   = child.id() as pid_t;
        let start = now();
        debug!("tracing pid {}: {:?}", pid, argv);

        let root = writer.process(None, start, false)?;
        let cwd  = cwd.to_string_lossy();
        writer.exec(root, &image.to_string_lossy(), start, argv, &envp, &cwd)?;
        writer.file(root, &cwd, start, Mode::WDIR, true)?;

        let mut monitor = Some(Monitor::new(pid, root, &image, verbosity));

        let (status, cpu) = loop {
            if let Some(done) = reap(pid)? {
                break done;
            }

            if let Some(Err(e)) = monitor.as_mut().map(|m| m.poll(&mut writer)) {
                warn!("process monitor failed, only the exit status will be recorded: {:?}", e);
                monitor = None;
            }

            sleep(self.interval);
        };

        if let Some(mut monitor) = monitor {
            monitor.finish(&mut writer)?;
        }
        writer.exit(root, now(), status.encode(), Some(cpu))?;

        if interrupts.triggered() {
            warn!("interrupted while tracing");
        }

        info!("traced program finished with status {}", status);

        Ok(status.encode())
    }
}

impl Interrupts {
    // The traced program receives terminal signals itself; the tracer
    // must outlive it to record the exit and clean up.
    fn install() -> Result<Self> {
        defaults()?;

        ACTIVE.fetch_add(1, Ordering::AcqRel);

        let mut this = Self {
            flag: Arc::new(AtomicBool::new(false)),
            ids:  Vec::new(),
        };

        for &signal in &[SIGINT, SIGTERM] {
            this.ids.push(register(signal, this.flag.clone())?);
        }

        Ok(this)
    }

    fn triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl Drop for Interrupts {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            unregister(id);
        }
        ACTIVE.fetch_sub(1, Ordering::AcqRel);
    }
}

// SIGINT and SIGTERM keep their default action while no trace is running.
fn defaults() -> Result<()> {
    let mut installed = DEFAULTS.lock().map_err(|_| anyhow!("signal state poisoned"))?;
    if *installed {
        return Ok(());
    }

    for &signal in &[SIGINT, SIGTERM] {
        unsafe {
            low_level::register(signal, move || {
                if ACTIVE.load(Ordering::Acquire) == 0 {
                    let _ = emulate_default_handler(signal);
                }
            })?;
        }
    }

    *installed = true;
    Ok(())
}

fn reap(pid: pid_t) -> Result<Option<(Status, i64)>> {
    let mut status = 0;
    let mut usage  = unsafe { mem::zeroed::<libc::rusage>() };

    match unsafe { libc::wait4(pid, &mut status, libc::WNOHANG, &mut usage) } {
        0            => Ok(None),
        n if n < 0   => match errno() {
            e if e.0 == libc::EINTR => Ok(None),
            e                       => Err(anyhow!("wait for {} failed: {}", pid, e)),
        },
        _            => {
            let cpu = millis(&usage.ru_utime) + millis(&usage.ru_stime);
            Ok(Some((Status::from_wait(status), cpu)))
        }
    }
}

fn millis(tv: &libc::timeval) -> i64 {
    tv.tv_sec as i64 * 1000 + tv.tv_usec as i64 / 1000
}
