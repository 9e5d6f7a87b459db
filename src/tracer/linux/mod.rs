use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use libc::pid_t;
use log::{debug, info, trace};
use crate::store::{Mode, Writer};
use super::now;
use proc::{Fd, Stat};

mod net;
mod proc;


/// Samples `/proc` for the descendants of the traced root and records
/// what they execute, open and connect to.
pub struct Monitor {
    root:    pid_t,
    procs:   HashMap<pid_t, Tracked>,
    files:   HashSet<(i64, PathBuf, Mode)>,
    socks:   HashSet<(i64, u64)>,
    verbose: bool,
}

#[derive(Debug)]
struct Tracked {
    id:  i64,
    exe: Option<PathBuf>,
    cpu: i64,
}

impl Monitor {
    pub fn new(root: pid_t, id: i64, image: &Path, verbosity: u64) -> Self {
        let mut procs = HashMap::new();
        procs.insert(root, Tracked {
            id:  id,
            exe: fs::canonicalize(image).ok(),
            cpu: 0,
        });

        Self {
            root:    root,
            procs:   procs,
            files:   HashSet::new(),
            socks:   HashSet::new(),
            verbose: verbosity >= 2,
        }
    }

    pub fn poll(&mut self, writer: &mut Writer) -> Result<()> {
        let now   = now();
        let stats = proc::pids()?.into_iter().filter_map(|pid| {
            Some((pid, proc::stat(pid).ok()?))
        }).filter(|(_, stat)| !stat.zombie()).collect::<HashMap<_, _>>();

        self.discover(&stats, writer, now)?;

        let mut table = None;

        for (&pid, tracked) in &mut self.procs {
            if let Some(stat) = stats.get(&pid) {
                tracked.cpu = stat.cpu;
            }

            let exe = proc::exe(pid);
            if exe.is_some() && exe != tracked.exe {
                exec(writer, pid, tracked.id, exe.as_deref(), now)?;
                tracked.exe = exe;
            }

            for fd in proc::fds(pid)? {
                match fd {
                    Fd::File(path, mode, dir) => {
                        if self.files.insert((tracked.id, path.clone(), mode)) {
                            trace!("{} opened {} ({})", pid, path.display(), mode);
                            writer.file(tracked.id, &path.to_string_lossy(), now, mode, dir)?;
                        }
                    }
                    Fd::Socket(inode) => {
                        if !self.socks.insert((tracked.id, inode)) {
                            continue;
                        }
                        let table = table.get_or_insert_with(net::sockets);
                        if let Some(s) = table.get(&inode) {
                            let addr = s.address.to_string();
                            debug!("{} {} {} {}", pid, s.protocol, direction(s.inbound), addr);
                            writer.connect(tracked.id, now, s.inbound, s.family, s.protocol, &addr)?;
                        }
                    }
                }
            }
        }

        let root = self.root;
        let gone = self.procs.keys().filter(|&&pid| {
            pid != root && !stats.contains_key(&pid)
        }).copied().collect::<Vec<_>>();

        for pid in gone {
            if let Some(tracked) = self.procs.remove(&pid) {
                debug!("process {} exited", pid);
                writer.exit(tracked.id, now, 0, Some(tracked.cpu))?;
            }
        }

        Ok(())
    }

    /// Closes the rows of every descendant still being tracked.
    pub fn finish(&mut self, writer: &mut Writer) -> Result<()> {
        let now  = now();
        let root = self.root;
        for (_, tracked) in self.procs.drain().filter(|(pid, _)| *pid != root) {
            writer.exit(tracked.id, now, 0, Some(tracked.cpu))?;
        }
        Ok(())
    }

    fn discover(&mut self, stats: &HashMap<pid_t, Stat>, writer: &mut Writer, now: i64) -> Result<()> {
        loop {
            let mut found = stats.iter().filter(|(pid, stat)| {
                !self.procs.contains_key(*pid) && self.procs.contains_key(&stat.ppid)
            }).map(|(&pid, stat)| (pid, stat.ppid)).collect::<Vec<_>>();

            if found.is_empty() {
                return Ok(());
            }

            found.sort();

            for (pid, ppid) in found {
                let (parent, inherited) = match self.procs.get(&ppid) {
                    Some(p) => (p.id, p.exe.clone()),
                    None    => continue,
                };

                let id  = writer.process(Some(parent), now, false)?;
                let exe = proc::exe(pid);

                if self.verbose {
                    info!("process {} started by {}", pid, ppid);
                } else {
                    debug!("process {} started by {}", pid, ppid);
                }

                if exe.is_some() && exe != inherited {
                    exec(writer, pid, id, exe.as_deref(), now)?;
                }

                if let Some(cwd) = proc::cwd(pid) {
                    let cwd = cwd.to_string_lossy();
                    writer.file(id, &cwd, now, Mode::WDIR, true)?;
                }

                self.procs.insert(pid, Tracked {
                    id:  id,
                    exe: exe.or(inherited),
                    cpu: 0,
                });
            }
        }
    }
}

fn exec(writer: &mut Writer, pid: pid_t, id: i64, exe: Option<&Path>, now: i64) -> Result<()> {
    let name = exe.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default();
    let argv = proc::or_default(proc::cmdline(pid))?;
    let envp = proc::or_default(proc::environ(pid))?;
    let cwd  = proc::cwd(pid).map(|p| p.to_string_lossy().into_owned()).unwrap_or_default();

    trace!("{} executed {}: {:?}", pid, name, argv);

    writer.exec(id, &name, now, &argv, &envp, &cwd)?;

    Ok(())
}

fn direction(inbound: bool) -> &'static str {
    match inbound {
        true  => "from",
        false => "to",
    }
}
