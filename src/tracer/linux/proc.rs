use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use anyhow::{anyhow, Result};
use libc::pid_t;
use crate::store::Mode;

#[derive(Debug)]
pub struct Stat {
    pub ppid:  pid_t,
    pub state: char,
    pub cpu:   i64,
}

#[derive(Debug, Eq, PartialEq)]
pub enum Fd {
    File(PathBuf, Mode, bool),
    Socket(u64),
}

impl Stat {
    pub fn zombie(&self) -> bool {
        self.state == 'Z' || self.state == 'X'
    }
}

pub fn pids() -> Result<Vec<pid_t>> {
    Ok(fs::read_dir("/proc")?.filter_map(|entry| {
        entry.ok()?.file_name().to_str()?.parse().ok()
    }).collect())
}

pub fn stat(pid: pid_t) -> Result<Stat> {
    parse_stat(&fs::read_to_string(format!("/proc/{}/stat", pid))?, ticks())
}

pub fn parse_stat(stat: &str, ticks: i64) -> Result<Stat> {
    // comm may contain spaces and parens, fields resume after the last ')'
    let rest = match stat.rfind(')') {
        Some(n) => &stat[n + 1..],
        None    => return Err(anyhow!("malformed stat: {}", stat)),
    };

    let fields = rest.split_whitespace().collect::<Vec<_>>();
    let field  = |n: usize| fields.get(n).copied().ok_or_else(|| {
        anyhow!("missing stat field {}", n)
    });

    let state = field(0)?.chars().next().unwrap_or('?');
    let ppid  = field(1)?.parse()?;
    let utime = field(11)?.parse::<i64>()?;
    let stime = field(12)?.parse::<i64>()?;

    Ok(Stat {
        ppid:  ppid,
        state: state,
        cpu:   (utime + stime) * 1000 / ticks,
    })
}

pub fn exe(pid: pid_t) -> Option<PathBuf> {
    fs::read_link(format!("/proc/{}/exe", pid)).ok()
}

pub fn cwd(pid: pid_t) -> Option<PathBuf> {
    fs::read_link(format!("/proc/{}/cwd", pid)).ok()
}

pub fn cmdline(pid: pid_t) -> Result<Vec<String>> {
    strings(&fs::read(format!("/proc/{}/cmdline", pid))?)
}

pub fn environ(pid: pid_t) -> Result<Vec<String>> {
    strings(&fs::read(format!("/proc/{}/environ", pid))?)
}

pub fn fds(pid: pid_t) -> Result<Vec<Fd>> {
    let dir = match fs::read_dir(format!("/proc/{}/fd", pid)) {
        Ok(dir) => dir,
        Err(e)  => return or_default(Err(e.into())),
    };

    let mut fds = Vec::new();

    for entry in dir.filter_map(Result::ok) {
        let link = match fs::read_link(entry.path()) {
            Ok(link) => link,
            Err(_)   => continue,
        };

        let text = link.to_string_lossy();

        if let Some(inode) = socket(&text) {
            fds.push(Fd::Socket(inode));
            continue;
        }

        if !text.starts_with('/') || text.ends_with(" (deleted)") {
            continue;
        }

        let meta = match fs::metadata(&link) {
            Ok(meta) if meta.is_file() || meta.is_dir() => meta,
            _                                           => continue,
        };

        let info  = format!("/proc/{}/fdinfo/{}", pid, entry.file_name().to_string_lossy());
        let flags = fs::read_to_string(info).ok().and_then(|s| flags(&s)).unwrap_or(0);

        fds.push(Fd::File(link, mode(flags), meta.is_dir()));
    }

    Ok(fds)
}

pub fn socket(link: &str) -> Option<u64> {
    link.strip_prefix("socket:[")?.strip_suffix(']')?.parse().ok()
}

pub fn flags(fdinfo: &str) -> Option<i32> {
    let line = fdinfo.lines().find(|line| line.starts_with("flags:"))?;
    i32::from_str_radix(line["flags:".len()..].trim(), 8).ok()
}

pub fn mode(flags: i32) -> Mode {
    match flags & libc::O_ACCMODE {
        libc::O_RDONLY => Mode::READ,
        libc::O_WRONLY => Mode::WRITE,
        _              => Mode::READ | Mode::WRITE,
    }
}

fn strings(raw: &[u8]) -> Result<Vec<String>> {
    let mut parts = raw.split(|&c| c == 0).map(|part| {
        String::from_utf8_lossy(part).into_owned()
    }).collect::<Vec<_>>();
    if parts.last().map_or(false, String::is_empty) {
        parts.pop();
    }
    Ok(parts)
}

fn ticks() -> i64 {
    match unsafe { libc::sysconf(libc::_SC_CLK_TCK) } {
        n if n > 0 => n as i64,
        _          => 100,
    }
}

pub fn or_default<T: Default>(r: Result<T>) -> Result<T> {
    r.or_else(|e| {
        match e.downcast_ref::<std::io::Error>() {
            Some(e) if e.kind() == ErrorKind::NotFound         => Ok(T::default()),
            Some(e) if e.kind() == ErrorKind::PermissionDenied => Ok(T::default()),
            _                                                  => Err(e),
        }
    })
}
