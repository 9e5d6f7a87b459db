use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Process {
    pub id:             i64,
    pub run:            i64,
    pub parent:         Option<i64>,
    pub timestamp:      i64,
    pub exit_timestamp: Option<i64>,
    pub is_thread:      bool,
    pub exitcode:       Option<i32>,
    pub cpu_time:       Option<i64>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExecutedFile {
    pub id:         i64,
    pub name:       String,
    pub run:        i64,
    pub timestamp:  i64,
    pub process:    i64,
    pub argv:       Vec<String>,
    pub envp:       Vec<String>,
    pub workingdir: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OpenedFile {
    pub id:           i64,
    pub run:          i64,
    pub name:         String,
    pub timestamp:    i64,
    pub mode:         Mode,
    pub is_directory: bool,
    pub process:      i64,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Connection {
    pub id:        i64,
    pub run:       i64,
    pub timestamp: i64,
    pub process:   i64,
    pub inbound:   bool,
    pub family:    Option<String>,
    pub protocol:  Option<String>,
    pub address:   Option<String>,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Mode(pub u32);

impl Mode {
    pub const READ:  Mode = Mode(0x01);
    pub const WRITE: Mode = Mode(0x02);
    pub const WDIR:  Mode = Mode(0x04);
    pub const STAT:  Mode = Mode(0x08);
    pub const LINK:  Mode = Mode(0x10);

    pub fn contains(self, other: Mode) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_read(self) -> bool {
        self.contains(Mode::READ)
    }

    pub fn is_write(self) -> bool {
        self.contains(Mode::WRITE)
    }
}

impl std::ops::BitOr for Mode {
    type Output = Mode;

    fn bitor(self, rhs: Mode) -> Mode {
        Mode(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Mode {
    fn bitor_assign(&mut self, rhs: Mode) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Splits a NUL-delimited argument or environment vector. The trailing
/// terminator leaves an empty last element, which is dropped.
pub fn split_argv(raw: &str) -> Vec<String> {
    let mut argv = raw.split('\0').map(str::to_owned).collect::<Vec<_>>();
    if argv.last().map_or(false, String::is_empty) {
        argv.pop();
    }
    argv
}

pub fn join_argv<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter().fold(String::new(), |mut acc, arg| {
        acc.push_str(arg.as_ref());
        acc.push('\0');
        acc
    })
}
