use std::fmt;

/// Set in a raw status when the program was killed by a signal.
pub const SIGNALED: i32 = 0x0100;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    Exited(i32),
    Signaled(i32),
}

impl Status {
    pub fn decode(raw: i32) -> Self {
        match raw & SIGNALED {
            0 => Status::Exited(raw & 0xFF),
            _ => Status::Signaled(raw & 0xFF),
        }
    }

    pub fn encode(self) -> i32 {
        match self {
            Status::Exited(code)  => code & 0xFF,
            Status::Signaled(sig) => SIGNALED | (sig & 0xFF),
        }
    }

    /// Interprets a status word returned by `wait`.
    pub fn from_wait(status: libc::c_int) -> Self {
        if libc::WIFSIGNALED(status) {
            Status::Signaled(libc::WTERMSIG(status))
        } else {
            Status::Exited(libc::WEXITSTATUS(status))
        }
    }

    pub fn success(self) -> bool {
        self == Status::Exited(0)
    }

    pub fn warning(self) -> Option<String> {
        match self {
            Status::Exited(0)     => None,
            Status::Exited(code)  => Some(format!("program exited with non-zero code {}", code)),
            Status::Signaled(sig) => Some(format!("program appears to have been terminated by signal {}", sig)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Status::Exited(code)  => write!(f, "{}", code),
            Status::Signaled(sig) => write!(f, "sig{}", sig),
        }
    }
}
