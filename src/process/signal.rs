//! Signal names accepted by [`ProcessLike::kill`](super::ProcessLike::kill).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A POSIX signal, identified by its `SIG*` name.
///
/// In-process tasks only distinguish "cancelled" from "not cancelled";
/// the signal value matters to OS processes, which receive it verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcSig {
    SigAbrt,
    SigAlrm,
    SigBus,
    SigChld,
    SigCont,
    SigFpe,
    SigHup,
    SigIll,
    SigInt,
    SigIo,
    SigKill,
    SigPipe,
    SigProf,
    SigPwr,
    SigQuit,
    SigSegv,
    SigStop,
    SigSys,
    SigTerm,
    SigTrap,
    SigTstp,
    SigTtin,
    SigTtou,
    SigUrg,
    SigUsr1,
    SigUsr2,
    SigVtalrm,
    SigWinch,
    SigXcpu,
    SigXfsz,
}

impl ProcSig {
    /// Every supported signal, in declaration order.
    pub const ALL: [Self; 30] = [
        Self::SigAbrt,
        Self::SigAlrm,
        Self::SigBus,
        Self::SigChld,
        Self::SigCont,
        Self::SigFpe,
        Self::SigHup,
        Self::SigIll,
        Self::SigInt,
        Self::SigIo,
        Self::SigKill,
        Self::SigPipe,
        Self::SigProf,
        Self::SigPwr,
        Self::SigQuit,
        Self::SigSegv,
        Self::SigStop,
        Self::SigSys,
        Self::SigTerm,
        Self::SigTrap,
        Self::SigTstp,
        Self::SigTtin,
        Self::SigTtou,
        Self::SigUrg,
        Self::SigUsr1,
        Self::SigUsr2,
        Self::SigVtalrm,
        Self::SigWinch,
        Self::SigXcpu,
        Self::SigXfsz,
    ];

    /// The conventional `SIG*` name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SigAbrt => "SIGABRT",
            Self::SigAlrm => "SIGALRM",
            Self::SigBus => "SIGBUS",
            Self::SigChld => "SIGCHLD",
            Self::SigCont => "SIGCONT",
            Self::SigFpe => "SIGFPE",
            Self::SigHup => "SIGHUP",
            Self::SigIll => "SIGILL",
            Self::SigInt => "SIGINT",
            Self::SigIo => "SIGIO",
            Self::SigKill => "SIGKILL",
            Self::SigPipe => "SIGPIPE",
            Self::SigProf => "SIGPROF",
            Self::SigPwr => "SIGPWR",
            Self::SigQuit => "SIGQUIT",
            Self::SigSegv => "SIGSEGV",
            Self::SigStop => "SIGSTOP",
            Self::SigSys => "SIGSYS",
            Self::SigTerm => "SIGTERM",
            Self::SigTrap => "SIGTRAP",
            Self::SigTstp => "SIGTSTP",
            Self::SigTtin => "SIGTTIN",
            Self::SigTtou => "SIGTTOU",
            Self::SigUrg => "SIGURG",
            Self::SigUsr1 => "SIGUSR1",
            Self::SigUsr2 => "SIGUSR2",
            Self::SigVtalrm => "SIGVTALRM",
            Self::SigWinch => "SIGWINCH",
            Self::SigXcpu => "SIGXCPU",
            Self::SigXfsz => "SIGXFSZ",
        }
    }
}

impl fmt::Display for ProcSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown signal name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown signal: {0}")]
pub struct UnknownSignal(pub String);

impl FromStr for ProcSig {
    type Err = UnknownSignal;

    /// Accepts `SIGTERM`, `sigterm` and the bare `TERM` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let wanted = if upper.starts_with("SIG") {
            upper
        } else {
            format!("SIG{upper}")
        };
        Self::ALL
            .into_iter()
            .find(|sig| sig.as_str() == wanted)
            .ok_or_else(|| UnknownSignal(s.to_string()))
    }
}
