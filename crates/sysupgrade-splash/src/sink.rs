use std::path::{Path, PathBuf};
use std::process::Command;

/// Default location of the boot-splash client binary.
pub const PLYMOUTH: &str = "/usr/bin/plymouth";

/// One operation of the external boot-splash protocol, mapped to the exact
/// argument list it is invoked with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplashRequest {
    Ping,
    DisplayMessage { text: String },
    SetProgress { percent: u64 },
    ChangeMode { mode: String },
}

impl SplashRequest {
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Ping => vec!["--ping".to_string()],
            Self::DisplayMessage { text } => vec![
                "display-message".to_string(),
                "--text".to_string(),
                text.clone(),
            ],
            Self::SetProgress { percent } => vec![
                "system-update".to_string(),
                "--progress".to_string(),
                percent.to_string(),
            ],
            Self::ChangeMode { mode } => {
                vec!["change-mode".to_string(), format!("--{mode}")]
            }
        }
    }
}

/// Executes one splash request and reports its exit code. Zero means the
/// display process handled the call.
pub trait SplashRunner {
    fn call(&mut self, request: &SplashRequest) -> i32;
}

/// Production runner: invokes the splash client as a discrete blocking command.
/// A command that cannot be spawned counts as a nonzero exit.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(PLYMOUTH)
    }
}

impl SplashRunner for ProcessRunner {
    fn call(&mut self, request: &SplashRequest) -> i32 {
        match Command::new(&self.program).args(request.args()).status() {
            Ok(status) => status.code().unwrap_or(1),
            Err(_) => 1,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Liveness {
    Unknown,
    Alive,
    Dead,
}

/// Liveness-tracked dispatcher to the boot-splash process.
///
/// Liveness starts unknown; the first dispatch pings before sending anything.
/// Once a health check fails, every dispatch is a silent no-op until a later
/// `ping` succeeds. Dispatch failures themselves never mutate liveness.
#[derive(Debug)]
pub struct SplashOutput<R> {
    runner: R,
    liveness: Liveness,
    last_message: Option<String>,
}

impl<R: SplashRunner> SplashOutput<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            liveness: Liveness::Unknown,
            last_message: None,
        }
    }

    pub fn alive(&self) -> bool {
        self.liveness == Liveness::Alive
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut R {
        &mut self.runner
    }

    /// Health check. The only operation that mutates liveness.
    pub fn ping(&mut self) {
        let exit = self.runner.call(&SplashRequest::Ping);
        self.liveness = if exit == 0 {
            Liveness::Alive
        } else {
            Liveness::Dead
        };
    }

    fn gate(&mut self) -> bool {
        if self.liveness == Liveness::Unknown {
            self.ping();
        }
        self.alive()
    }

    /// Display a status message. Consecutive identical texts collapse to one call.
    pub fn message(&mut self, text: &str) {
        if !self.gate() {
            return;
        }
        if self.last_message.as_deref() == Some(text) {
            return;
        }
        self.runner.call(&SplashRequest::DisplayMessage {
            text: text.to_string(),
        });
        self.last_message = Some(text.to_string());
    }

    /// Set the splash progress percentage. No dedup here; the transaction
    /// display already filters repeats.
    pub fn progress(&mut self, percent: u64) {
        if !self.gate() {
            return;
        }
        self.runner.call(&SplashRequest::SetProgress { percent });
    }

    pub fn set_mode(&mut self, mode: &str) {
        if !self.gate() {
            return;
        }
        self.runner.call(&SplashRequest::ChangeMode {
            mode: mode.to_string(),
        });
    }
}
