//! Help probing for partially typed command lines.
//!
//! A command line being completed is usually not a valid invocation yet: the
//! last token may be half a subcommand, half a flag, or half a value. The
//! [`Prober`] appends `--help` and runs the tool, backing off one trailing
//! token at a time until the tool accepts the prefix and prints help.
//!
//! Two failure shapes are told apart by the tool's stderr:
//!
//! - `expected one argument` means the last token is an unfinished value
//!   (a path, a port, ...). Probing stops with empty help text.
//! - anything else means the last token is not recognized. It is dropped and
//!   the shorter prefix is tried.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use help_complete_discovery::probe::{ProcessRunner, Prober};
//!
//! let prober = Prober::new(ProcessRunner::new(Some(Duration::from_secs(5))));
//! let help = prober.probe("cargo buil").unwrap();
//! println!("{help}");
//! ```

use std::io::{ErrorKind, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use help_complete_core::CommandLine;
use tracing::debug;
use wait_timeout::ChildExt;

/// Flag appended to every probed prefix.
pub const HELP_FLAG: &str = "--help";

/// Stderr marker meaning the last token is an incomplete argument value.
pub const EXPECTED_ARGUMENT_ERROR: &str = "expected one argument";

/// Errors produced while probing for help text.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The command line contained no tokens.
    #[error("nothing to complete: command line is empty")]
    EmptyCommandLine,

    /// The tool could not be started at all.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool did not exit within the probe timeout.
    #[error("'{}' did not finish within {}ms", .argv.join(" "), .timeout.as_millis())]
    Timeout { argv: Vec<String>, timeout: Duration },

    /// Waiting on the tool or reading its output failed.
    #[error("failed to collect output of '{}': {source}", .argv.join(" "))]
    Io {
        argv: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    /// Every prefix down to the bare program failed.
    #[error(
        "'{}' returned non-zero exit status {}: {}",
        .argv.join(" "),
        exit_label(.exit_code),
        .stderr.trim()
    )]
    Exhausted {
        argv: Vec<String>,
        exit_code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "(signal)".to_string(), |code| code.to_string())
}

/// Outcome of one finished help invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Invocation {
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    fn expects_argument(&self) -> bool {
        self.stderr.contains(EXPECTED_ARGUMENT_ERROR)
    }
}

/// Runs one help invocation. `argv[0]` is the program.
pub trait HelpRunner {
    fn run(&self, argv: &[String]) -> Result<Invocation, ProbeError>;
}

/// [`HelpRunner`] that spawns the tool as a child process without a shell.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// `None` waits for the tool indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn wait(&self, child: &mut Child, argv: &[String]) -> Result<ExitStatus, ProbeError> {
        let io_error = |source| ProbeError::Io {
            argv: argv.to_vec(),
            source,
        };
        let Some(timeout) = self.timeout else {
            return child.wait().map_err(io_error);
        };
        match child.wait_timeout(timeout).map_err(io_error)? {
            Some(status) => Ok(status),
            None => {
                debug!(
                    command = ?argv,
                    timeout_ms = timeout.as_millis() as u64,
                    "Help command timed out, killing process"
                );
                let _ = child.kill();
                let _ = child.wait();
                Err(ProbeError::Timeout {
                    argv: argv.to_vec(),
                    timeout,
                })
            }
        }
    }
}

impl HelpRunner for ProcessRunner {
    fn run(&self, argv: &[String]) -> Result<Invocation, ProbeError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(ProbeError::EmptyCommandLine);
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                if source.kind() == ErrorKind::NotFound {
                    debug!(program = %program, "Program not found");
                }
                ProbeError::Spawn {
                    program: program.clone(),
                    source,
                }
            })?;

        // Drain both pipes in the background so a chatty child cannot block
        // on a full pipe buffer before it exits.
        let stdout_thread = child.stdout.take().map(drain);
        let stderr_thread = child.stderr.take().map(drain);

        let status = self.wait(&mut child, argv)?;
        let stdout = collect(stdout_thread, argv)?;
        let stderr = collect(stderr_thread, argv)?;

        Ok(Invocation {
            success: status.success(),
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(
    handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    argv: &[String],
) -> Result<String, ProbeError> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let buf = handle
        .join()
        .unwrap_or_else(|_| Err(std::io::Error::other("output reader panicked")))
        .map_err(|source| ProbeError::Io {
            argv: argv.to_vec(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Finds the longest prefix of a command line the tool prints help for.
#[derive(Debug, Clone)]
pub struct Prober<R> {
    runner: R,
}

impl<R: HelpRunner> Prober<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Returns the help text of the longest accepted prefix.
    ///
    /// Returns an empty string when the tool reports that the last token is
    /// an incomplete argument value. Fails with [`ProbeError::Exhausted`]
    /// when no prefix is accepted.
    pub fn probe(&self, command_line: impl Into<CommandLine>) -> Result<String, ProbeError> {
        let mut tokens = command_line.into().tokens();
        if tokens.is_empty() {
            return Err(ProbeError::EmptyCommandLine);
        }

        loop {
            let mut argv = tokens.clone();
            argv.push(HELP_FLAG.to_string());

            debug!(command = ?argv, "Probing help");
            let invocation = self.runner.run(&argv)?;

            if invocation.success {
                debug!(
                    command = ?argv,
                    length = invocation.stdout.len(),
                    "Got help output"
                );
                return Ok(invocation.stdout);
            }
            if invocation.expects_argument() {
                debug!(command = ?argv, "Last token is an unfinished argument value");
                return Ok(String::new());
            }

            tokens.pop();
            if tokens.is_empty() {
                return Err(ProbeError::Exhausted {
                    argv,
                    exit_code: invocation.exit_code,
                    stderr: invocation.stderr,
                });
            }
            debug!(
                command = ?argv,
                exit_code = ?invocation.exit_code,
                "Prefix rejected, dropping last token"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    /// Runner that answers from a table keyed by the joined argv and records
    /// every call.
    struct ScriptedRunner {
        responses: HashMap<String, Invocation>,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        fn new(responses: &[(&str, Invocation)]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(argv, inv)| ((*argv).to_string(), inv.clone()))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|argv| argv.join(" ")).collect()
        }
    }

    impl HelpRunner for ScriptedRunner {
        fn run(&self, argv: &[String]) -> Result<Invocation, ProbeError> {
            self.calls.borrow_mut().push(argv.to_vec());
            Ok(self
                .responses
                .get(&argv.join(" "))
                .cloned()
                .unwrap_or_else(|| Invocation::failed(2, "error: invalid choice")))
        }
    }

    #[test]
    fn test_probe_returns_first_accepted_help() {
        let prober = Prober::new(ScriptedRunner::new(&[(
            "a b --help",
            Invocation::succeeded("usage: a b"),
        )]));
        assert_eq!(prober.probe("a b").unwrap(), "usage: a b");
        assert_eq!(prober.runner().calls(), vec!["a b --help"]);
    }

    #[test]
    fn test_probe_backs_off_one_token_at_a_time() {
        let prober = Prober::new(ScriptedRunner::new(&[(
            "a --help",
            Invocation::succeeded("usage: a {x,y}"),
        )]));

        assert_eq!(prober.probe("a b c").unwrap(), "usage: a {x,y}");
        assert_eq!(
            prober.runner().calls(),
            vec!["a b c --help", "a b --help", "a --help"]
        );
    }

    #[test]
    fn test_probe_stops_on_expected_argument() {
        let prober = Prober::new(ScriptedRunner::new(&[(
            "a run --port --help",
            Invocation::failed(2, "a run: error: argument --port: expected one argument"),
        )]));

        assert_eq!(prober.probe("a run --port").unwrap(), "");
        assert_eq!(prober.runner().calls(), vec!["a run --port --help"]);
    }

    #[test]
    fn test_probe_expected_argument_after_backoff() {
        let prober = Prober::new(ScriptedRunner::new(&[(
            "a --out --help",
            Invocation::failed(2, "expected one argument"),
        )]));

        assert_eq!(prober.probe("a --out partial/pa").unwrap(), "");
        assert_eq!(
            prober.runner().calls(),
            vec!["a --out partial/pa --help", "a --out --help"]
        );
    }

    #[test]
    fn test_probe_exhausted_carries_last_failure() {
        let prober = Prober::new(ScriptedRunner::new(&[(
            "a --help",
            Invocation::failed(3, "a: broken install\n"),
        )]));

        let err = prober.probe("a b").unwrap_err();
        match &err {
            ProbeError::Exhausted {
                argv,
                exit_code,
                stderr,
            } => {
                assert_eq!(argv, &vec!["a".to_string(), "--help".to_string()]);
                assert_eq!(*exit_code, Some(3));
                assert_eq!(stderr, "a: broken install\n");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("broken install"));
        assert_eq!(prober.runner().calls(), vec!["a b --help", "a --help"]);
    }

    #[test]
    fn test_probe_empty_line_is_an_error() {
        let prober = Prober::new(ScriptedRunner::new(&[]));
        assert!(matches!(
            prober.probe("   "),
            Err(ProbeError::EmptyCommandLine)
        ));
        assert!(prober.runner().calls().is_empty());
    }

    #[test]
    fn test_process_runner_spawn_failure() {
        let runner = ProcessRunner::new(Some(Duration::from_secs(5)));
        let argv = vec![
            "__help_complete_missing_command__".to_string(),
            HELP_FLAG.to_string(),
        ];
        assert!(matches!(runner.run(&argv), Err(ProbeError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_runner_captures_output_and_status() {
        let runner = ProcessRunner::new(Some(Duration::from_secs(10)));

        let ok = runner
            .run(&["sh".into(), "-c".into(), "echo usage; echo oops >&2".into()])
            .unwrap();
        assert!(ok.success);
        assert_eq!(ok.exit_code, Some(0));
        assert_eq!(ok.stdout.trim(), "usage");
        assert_eq!(ok.stderr.trim(), "oops");

        let failed = runner
            .run(&["sh".into(), "-c".into(), "echo nope >&2; exit 2".into()])
            .unwrap();
        assert!(!failed.success);
        assert_eq!(failed.exit_code, Some(2));
        assert_eq!(failed.stderr.trim(), "nope");
    }

    #[cfg(unix)]
    #[test]
    fn test_process_runner_times_out() {
        let runner = ProcessRunner::new(Some(Duration::from_millis(100)));
        let result = runner.run(&["sleep".into(), "5".into()]);
        assert!(matches!(result, Err(ProbeError::Timeout { .. })));
    }
}
