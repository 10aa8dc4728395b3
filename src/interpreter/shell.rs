//! Shell interpreter
//!
//! Runs each statement as `<shell> -c <statement>`.
//!
//! ## Properties
//!
//! | Key | Default | Meaning |
//! |-----|---------|---------|
//! | `shell.command` | `sh` | Shell binary, looked up on the search path |
//! | `shell.timeout_ms` | `60000` | Kill the command after this long |
//! | `shell.working_dir` | inherited | Working directory for commands |
//!
//! The search path is the interpreter's `file://` classloader URLs followed
//! by `$PATH`. Opening resolves the shell and indexes every executable on
//! the search path; completion matches against that index.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::RwLock;
use wait_timeout::ChildExt;

use super::{
    FormType, Interpreter, InterpreterBase, InterpreterCompletion, InterpreterContext,
    InterpreterResult,
};
use crate::error::{InterpreterError, Result};

pub const COMMAND_PROPERTY: &str = "shell.command";
pub const TIMEOUT_PROPERTY: &str = "shell.timeout_ms";
pub const WORKING_DIR_PROPERTY: &str = "shell.working_dir";

const DEFAULT_SHELL: &str = "sh";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// How often a running command checks for cancel and timeout
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Everything `open` resolved
#[derive(Debug)]
struct ShellSession {
    shell: PathBuf,
    search_path: Vec<PathBuf>,
    /// Executable names on the search path, for completion
    commands: BTreeSet<String>,
    timeout: Duration,
    working_dir: Option<PathBuf>,
}

enum Exit {
    Finished(ExitStatus),
    Cancelled,
    TimedOut,
}

/// Interpreter that runs statements through a POSIX shell
#[derive(Debug, Default)]
pub struct ShellInterpreter {
    base: InterpreterBase,
    session: RwLock<Option<Arc<ShellSession>>>,
    /// paragraph id -> cancel flag of its running command
    running: DashMap<String, Arc<AtomicBool>>,
}

impl ShellInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.session.read().is_some()
    }

    /// Number of executables indexed by `open` (0 when closed)
    pub fn indexed_commands(&self) -> usize {
        self.session
            .read()
            .as_ref()
            .map_or(0, |session| session.commands.len())
    }

    fn session(&self) -> Result<Arc<ShellSession>> {
        self.session
            .read()
            .clone()
            .ok_or_else(|| InterpreterError::NotOpen {
                class_name: self.class_name().to_string(),
            })
    }

    fn timeout(&self) -> Result<Duration> {
        match self.property(TIMEOUT_PROPERTY) {
            None => Ok(Duration::from_millis(DEFAULT_TIMEOUT_MS)),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| InterpreterError::InvalidProperty {
                    key: TIMEOUT_PROPERTY.to_string(),
                    value,
                }),
        }
    }

    fn search_path(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .classloader_urls()
            .iter()
            .filter(|url| url.scheme() == "file")
            .filter_map(|url| url.to_file_path().ok())
            .collect();
        if let Some(path) = env::var_os("PATH") {
            dirs.extend(env::split_paths(&path));
        }
        dirs
    }

    fn run(&self, session: &ShellSession, st: &str, cancel: &AtomicBool) -> Result<InterpreterResult> {
        let mut cmd = Command::new(&session.shell);
        cmd.arg("-c")
            .arg(st)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let path = env::join_paths(&session.search_path).map_err(|e| {
            InterpreterError::Execution {
                reason: format!("invalid search path: {}", e),
            }
        })?;
        cmd.env("PATH", path);

        if let Some(dir) = &session.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| InterpreterError::Execution {
            reason: format!("failed to spawn {}: {}", session.shell.display(), e),
        })?;
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let started = Instant::now();
        let exit = wait_for(&mut child, cancel, session.timeout, started)?;
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Shell command finished"
        );

        match exit {
            Exit::Finished(status) => {
                let out = join_reader(stdout);
                let err = join_reader(stderr);
                if status.success() {
                    Ok(InterpreterResult::success(out))
                } else {
                    let mut result = InterpreterResult::error(out);
                    if !err.is_empty() {
                        result = result.with_text(err);
                    }
                    let status_line = match status.code() {
                        Some(code) => format!("exit status: {}", code),
                        None => "terminated by signal".to_string(),
                    };
                    Ok(result.with_text(status_line))
                }
            }
            // Readers are detached: a grandchild may still hold the pipes.
            Exit::Cancelled => Ok(InterpreterResult::error("Paragraph cancelled")),
            Exit::TimedOut => Ok(InterpreterResult::error(format!(
                "Paragraph timed out after {}ms",
                session.timeout.as_millis()
            ))),
        }
    }
}

impl Interpreter for ShellInterpreter {
    fn base(&self) -> &InterpreterBase {
        &self.base
    }

    fn open(&self) -> Result<()> {
        let command = self
            .property(COMMAND_PROPERTY)
            .unwrap_or_else(|| DEFAULT_SHELL.to_string());
        let timeout = self.timeout()?;
        let working_dir = self.property(WORKING_DIR_PROPERTY).map(PathBuf::from);
        let search_path = self.search_path();

        let shell = resolve(&command, &search_path).ok_or_else(|| InterpreterError::Open {
            reason: format!("shell '{}' not found on the search path", command),
        })?;
        if let Some(dir) = &working_dir {
            if !dir.is_dir() {
                return Err(InterpreterError::Open {
                    reason: format!("working directory '{}' does not exist", dir.display()),
                });
            }
        }

        let commands = index_commands(&search_path);
        tracing::info!(
            shell = %shell.display(),
            commands = commands.len(),
            "Shell interpreter opened"
        );

        *self.session.write() = Some(Arc::new(ShellSession {
            shell,
            search_path,
            commands,
            timeout,
            working_dir,
        }));
        Ok(())
    }

    fn close(&self) -> Result<()> {
        for entry in self.running.iter() {
            entry.value().store(true, Ordering::SeqCst);
        }
        *self.session.write() = None;
        Ok(())
    }

    fn interpret(&self, st: &str, ctx: &InterpreterContext) -> Result<InterpreterResult> {
        let session = self.session()?;
        let cancel = Arc::new(AtomicBool::new(false));
        self.running
            .insert(ctx.paragraph_id.clone(), Arc::clone(&cancel));

        tracing::info!(paragraph_id = %ctx.paragraph_id, "Running shell command");
        let result = self.run(&session, st, &cancel);

        self.running
            .remove_if(&ctx.paragraph_id, |_, flag| Arc::ptr_eq(flag, &cancel));
        result
    }

    fn cancel(&self, ctx: &InterpreterContext) -> Result<()> {
        if let Some(flag) = self.running.get(&ctx.paragraph_id) {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn form_type(&self) -> Result<FormType> {
        Ok(FormType::Simple)
    }

    fn progress(&self, _ctx: &InterpreterContext) -> Result<u8> {
        Ok(0)
    }

    fn completion(
        &self,
        buf: &str,
        cursor: usize,
        _ctx: &InterpreterContext,
    ) -> Result<Vec<InterpreterCompletion>> {
        let session = self.session()?;
        let prefix = completion_prefix(buf, cursor);
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        Ok(session
            .commands
            .range(prefix.to_string()..)
            .take_while(|name| name.starts_with(prefix))
            .map(|name| InterpreterCompletion::new(name.as_str(), name.as_str(), "command"))
            .collect())
    }
}

/// The word that ends at `cursor`
///
/// `cursor` is a byte offset; it is clamped to the buffer and moved back to
/// the nearest char boundary.
pub fn completion_prefix(buf: &str, cursor: usize) -> &str {
    let mut end = cursor.min(buf.len());
    while !buf.is_char_boundary(end) {
        end -= 1;
    }
    let head = &buf[..end];
    let start = head
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace() || matches!(c, ';' | '|' | '&' | '(' | ')' | '`'))
        .map_or(0, |(i, c)| i + c.len_utf8());
    &head[start..]
}

fn wait_for(
    child: &mut Child,
    cancel: &AtomicBool,
    timeout: Duration,
    started: Instant,
) -> Result<Exit> {
    loop {
        if let Some(status) = child.wait_timeout(POLL_INTERVAL)? {
            return Ok(Exit::Finished(status));
        }
        let exit = if cancel.load(Ordering::SeqCst) {
            Exit::Cancelled
        } else if started.elapsed() >= timeout {
            Exit::TimedOut
        } else {
            continue;
        };
        let _ = child.kill();
        let _ = child.wait(); // Reap the zombie
        return Ok(exit);
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: Option<R>) -> Option<JoinHandle<String>> {
    stream.map(|mut stream| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).ok();
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

fn resolve(command: &str, search_path: &[PathBuf]) -> Option<PathBuf> {
    let path = Path::new(command);
    if path.components().count() > 1 {
        return is_executable(path).then(|| path.to_path_buf());
    }
    search_path
        .iter()
        .map(|dir| dir.join(command))
        .find(|candidate| is_executable(candidate))
}

fn index_commands(search_path: &[PathBuf]) -> BTreeSet<String> {
    search_path
        .iter()
        .filter_map(|dir| fs::read_dir(dir).ok())
        .flat_map(|entries| entries.flatten())
        .filter(|entry| is_executable(&entry.path()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
