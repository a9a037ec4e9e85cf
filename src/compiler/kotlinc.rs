//! Out-of-process `kotlinc` backend

use std::env;
use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{CompilationUnit, CompilerBackend, CompilerOutput};
use crate::config::HarnessConfig;
use crate::errors::{HarnessError, HarnessResult};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Lines of output kept in a crash report
const CRASH_TAIL_LINES: usize = 40;

/// Runs the Kotlin command-line compiler as a child process.
///
/// Exit codes 0 (clean) and 1 (compilation errors) are normal outcomes. Any
/// other exit code, or death by signal, means the compiler itself failed.
#[derive(Debug, Clone)]
pub struct KotlincBackend {
    program: PathBuf,
    leading_args: Vec<String>,
    classpath: Vec<PathBuf>,
    extra_args: Vec<String>,
    no_reflect: bool,
    timeout: Duration,
}

impl KotlincBackend {
    pub fn from_config(config: &HarnessConfig) -> HarnessResult<Self> {
        let program = config.compiler.clone().ok_or(HarnessError::NoCompiler)?;
        Ok(Self {
            program,
            leading_args: config.compiler_args.clone(),
            classpath: config.classpath.clone(),
            extra_args: config.extra_args.clone(),
            no_reflect: config.no_reflect,
            timeout: config.timeout,
        })
    }

    /// Full argument list for one unit, without the program itself.
    pub fn arguments(&self, unit: &CompilationUnit) -> HarnessResult<Vec<OsString>> {
        let mut args: Vec<OsString> = self.leading_args.iter().map(OsString::from).collect();

        if !self.classpath.is_empty() {
            for entry in &self.classpath {
                if !entry.exists() {
                    return Err(HarnessError::MissingClasspathEntry(entry.clone()));
                }
            }
            let joined =
                env::join_paths(&self.classpath).map_err(|e| HarnessError::InvalidClasspath(e.to_string()))?;
            args.push("-classpath".into());
            args.push(joined);
        }

        args.push("-d".into());
        args.push(unit.output_dir.clone().into_os_string());
        if self.no_reflect {
            args.push("-no-reflect".into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push(unit.source_path.clone().into_os_string());
        Ok(args)
    }

    fn wait_with_deadline(&self, child: &mut Child) -> HarnessResult<ExitStatus> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                kill_tree(child);
                return Err(HarnessError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl CompilerBackend for KotlincBackend {
    #[tracing::instrument(skip_all, fields(program = %self.program.display(), classpath_len = self.classpath.len()))]
    fn invoke(&self, unit: &CompilationUnit) -> HarnessResult<CompilerOutput> {
        let args = self.arguments(unit)?;
        tracing::debug!(?args, "spawning compiler");

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // kotlinc is a launcher script around `java`; a group lets a timeout reach the JVM too.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|source| HarnessError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        // Drain both pipes concurrently so a chatty compiler never blocks on a full buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        // On timeout the readers are left detached: a surviving descendant may still hold the pipes.
        let status = self.wait_with_deadline(&mut child)?;
        let stdout = join_drain(stdout)?;
        let stderr = join_drain(stderr)?;

        let mut text = stderr;
        if !stdout.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stdout);
        }
        tracing::debug!(status = %status, output_len = text.len(), "compiler finished");

        match status.code() {
            Some(code @ (0 | 1)) => Ok(CompilerOutput {
                exit_code: Some(code),
                text,
            }),
            _ => Err(HarnessError::CompilerCrashed {
                status: status.to_string(),
                output: tail(&text, CRASH_TAIL_LINES),
            }),
        }
    }
}

/// Kill the compiler and everything it started, then reap it.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        if let Ok(pid) = i32::try_from(child.id()) {
            if let Err(err) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
                tracing::debug!(%err, "killing compiler process group");
            }
        }
    }

    #[cfg(windows)]
    {
        let _ = Command::new("taskkill")
            .args(["/F", "/T", "/PID", &child.id().to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }

    // Already-exited races are fine; the status is irrelevant now.
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<std::io::Result<String>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut bytes = Vec::new();
            pipe.read_to_end(&mut bytes)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        })
    })
}

fn join_drain(handle: Option<JoinHandle<std::io::Result<String>>>) -> HarnessResult<String> {
    match handle {
        Some(handle) => match handle.join() {
            Ok(result) => Ok(result?),
            Err(_) => Err(HarnessError::MalformedOutput("output reader thread panicked".to_string())),
        },
        None => Ok(String::new()),
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
