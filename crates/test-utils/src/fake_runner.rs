use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ocp_provision::errors::{ProvisionError, Result};
use ocp_provision::exec::{BoxFuture, ExecutionRequest, ExecutionResult, ProcessBackend};

/// What a scripted binary "does" when run.
#[derive(Debug, Clone)]
pub enum Scripted {
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
        delay: Duration,
    },
    /// Behave as if the binary could not be found.
    NotFound,
    /// Behave as if the deadline expired after printing `stdout`.
    TimedOut { stdout: String },
}

impl Scripted {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Scripted::Exit {
            code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn exit(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Scripted::Exit {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            delay: Duration::ZERO,
        }
    }

    /// Sleep for `delay` before "exiting".
    pub fn after(self, delay: Duration) -> Self {
        match self {
            Scripted::Exit {
                code,
                stdout,
                stderr,
                ..
            } => Scripted::Exit {
                code,
                stdout,
                stderr,
                delay,
            },
            other => other,
        }
    }
}

type Handler = Arc<dyn Fn(&ExecutionRequest) -> Scripted + Send + Sync>;

/// A fake process backend that:
/// - records every request it receives
/// - answers from a per-binary script (unknown binaries are "not found")
/// - tracks how many runs overlap in time.
#[derive(Clone, Default)]
pub struct FakeRunner {
    handlers: Arc<Mutex<HashMap<String, Handler>>>,
    requests: Arc<Mutex<Vec<ExecutionRequest>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `binary` with `script`.
    pub fn respond(self, binary: &str, script: Scripted) -> Self {
        self.respond_with(binary, move |_| script.clone())
    }

    /// Answer `binary` with whatever `handler` computes from the request.
    pub fn respond_with<F>(self, binary: &str, handler: F) -> Self
    where
        F: Fn(&ExecutionRequest) -> Scripted + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap()
            .insert(binary.to_string(), Arc::new(handler));
        self
    }

    pub fn requests(&self) -> Vec<ExecutionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, binary: &str) -> Vec<ExecutionRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.binary() == binary)
            .collect()
    }

    /// Highest number of simultaneously running requests seen so far.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn answer(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        self.requests.lock().unwrap().push(request.clone());
        let handler = self.handlers.lock().unwrap().get(request.binary()).cloned();

        let Some(handler) = handler else {
            return Err(ProvisionError::Spawn {
                binary: request.binary().to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
            });
        };

        match handler(request) {
            Scripted::Exit {
                code,
                stdout,
                stderr,
                delay,
            } => {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);

                Ok(ExecutionResult {
                    exit_code: code,
                    stdout,
                    stderr,
                    duration: delay,
                    truncated: false,
                })
            }
            Scripted::NotFound => Err(ProvisionError::Spawn {
                binary: request.binary().to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
            }),
            Scripted::TimedOut { stdout } => {
                let timeout = request.deadline().unwrap_or_default();
                Err(ProvisionError::Timeout {
                    binary: request.binary().to_string(),
                    timeout,
                    partial: Box::new(ExecutionResult {
                        exit_code: -1,
                        stdout,
                        stderr: String::new(),
                        duration: timeout,
                        truncated: false,
                    }),
                })
            }
        }
    }
}

impl ProcessBackend for FakeRunner {
    fn run<'a>(&'a self, request: &'a ExecutionRequest) -> BoxFuture<'a, Result<ExecutionResult>> {
        Box::pin(self.answer(request))
    }
}
