use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(PartialEq, Debug, Clone)]
pub enum InferenceOutcome {
    Completed { output: String, latency: Duration },
    /// The call was cancelled after `latency`, which equals the timeout.
    TimedOut { latency: Duration },
    Failed { reason: String },
}

/// A blocking call into the model. Shared by all workers of a run.
pub trait Inference: Sync {
    fn infer(&self, prompt: &str, timeout: Duration) -> InferenceOutcome;
}

/// Runs the inference binary once per prompt and captures its stdout.
#[derive(PartialEq, Debug, Clone)]
pub struct SubprocessInference {
    binary: PathBuf,
    leading_args: Vec<String>,
    prompt_flag: Option<String>,
}

impl SubprocessInference {
    pub fn new(binary: PathBuf, prompt_flag: Option<String>) -> SubprocessInference {
        SubprocessInference {
            binary,
            leading_args: Vec::new(),
            prompt_flag,
        }
    }

    /// Arguments placed before the prompt flag.
    pub fn with_leading_args(mut self, args: Vec<String>) -> SubprocessInference {
        self.leading_args = args;
        self
    }

    fn arguments(&self, prompt: &str) -> Vec<String> {
        let mut arguments = self.leading_args.clone();
        if let Some(ref flag) = self.prompt_flag {
            arguments.push(flag.clone());
        }
        arguments.push(prompt.to_string());
        arguments
    }

    /// The invocation as it would be typed into a shell.
    pub fn command_line(&self, prompt: &str) -> String {
        let mut words = vec![self.binary.display().to_string()];
        words.extend(self.arguments(prompt));
        shell_words::join(words)
    }
}

fn abandon(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl Inference for SubprocessInference {
    fn infer(&self, prompt: &str, timeout: Duration) -> InferenceOutcome {
        debug!("Running {}", self.command_line(prompt));

        let start = Instant::now();
        let deadline = start
            .checked_add(timeout)
            .unwrap_or_else(|| start + Duration::from_secs(365 * 24 * 60 * 60));

        // Arguments go straight to the process, no shell is involved.
        let mut child = match Command::new(&self.binary)
            .args(self.arguments(prompt))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn() {
            Ok(child) => child,
            Err(err) => {
                return InferenceOutcome::Failed {
                    reason: format!("failed to spawn {}: {}", self.binary.display(), err),
                }
            }
        };

        // Drain stdout on a separate thread so a long answer cannot fill the
        // pipe. EOF only arrives once every holder of the pipe is gone, which
        // may be a grandchild, so the wait for it is bounded by the deadline.
        let (sender, receiver) = mpsc::channel();
        if let Some(mut stdout) = child.stdout.take() {
            thread::spawn(move || {
                let mut output = Vec::new();
                let _ = sender.send(stdout.read_to_end(&mut output).map(|_| output));
            });
        }

        let output = match receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(Ok(output)) => String::from_utf8_lossy(&output).into_owned(),
            Ok(Err(err)) => {
                abandon(&mut child);
                return InferenceOutcome::Failed {
                    reason: format!("could not read output: {}", err),
                };
            }
            Err(RecvTimeoutError::Timeout) => {
                abandon(&mut child);
                return InferenceOutcome::TimedOut { latency: timeout };
            }
            Err(RecvTimeoutError::Disconnected) => {
                abandon(&mut child);
                return InferenceOutcome::Failed {
                    reason: String::from("output reader stopped before end of output"),
                };
            }
        };

        // The pipe usually closes as the process exits, so this loop rarely
        // sleeps more than once.
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    abandon(&mut child);
                    return InferenceOutcome::TimedOut { latency: timeout };
                }
                Ok(None) => thread::sleep(EXIT_POLL_INTERVAL),
                Err(err) => {
                    abandon(&mut child);
                    return InferenceOutcome::Failed {
                        reason: format!("waiting for {} failed: {}", self.binary.display(), err),
                    };
                }
            }
        };

        let latency = start.elapsed();

        if !status.success() {
            return InferenceOutcome::Failed {
                reason: format!("{} exited with {}", self.binary.display(), status),
            };
        }

        InferenceOutcome::Completed { output, latency }
    }
}
