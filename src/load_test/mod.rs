use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use crate::analyzer;
use crate::inference::{Inference, InferenceOutcome};
use crate::prompts::{self, PromptSelection, Prompts};
use crate::result::{LoadTestResult, RequestResult, RequestStatus};

#[derive(PartialEq, Debug, Clone)]
pub struct LoadTestConfig {
    pub num_requests: usize,
    /// Upper bound on requests in flight at the same time.
    pub max_workers: usize,
    /// Per-request ceiling.
    pub timeout: Duration,
    pub prompts: Prompts,
    pub selection: PromptSelection,
}

pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn tokens_per_second(tokens: usize, latency: f64) -> f64 {
    if latency > 0.0 {
        tokens as f64 / latency
    } else {
        0.0
    }
}

/// Sends one prompt and turns the outcome into a status. Never panics on a
/// failed call.
pub fn run_request<I>(inference: &I, prompt: &str, timeout: Duration) -> RequestStatus
where
    I: Inference + ?Sized,
{
    info!("Starting request with prompt: {}", prompts::preview(prompt));

    match inference.infer(prompt, timeout) {
        InferenceOutcome::Completed { output, latency } => {
            let latency = latency.as_secs_f64();
            let tokens = count_tokens(&output);
            let speed = tokens_per_second(tokens, latency);

            info!(
                "Completed request. Latency: {:.2}s, Speed: {:.2} tokens/s",
                latency,
                speed
            );

            RequestStatus::Succeeded(RequestResult {
                prompt: prompt.to_string(),
                latency,
                tokens,
                speed,
            })
        }
        InferenceOutcome::TimedOut { latency } => {
            warn!(
                "Request timed out after {:.2} seconds for prompt: {}",
                latency.as_secs_f64(),
                prompts::preview(prompt)
            );

            RequestStatus::TimedOut {
                prompt: prompt.to_string(),
                latency: latency.as_secs_f64(),
            }
        }
        InferenceOutcome::Failed { reason } => {
            warn!("Request failed for prompt: {} ({})", prompts::preview(prompt), reason);

            RequestStatus::Failed { prompt: prompt.to_string() }
        }
    }
}

/// Runs every request of `config` on a bounded pool of worker threads and
/// returns the statuses in completion order.
pub fn dispatch<I>(config: &LoadTestConfig, inference: &I) -> Vec<RequestStatus>
where
    I: Inference + ?Sized,
{
    let jobs: Vec<String> = (0..config.num_requests)
        .map(|index| config.selection.pick(&config.prompts, index).to_string())
        .collect();

    let worker_count = config.max_workers.max(1).min(jobs.len());
    let queue = Mutex::new(jobs.into_iter());
    let (sender, receiver) = mpsc::channel();

    thread::scope(|scope| {
        for _ in 0..worker_count {
            let sender = sender.clone();
            let queue = &queue;

            scope.spawn(move || loop {
                let prompt = match queue.lock() {
                    Ok(mut jobs) => jobs.next(),
                    Err(_) => None,
                };

                let prompt = match prompt {
                    Some(prompt) => prompt,
                    None => break,
                };

                if sender.send(run_request(inference, &prompt, config.timeout)).is_err() {
                    break;
                }
            });
        }

        drop(sender);

        receiver.iter().collect()
    })
}

pub fn load_test<I>(config: &LoadTestConfig, inference: &I) -> LoadTestResult
where
    I: Inference + ?Sized,
{
    info!(
        "Issuing {} requests with up to {} workers, timeout {}s",
        config.num_requests,
        config.max_workers,
        config.timeout.as_secs_f64()
    );

    let start = Instant::now();
    let statuses = dispatch(config, inference);
    let total_time = start.elapsed().as_secs_f64();

    analyzer::analyze(&statuses, config.num_requests, total_time)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use super::*;

    /// Sleeps for `delay`, or gives up after the timeout, and answers with
    /// five words. Records how many calls were in flight at once.
    struct FakeInference {
        delay: Duration,
        slow_prompt: Option<&'static str>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeInference {
        fn new(delay: Duration) -> FakeInference {
            FakeInference {
                delay,
                slow_prompt: None,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    impl Inference for FakeInference {
        fn infer(&self, prompt: &str, timeout: Duration) -> InferenceOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            let delay = match self.slow_prompt {
                Some(slow) if slow == prompt => Duration::from_secs(60),
                _ => self.delay,
            };

            let outcome = if delay > timeout {
                thread::sleep(timeout);
                InferenceOutcome::TimedOut { latency: timeout }
            } else {
                thread::sleep(delay);
                InferenceOutcome::Completed {
                    output: String::from("one two  three\nfour five"),
                    latency: delay,
                }
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            outcome
        }
    }

    struct BrokenInference;

    impl Inference for BrokenInference {
        fn infer(&self, _: &str, _: Duration) -> InferenceOutcome {
            InferenceOutcome::Failed { reason: String::from("boom") }
        }
    }

    fn config(num_requests: usize, max_workers: usize, timeout: Duration) -> LoadTestConfig {
        LoadTestConfig {
            num_requests,
            max_workers,
            timeout,
            prompts: Prompts::default(),
            selection: PromptSelection::Random,
        }
    }

    #[test]
    fn test_count_tokens() {
        assert_eq!(count_tokens("one two  three\nfour\tfive "), 5);
        assert_eq!(count_tokens(""), 0);
        assert_eq!(count_tokens("   \n"), 0);
    }

    #[test]
    fn test_tokens_per_second() {
        assert_eq!(tokens_per_second(5, 0.1), 5.0 / 0.1);
        assert_eq!(tokens_per_second(12, 4.0), 3.0);
        assert_eq!(tokens_per_second(12, 0.0), 0.0);
    }

    #[test]
    fn test_run_request_zero_latency() {
        struct ZeroLatency;

        impl Inference for ZeroLatency {
            fn infer(&self, _: &str, _: Duration) -> InferenceOutcome {
                InferenceOutcome::Completed {
                    output: String::from("a b"),
                    latency: Duration::from_secs(0),
                }
            }
        }

        let status = run_request(&ZeroLatency, "prompt", Duration::from_secs(1));

        assert_eq!(
            status,
            RequestStatus::Succeeded(RequestResult {
                prompt: String::from("prompt"),
                latency: 0.0,
                tokens: 2,
                speed: 0.0,
            })
        );
    }

    #[test]
    fn test_run_request_failed() {
        let status = run_request(&BrokenInference, "prompt", Duration::from_secs(1));

        assert_eq!(status, RequestStatus::Failed { prompt: String::from("prompt") });
    }

    #[test]
    fn test_load_test_end_to_end() {
        let inference = FakeInference::new(Duration::from_millis(100));

        let result = load_test(&config(10, 5, Duration::from_secs(5)), &inference);

        assert_eq!(result.total_requests, 10);
        assert_eq!(result.count, 10);
        let timing = result.timing.unwrap();
        assert_eq!(timing.tokens_avg, 5.0);
        assert!((timing.speed_avg - 50.0).abs() < 1e-9);
        assert!((timing.latency_avg - 0.1).abs() < 1e-9);
        assert!(inference.max_in_flight.load(Ordering::SeqCst) <= 5);
    }

    #[test]
    fn test_every_success_has_five_tokens() {
        let inference = FakeInference::new(Duration::from_millis(10));

        let statuses = dispatch(&config(10, 5, Duration::from_secs(5)), &inference);

        assert_eq!(statuses.len(), 10);
        for status in statuses {
            let result = status.success().unwrap();
            assert_eq!(result.tokens, 5);
            assert_eq!(result.speed, 5.0 / result.latency);
        }
    }

    #[test]
    fn test_concurrency_bound() {
        let inference = FakeInference::new(Duration::from_millis(20));

        let statuses = dispatch(&config(24, 3, Duration::from_secs(5)), &inference);

        assert_eq!(statuses.len(), 24);
        assert_eq!(inference.calls.load(Ordering::SeqCst), 24);
        let max_in_flight = inference.max_in_flight.load(Ordering::SeqCst);
        assert!(max_in_flight >= 1 && max_in_flight <= 3);
    }

    #[test]
    fn test_single_worker_is_sequential() {
        let inference = FakeInference::new(Duration::from_millis(5));

        dispatch(&config(6, 1, Duration::from_secs(5)), &inference);

        assert_eq!(inference.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_timeout_does_not_block_others() {
        let mut inference = FakeInference::new(Duration::from_millis(10));
        inference.slow_prompt = Some("slow");
        let config = LoadTestConfig {
            num_requests: 4,
            max_workers: 2,
            timeout: Duration::from_millis(200),
            prompts: Prompts::new(vec![String::from("slow"), String::from("fast")]).unwrap(),
            selection: PromptSelection::RoundRobin,
        };
        let start = Instant::now();

        let result = load_test(&config, &inference);

        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(result.count, 2);
        let error = result.error.unwrap();
        assert_eq!(error.timeout, 0.5);
        assert_eq!(error.failure, 0.0);
        assert!(result.timing.unwrap().latency_max < 0.2);
    }

    #[test]
    fn test_timed_out_status_has_pinned_latency() {
        let mut inference = FakeInference::new(Duration::from_millis(10));
        inference.slow_prompt = Some("slow");

        let status = run_request(&inference, "slow", Duration::from_millis(50));

        assert_eq!(
            status,
            RequestStatus::TimedOut {
                prompt: String::from("slow"),
                latency: 0.05,
            }
        );
    }

    #[test]
    fn test_zero_requests() {
        let inference = FakeInference::new(Duration::from_millis(10));

        let result = load_test(&config(0, 4, Duration::from_secs(1)), &inference);

        assert_eq!(result.count, 0);
        assert_eq!(result.timing, None);
        assert_eq!(result.error, None);
        assert_eq!(inference.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_failed() {
        let result = load_test(&config(3, 2, Duration::from_secs(1)), &BrokenInference);

        assert_eq!(result.count, 0);
        assert_eq!(result.timing, None);
        assert_eq!(result.error.unwrap().failure, 1.0);
    }
}
