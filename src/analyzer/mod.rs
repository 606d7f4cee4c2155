use crate::result::{LoadTestResult, RequestStatus};

pub mod aggregated_error_rates;
pub mod percentile;

/// Statistics over the successful requests of a run. Latencies are in
/// seconds, speeds in tokens per second.
#[derive(PartialEq, Debug, Clone)]
pub struct TimingResult {
    pub requests_per_second: f64,
    pub latency_avg: f64,
    pub latency_min: f64,
    pub latency_max: f64,
    pub latency_median: f64,
    pub latency_percentile90: f64,
    pub speed_avg: f64,
    pub tokens_avg: f64,
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    values
}

// Summing sorted values keeps the mean independent of completion order.
fn mean(values_sorted: &[f64]) -> f64 {
    values_sorted.iter().sum::<f64>() / values_sorted.len() as f64
}

pub fn analyze(
    statuses: &[RequestStatus],
    total_requests: usize,
    total_time: f64,
) -> LoadTestResult {
    let mut error_rates = aggregated_error_rates::AggregatedErrorRates::new();
    for status in statuses {
        error_rates.add(status);
    }

    let successes: Vec<_> = statuses.iter().filter_map(|s| s.success()).collect();
    let count = successes.len();

    if count == 0 {
        return LoadTestResult {
            total_requests,
            count: 0,
            total_time,
            timing: None,
            error: error_rates.result(),
        };
    }

    let latencies = sorted(successes.iter().map(|r| r.latency).collect());
    let speeds = sorted(successes.iter().map(|r| r.speed).collect());
    let tokens = sorted(successes.iter().map(|r| r.tokens as f64).collect());

    let requests_per_second = if total_time > 0.0 {
        count as f64 / total_time
    } else {
        0.0
    };

    LoadTestResult {
        total_requests,
        count,
        total_time,
        timing: Some(TimingResult {
            requests_per_second,
            latency_avg: mean(&latencies),
            latency_min: latencies[0],
            latency_max: latencies[count - 1],
            latency_median: percentile::percentile(&latencies, 0.5).unwrap_or_default(),
            latency_percentile90: percentile::percentile(&latencies, 0.9).unwrap_or_default(),
            speed_avg: mean(&speeds),
            tokens_avg: mean(&tokens),
        }),
        error: error_rates.result(),
    }
}
