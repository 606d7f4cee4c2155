use crate::analyzer;

/// One completed request.
#[derive(PartialEq, Debug, Clone)]
pub struct RequestResult {
    pub prompt: String,
    pub latency: f64,
    pub tokens: usize,
    pub speed: f64,
}

/// What a worker reports for a single request.
#[derive(PartialEq, Debug, Clone)]
pub enum RequestStatus {
    Succeeded(RequestResult),
    TimedOut { prompt: String, latency: f64 },
    Failed { prompt: String },
}

impl RequestStatus {
    pub fn success(&self) -> Option<&RequestResult> {
        match self {
            RequestStatus::Succeeded(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct LoadTestResult {
    pub total_requests: usize,
    pub count: usize,
    /// Wall-clock span of the whole run in seconds.
    pub total_time: f64,
    pub timing: Option<analyzer::TimingResult>,
    pub error: Option<analyzer::aggregated_error_rates::ErrorRatesResult>,
}
