use crate::result::RequestStatus;

#[derive(PartialEq, Debug, Clone)]
pub struct ErrorRatesResult {
    pub timeout: f32,
    pub failure: f32,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum RequestError {
    TimedOut,
    Failed,
}

pub trait RequestErrorState {
    fn error(&self) -> Option<RequestError>;
}

impl RequestErrorState for RequestStatus {
    fn error(&self) -> Option<RequestError> {
        match self {
            RequestStatus::Succeeded(_) => None,
            RequestStatus::TimedOut { .. } => Some(RequestError::TimedOut),
            RequestStatus::Failed { .. } => Some(RequestError::Failed),
        }
    }
}

pub struct AggregatedErrorRates {
    total_count: usize,
    timeout_count: usize,
    failure_count: usize,
}

impl AggregatedErrorRates {
    pub fn new() -> AggregatedErrorRates {
        AggregatedErrorRates {
            total_count: 0,
            timeout_count: 0,
            failure_count: 0,
        }
    }

    pub fn add<T>(&mut self, value: &T)
    where
        T: RequestErrorState,
    {
        self.total_count += 1;

        match value.error() {
            Some(RequestError::TimedOut) => self.timeout_count += 1,
            Some(RequestError::Failed) => self.failure_count += 1,
            None => (),
        }
    }

    pub fn result(&self) -> Option<ErrorRatesResult> {
        if self.total_count == 0 {
            return None;
        }

        Some(ErrorRatesResult {
            timeout: (self.timeout_count as f32 / self.total_count as f32 * 10000.0).round() /
                10000.0,
            failure: (self.failure_count as f32 / self.total_count as f32 * 10000.0).round() /
                10000.0,
        })
    }
}
