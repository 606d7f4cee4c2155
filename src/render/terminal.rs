use std::io::prelude::*;
use crate::result;
use crate::render::Renderer;

pub struct TerminalRenderer<'a> {
    stream: &'a mut dyn Write,
}

impl<'a> TerminalRenderer<'a> {
    pub fn new(stream: &'a mut dyn Write) -> TerminalRenderer {
        TerminalRenderer { stream }
    }
}

impl<'a> Renderer for TerminalRenderer<'a> {
    fn render(&mut self, result: result::LoadTestResult) -> () {
        let mut failed = false;
        let mut write = |text: String| {
            if failed {
                return;
            }
            if let Err(err) = self.stream.write_all(format!("{}\n", text).as_bytes()) {
                error!("Could not write results: {}", err);
                failed = true;
            }
        };

        match result.timing {
            Some(timing) => {
                write(String::from("\nLoad Test Results:"));
                write(format!("Total requests: {}", result.total_requests));
                write(format!("Successful requests: {}", result.count));
                if let Some(error) = result.error {
                    write(format!("Timeout rate: {:.2}%", error.timeout * 100.0));
                    write(format!("Failure rate: {:.2}%", error.failure * 100.0));
                }
                write(format!("Total time: {:.2} seconds", result.total_time));
                write(format!("Requests per second: {:.2}", timing.requests_per_second));
                write(format!("Average latency: {:.2} seconds", timing.latency_avg));
                write(format!("Average speed: {:.2} tokens/second", timing.speed_avg));
                write(format!("Average tokens per response: {:.2}", timing.tokens_avg));
                write(format!("Min latency: {:.2} seconds", timing.latency_min));
                write(format!("Median latency: {:.2} seconds", timing.latency_median));
                write(format!("90th percentile latency: {:.2} seconds", timing.latency_percentile90));
                write(format!("Max latency: {:.2} seconds", timing.latency_max));
            }
            None => {
                write(String::from("No successful requests to calculate statistics."));
            }
        }
    }
}
