use std::fs;
use std::path::Path;
use failure::{Error, err_msg};
use rand::seq::SliceRandom;

pub const DEFAULT_PROMPTS: [&str; 7] = [
    "How do I improve my running speed?",
    "What are the best exercises for building muscle?",
    "How can I lose weight quickly?",
    "What is the best diet for weight loss?",
    "How do I stay motivated to exercise?",
    "What are the benefits of yoga?",
    "How can I improve my flexibility?",
];

/// Candidate prompts for a run. Never empty.
#[derive(PartialEq, Debug, Clone)]
pub struct Prompts {
    candidates: Vec<String>,
}

impl Prompts {
    pub fn new(candidates: Vec<String>) -> Result<Prompts, Error> {
        if candidates.is_empty() {
            return Err(err_msg("at least one prompt is required"));
        }

        Ok(Prompts { candidates })
    }

    /// Reads one prompt per line, skipping blank lines.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Prompts, Error> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                return Err(err_msg(
                    format!("could not read prompts from {} ({})", path.display(), err),
                ))
            }
        };

        let candidates = content
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        Prompts::new(candidates)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.candidates
    }
}

impl Default for Prompts {
    fn default() -> Prompts {
        Prompts {
            candidates: DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum PromptSelection {
    /// Uniformly at random, with replacement.
    Random,
    /// In list order, wrapping around.
    RoundRobin,
}

impl PromptSelection {
    pub fn pick<'a>(&self, prompts: &'a Prompts, index: usize) -> &'a str {
        let candidates = prompts.as_slice();

        match self {
            PromptSelection::Random => candidates
                .choose(&mut rand::thread_rng())
                .map(|p| p.as_str())
                .unwrap_or_default(),
            PromptSelection::RoundRobin => &candidates[index % candidates.len()],
        }
    }
}

/// Shortens a prompt for log output without splitting a character.
pub fn preview(prompt: &str) -> String {
    let mut shortened: String = prompt.chars().take(30).collect();
    if shortened.len() < prompt.len() {
        shortened.push_str("...");
    }
    shortened
}
