pub mod classifier;
pub mod key_extractor;

pub use classifier::{Classification, LineClassifier, RunnerProfile};
pub use key_extractor::find_by_key;

/// Split a `run` block into individual command lines.
///
/// Backslash-newline continuations are joined first, so a wrapped command
/// becomes one line. Lines are trimmed and blank lines dropped.
pub fn command_lines(block: &str) -> Vec<String> {
    block
        .replace("\\\r\n", "")
        .replace("\\\n", "")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
