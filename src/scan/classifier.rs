/// Outcome of classifying one command line from a workflow `run` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The line invokes the runner directly or through a known wrapper.
    Valid,
    /// The line installs dependencies and must not count as a test run.
    Invalid,
    /// Some other command; intent cannot be decided from the tokens.
    Unsure,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Valid => write!(f, "Valid"),
            Classification::Invalid => write!(f, "Invalid"),
            Classification::Unsure => write!(f, "Unsure"),
        }
    }
}

impl std::str::FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Valid" => Ok(Classification::Valid),
            "Invalid" => Ok(Classification::Invalid),
            "Unsure" => Ok(Classification::Unsure),
            _ => Err(format!("Invalid classification: {}", s)),
        }
    }
}

/// Tool names the classification rules are written against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerProfile {
    /// The test runner itself, e.g. `pytest`
    pub runner: String,
    /// Interpreter that can launch the runner as a module (`python -m pytest`)
    pub interpreter: String,
    /// Container tool whose `run` subcommand may wrap the runner
    pub container_tool: String,
    /// Task runner with a `run` subcommand (`poetry run pytest`)
    pub task_runner: String,
    /// Package installer whose lines are dependency setup
    pub installer: String,
}

impl Default for RunnerProfile {
    fn default() -> Self {
        Self {
            runner: "pytest".to_string(),
            interpreter: "python".to_string(),
            container_tool: "docker".to_string(),
            task_runner: "poetry".to_string(),
            installer: "pip".to_string(),
        }
    }
}

/// Deterministic, total classifier for single command lines.
#[derive(Debug, Clone, Default)]
pub struct LineClassifier {
    profile: RunnerProfile,
}

impl LineClassifier {
    pub fn new(profile: RunnerProfile) -> Self {
        Self { profile }
    }

    /// Classify one line. First matching rule wins; anything unmatched,
    /// including blank or too-short lines, is `Unsure`.
    pub fn classify(&self, line: &str) -> Classification {
        let words: Vec<&str> = line.split_whitespace().collect();
        let p = &self.profile;

        let is_valid = words.first() == Some(&p.runner.as_str())
            || starts_with(&words, &[p.interpreter.as_str(), "-m", p.runner.as_str()])
            || (starts_with(&words, &[p.container_tool.as_str(), "run"])
                && words.get(3) == Some(&p.runner.as_str()))
            || starts_with(&words, &[p.task_runner.as_str(), "run", p.runner.as_str()]);
        if is_valid {
            return Classification::Valid;
        }

        let is_install = starts_with(&words, &[p.installer.as_str(), "install"])
            || starts_with(&words, &[p.interpreter.as_str(), "-m", p.installer.as_str(), "install"]);
        if is_install {
            return Classification::Invalid;
        }

        Classification::Unsure
    }
}

fn starts_with(words: &[&str], pattern: &[&str]) -> bool {
    words.len() >= pattern.len() && words.iter().zip(pattern).all(|(w, p)| w == p)
}
