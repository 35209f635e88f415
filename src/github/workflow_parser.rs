use serde_yaml::Value;

use crate::scan::find_by_key;

/// A parsed CI workflow file.
///
/// The document is kept as an untyped YAML tree: the survey only cares
/// about `run` blocks, which may sit under jobs, composite actions,
/// reusable workflow inputs or anything else.
#[derive(Debug, Clone)]
pub struct WorkflowDocument {
    pub file_name: String,
    root: Value,
}

/// Result of pulling the shell blocks out of a workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunBlocks {
    /// String values found under the run key, in document order
    pub blocks: Vec<String>,
    /// Occurrences of the key whose value was not a string
    pub skipped: usize,
}

impl RunBlocks {
    pub fn key_found(&self) -> bool {
        !self.blocks.is_empty() || self.skipped > 0
    }
}

pub struct WorkflowParser;

impl WorkflowParser {
    /// Parse workflow YAML.
    ///
    /// # Errors
    /// - YAML syntax errors
    /// - documents whose top level is not a mapping
    pub fn parse(file_name: &str, content: &str) -> Result<WorkflowDocument, String> {
        let root: Value = serde_yaml::from_str(content)
            .map_err(|e| format!("YAML parse failed for {}: {}", file_name, e))?;

        if !root.is_mapping() {
            return Err(format!("{} is not a YAML mapping", file_name));
        }

        Ok(WorkflowDocument {
            file_name: file_name.to_string(),
            root,
        })
    }
}

impl WorkflowDocument {
    /// Collect every string stored under `key`, at any depth.
    pub fn run_blocks(&self, key: &str) -> RunBlocks {
        let mut result = RunBlocks::default();
        for value in find_by_key(&self.root, key) {
            match value.as_str() {
                Some(block) => result.blocks.push(block.to_string()),
                None => result.skipped += 1,
            }
        }
        result
    }
}
