use serde_yaml::Value;

/// Iterator over every value bound to a key anywhere inside a YAML document.
///
/// Depth-first pre-order: mapping entries and sequence items are visited in
/// document order, and a matching value is yielded before its own children.
/// Uses an explicit frame stack so adversarially deep documents cannot
/// overflow the call stack.
pub struct KeyOccurrences<'a> {
    key: &'a str,
    stack: Vec<Frame<'a>>,
}

enum Frame<'a> {
    Mapping(serde_yaml::mapping::Iter<'a>),
    Sequence(std::slice::Iter<'a, Value>),
}

impl<'a> Frame<'a> {
    fn for_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Mapping(mapping) => Some(Frame::Mapping(mapping.iter())),
            Value::Sequence(items) => Some(Frame::Sequence(items.iter())),
            Value::Tagged(tagged) => Frame::for_value(&tagged.value),
            _ => None,
        }
    }
}

/// Find every value stored under `key`, at any depth.
///
/// Calling this again on the same document restarts the traversal.
/// A document without the key yields nothing.
pub fn find_by_key<'a>(document: &'a Value, key: &'a str) -> KeyOccurrences<'a> {
    KeyOccurrences {
        key,
        stack: Frame::for_value(document).into_iter().collect(),
    }
}

impl<'a> Iterator for KeyOccurrences<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            match frame {
                Frame::Mapping(entries) => {
                    let Some((key, value)) = entries.next() else {
                        self.stack.pop();
                        continue;
                    };
                    if let Some(child) = Frame::for_value(value) {
                        self.stack.push(child);
                    }
                    if key.as_str() == Some(self.key) {
                        return Some(value);
                    }
                }
                Frame::Sequence(items) => {
                    let Some(item) = items.next() else {
                        self.stack.pop();
                        continue;
                    };
                    if let Some(child) = Frame::for_value(item) {
                        self.stack.push(child);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(yaml: &str) -> Vec<String> {
        let doc: Value = serde_yaml::from_str(yaml).unwrap();
        find_by_key(&doc, "run")
            .map(|v| v.as_str().unwrap_or("<non-string>").to_string())
            .collect()
    }

    #[test]
    fn test_finds_run_steps_across_jobs_in_order() {
        let yaml = r#"
name: CI
on: push
jobs:
  lint:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - run: pip install flake8
      - run: flake8 .
  test:
    steps:
      - name: Test
        run: |
          pip install -r requirements.txt
          pytest -v
"#;

        assert_eq!(
            runs(yaml),
            vec![
                "pip install flake8".to_string(),
                "flake8 .".to_string(),
                "pip install -r requirements.txt\npytest -v\n".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_key_yields_nothing() {
        let yaml = r#"
name: Release
jobs:
  publish:
    steps:
      - uses: pypa/gh-action-pypi-publish@release/v1
"#;
        assert!(runs(yaml).is_empty());
    }

    #[test]
    fn test_scalar_document_yields_nothing() {
        assert!(runs("just a string").is_empty());
    }

    #[test]
    fn test_nested_sequences_and_top_level_key() {
        let yaml = r#"
run: top
matrix:
  - - run: inner
  - include:
      - run: deeper
"#;
        assert_eq!(runs(yaml), vec!["top", "inner", "deeper"]);
    }

    #[test]
    fn test_mapping_value_under_key_is_yielded_then_descended() {
        let yaml = r#"
defaults:
  run:
    shell: bash
    run: nested
"#;
        let doc: Value = serde_yaml::from_str(yaml).unwrap();
        let found: Vec<&Value> = find_by_key(&doc, "run").collect();
        assert_eq!(found.len(), 2);
        assert!(found[0].is_mapping());
        assert_eq!(found[1].as_str(), Some("nested"));
    }

    #[test]
    fn test_traversal_is_restartable() {
        let doc: Value = serde_yaml::from_str("a: {run: x}\nb: [{run: y}]").unwrap();
        let first: Vec<&Value> = find_by_key(&doc, "run").collect();
        let second: Vec<&Value> = find_by_key(&doc, "run").collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let depth = 20_000;
        let mut doc = Value::String("bottom".to_string());
        for _ in 0..depth {
            let mut mapping = serde_yaml::Mapping::new();
            mapping.insert(Value::String("n".to_string()), doc);
            doc = Value::Mapping(mapping);
        }
        let mut mapping = serde_yaml::Mapping::new();
        mapping.insert(Value::String("run".to_string()), Value::String("found".to_string()));
        let mut wrapper = serde_yaml::Mapping::new();
        wrapper.insert(Value::String("deep".to_string()), doc);
        wrapper.insert(Value::String("tail".to_string()), Value::Mapping(mapping));
        let doc = Value::Mapping(wrapper);

        let found: Vec<&Value> = find_by_key(&doc, "run").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].as_str(), Some("found"));

        // serde_yaml::Value drops recursively; leak the deep tree so the
        // test itself stays within the default stack.
        std::mem::forget(doc);
    }
}
