use std::{fs, path::Path};

use templet_core::{Context, Value};
use templet_error::{generic_error, ErrorContext as _, GenericError};
use tracing::debug;

/// Reads a render context from a YAML or JSON file.
///
/// Files with a `.json` extension are parsed as JSON and everything else as YAML. The top level must be a mapping.
pub fn load_context(path: &Path) -> Result<Context, GenericError> {
    let raw = fs::read_to_string(path)
        .with_error_context(|| format!("Failed to read context file '{}'.", path.display()))?;

    let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let document: serde_json::Value = if is_json {
        serde_json::from_str(&raw)
            .with_error_context(|| format!("Failed to parse context file '{}' as JSON.", path.display()))?
    } else {
        serde_yaml::from_str(&raw)
            .with_error_context(|| format!("Failed to parse context file '{}' as YAML.", path.display()))?
    };

    match Value::from_json(document) {
        value @ Value::Map(_) => {
            debug!(path = %path.display(), "Loaded render context.");
            Ok(Context::from_value(value))
        }
        Value::Invalid => Ok(Context::new()),
        other => Err(generic_error!(
            "Context file '{}' must hold a mapping, found {}.",
            path.display(),
            other.type_name()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_yaml_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.yaml");
        fs::write(&path, "name: Ada\nitems: [1, 2]\n").unwrap();

        let ctx = load_context(&path).unwrap();
        assert_eq!(ctx.lookup("name").and_then(Value::as_str), Some("Ada"));
        assert_eq!(ctx.lookup("items").map(Value::to_list).map(|items| items.len()), Some(2));
    }

    #[test]
    fn test_load_json_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.json");
        fs::write(&path, r#"{"n": 3, "nothing": null}"#).unwrap();

        let ctx = load_context(&path).unwrap();
        assert_eq!(ctx.lookup("n").and_then(Value::as_int), Some(3));
        assert!(ctx.lookup("nothing").is_some_and(|value| !value.is_valid()));
    }

    #[test]
    fn test_context_must_be_a_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.yaml");
        fs::write(&path, "- 1\n- 2\n").unwrap();

        let err = load_context(&path).unwrap_err();
        assert!(err.to_string().contains("must hold a mapping, found list"));
        assert!(load_context(&dir.path().join("missing.yaml")).is_err());
    }
}
