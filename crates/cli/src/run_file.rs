//! JSON run files and their merge with command-line flags.

use fanout_core::{ConfigError, DispatchConfig, ExtraParams};
use fanout_work::CommandTemplate;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// A run described in a file, for example:
///
/// ```json
/// {
///   "items": ["a.tif", "b.tif"],
///   "params": {"outdir": "out/"},
///   "max_concurrency": 4,
///   "command": {"program": "segment", "args": ["{item}", "{outdir}"]}
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RunFile {
    pub items: Option<Value>,
    pub params: Option<Value>,
    pub command: Option<CommandTemplate>,
    #[serde(flatten)]
    pub dispatch: DispatchConfig,
}

impl RunFile {
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The item list, which must be a JSON array when present.
    pub fn items(&self) -> Result<Vec<Value>, ConfigError> {
        match &self.items {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(other) => Err(ConfigError::ItemsNotSequence(kind(other).to_string())),
        }
    }

    /// The extra parameters, which must be a JSON object when present.
    pub fn params(&self) -> Result<ExtraParams, ConfigError> {
        match &self.params {
            None | Some(Value::Null) => Ok(ExtraParams::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(other) => Err(ConfigError::ParamsNotMapping(kind(other).to_string())),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse a `key=value` flag. The value is read as JSON when it parses, and
/// kept as a string otherwise.
pub fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Flag values that override the run file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub max_concurrency: Option<i64>,
    pub name: Option<String>,
    pub no_progress: bool,
    pub params: Vec<(String, Value)>,
    pub command: Vec<String>,
}

/// Everything a run needs once file and flags are merged.
#[derive(Debug)]
pub struct Resolved {
    pub config: DispatchConfig,
    pub params: ExtraParams,
    pub command: Option<CommandTemplate>,
}

impl Overrides {
    pub fn apply(self, file: &RunFile) -> Result<Resolved, ConfigError> {
        let mut config = file.dispatch.clone();
        if let Some(max) = self.max_concurrency {
            config.max_concurrency = max;
        }
        if let Some(name) = self.name {
            config.process_name = Some(name);
        }
        if self.no_progress {
            config.print_progress = false;
        }

        let mut params = file.params()?;
        params.extend(self.params);

        let command = match self.command.split_first() {
            Some((program, args)) => Some(CommandTemplate::new(program.as_str()).args(args.iter().cloned())),
            None => file.command.clone(),
        };

        Ok(Resolved {
            config,
            params,
            command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_file() {
        let file = RunFile::parse(
            r#"{
                "items": ["a", 2],
                "params": {"outdir": "out/"},
                "max_concurrency": 3,
                "print_progress": false,
                "process_name": "segment all",
                "command": {"program": "segment", "args": ["{item}"]}
            }"#,
        )
        .unwrap();

        assert_eq!(file.items().unwrap(), vec![json!("a"), json!(2)]);
        assert_eq!(file.params().unwrap()["outdir"], json!("out/"));
        assert_eq!(file.dispatch.max_concurrency, 3);
        assert!(!file.dispatch.print_progress);
        assert_eq!(file.dispatch.process_name.as_deref(), Some("segment all"));
        assert_eq!(file.command.unwrap().program, "segment");
    }

    #[test]
    fn test_defaults_for_empty_file() {
        let file = RunFile::parse("{}").unwrap();
        assert!(file.items().unwrap().is_empty());
        assert!(file.params().unwrap().is_empty());
        assert_eq!(file.dispatch, DispatchConfig::default());
    }

    #[test]
    fn test_shape_errors() {
        let file = RunFile::parse(r#"{"items": "a.tif", "params": [1, 2]}"#).unwrap();
        assert!(matches!(file.items(), Err(ConfigError::ItemsNotSequence(k)) if k == "a string"));
        assert!(matches!(file.params(), Err(ConfigError::ParamsNotMapping(k)) if k == "an array"));
        assert!(matches!(RunFile::parse("[1"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("sigma=1.5").unwrap(), ("sigma".to_string(), json!(1.5)));
        assert_eq!(parse_param("outdir=out/").unwrap(), ("outdir".to_string(), json!("out/")));
        assert_eq!(parse_param("expr=a=b").unwrap(), ("expr".to_string(), json!("a=b")));
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=1").is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let file = RunFile::parse(
            r#"{"params": {"a": 1, "b": 2}, "max_concurrency": 3,
                "command": {"program": "from-file"}}"#,
        )
        .unwrap();

        let resolved = Overrides {
            max_concurrency: Some(0),
            name: Some("custom".to_string()),
            no_progress: true,
            params: vec![("b".to_string(), json!(20))],
            command: vec!["convert".to_string(), "{item}".to_string(), "-resize".to_string()],
        }
        .apply(&file)
        .unwrap();

        assert_eq!(resolved.config.max_concurrency, 0);
        assert!(resolved.config.validate().is_err());
        assert_eq!(resolved.config.label("x"), "custom");
        assert!(!resolved.config.print_progress);
        assert_eq!(resolved.params["a"], json!(1));
        assert_eq!(resolved.params["b"], json!(20));
        let command = resolved.command.unwrap();
        assert_eq!(command.program, "convert");
        assert_eq!(command.args, vec!["{item}", "-resize"]);

        let keep = Overrides::default().apply(&file).unwrap();
        assert_eq!(keep.command.unwrap().program, "from-file");
        assert_eq!(keep.config.max_concurrency, 3);
    }
}
