//! Watch-list of cluster-impacting alert names.
//!
//! The watch-list is loaded from a source file at startup and on every reload
//! request. Two source formats are accepted:
//! - plain text (default): one alert name per line
//! - `.yaml` / `.yml` / `.json`: a document that must be a list of strings
//!
//! A loaded [`WatchList`] is immutable. [`WatchListStore`] swaps the whole
//! value so readers never see a half-applied reload.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::ConfigError;

/// Ordered, de-duplicated set of alert names considered cluster-impacting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchList {
    entries: Vec<String>,
    index: HashSet<String>,
}

impl WatchList {
    /// Build a watch-list from names in source order.
    ///
    /// Empty names are skipped and duplicates keep their first position.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        for name in names {
            let name = name.into();
            if name.is_empty() || list.index.contains(&name) {
                continue;
            }
            list.index.insert(name.clone());
            list.entries.push(name);
        }
        list
    }

    /// Build a watch-list from an already decoded configuration value.
    ///
    /// The value must be a JSON array of strings; anything else is rejected
    /// with [`ConfigError::InvalidShape`].
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let serde_json::Value::Array(items) = value else {
            return Err(ConfigError::InvalidShape {
                found: json_shape(value),
            });
        };

        let names = items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or(ConfigError::InvalidShape {
                        found: "a list with non-string items",
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(names))
    }

    /// Whether `name` is on the watch-list.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    /// Entries in source order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How a source file is decoded, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Lines,
    Structured,
}

impl SourceFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext)
                if ext.eq_ignore_ascii_case("yaml")
                    || ext.eq_ignore_ascii_case("yml")
                    || ext.eq_ignore_ascii_case("json") =>
            {
                Self::Structured
            }
            _ => Self::Lines,
        }
    }
}

/// Load and validate a watch-list from `path`.
///
/// Has no side effects: applying the result is the caller's decision.
pub fn load(path: &Path) -> Result<WatchList, ConfigError> {
    info!(path = %path.display(), "Attempting to open the alert configuration");

    let mut file = File::open(path).map_err(|source| ConfigError::SourceNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let list = match SourceFormat::from_path(path) {
        SourceFormat::Lines => parse_lines(&text),
        SourceFormat::Structured => parse_structured(path, &text)?,
    };

    if list.is_empty() {
        warn!(path = %path.display(), "Watch-list is empty; no alert will mark the cluster unhealthy");
    } else {
        info!(alerts = ?list.entries(), "Setting cluster critical alerts");
    }

    Ok(list)
}

/// One alert name per line, line terminators stripped. Empty lines are skipped.
pub fn parse_lines(text: &str) -> WatchList {
    WatchList::new(
        text.lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty()),
    )
}

fn parse_structured(path: &Path, text: &str) -> Result<WatchList, ConfigError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|source| ConfigError::Syntax {
            path: path.to_path_buf(),
            source,
        })?;

    let serde_yaml::Value::Sequence(items) = value else {
        return Err(ConfigError::InvalidShape {
            found: yaml_shape(&value),
        });
    };

    let names = items
        .into_iter()
        .map(|item| match item {
            serde_yaml::Value::String(name) => Ok(name.trim().to_string()),
            _ => Err(ConfigError::InvalidShape {
                found: "a list with non-string items",
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(WatchList::new(names))
}

fn json_shape(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "a mapping",
    }
}

fn yaml_shape(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a list",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

/// Holder of the active watch-list.
///
/// Written only by reload, read by every evaluation cycle.
#[derive(Debug, Default)]
pub struct WatchListStore {
    current: RwLock<Arc<WatchList>>,
}

impl WatchListStore {
    pub fn new(list: WatchList) -> Self {
        Self {
            current: RwLock::new(Arc::new(list)),
        }
    }

    /// Snapshot of the active watch-list.
    pub async fn current(&self) -> Arc<WatchList> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the active watch-list, returning the previous one.
    pub async fn replace(&self, list: WatchList) -> Arc<WatchList> {
        let mut guard = self.current.write().await;
        std::mem::replace(&mut *guard, Arc::new(list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_source(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_new_dedupes_and_keeps_order() {
        let list = WatchList::new(["B", "A", "B", "", "C", "A"]);
        assert_eq!(list.entries(), ["B", "A", "C"]);
        assert_eq!(list.len(), 3);
        assert!(list.contains("A"));
        assert!(!list.contains("D"));
    }

    #[test]
    fn test_from_value_accepts_list_of_strings() {
        let list = WatchList::from_value(&json!(["AlertOne", "AlertTwo"])).unwrap();
        assert_eq!(list.entries(), ["AlertOne", "AlertTwo"]);
    }

    #[test]
    fn test_from_value_rejects_mapping() {
        let err = WatchList::from_value(&json!({"test": "test"})).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidShape { found: "a mapping" }));
    }

    #[test]
    fn test_from_value_rejects_non_string_items() {
        let err = WatchList::from_value(&json!(["AlertOne", 42])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidShape { .. }));
    }

    #[test]
    fn test_parse_lines_strips_terminators_and_blanks() {
        let list = parse_lines("KubernetesMasterDown\r\n\nEtcdDown\n#NotAComment\n");
        assert_eq!(list.entries(), ["KubernetesMasterDown", "EtcdDown", "#NotAComment"]);
    }

    #[test]
    fn test_load_plain_text_source() {
        let file = write_source(".conf", "AlertOne\nAlertTwo\n");
        let list = load(file.path()).unwrap();
        assert_eq!(list.entries(), ["AlertOne", "AlertTwo"]);
    }

    #[test]
    fn test_load_missing_source() {
        let err = load(Path::new("does_not_exist")).unwrap_err();
        assert!(matches!(err, ConfigError::SourceNotFound { .. }));
    }

    #[test]
    fn test_load_yaml_list() {
        let file = write_source(".yaml", "- KubernetesMasterDown\n- EtcdDown\n");
        let list = load(file.path()).unwrap();
        assert_eq!(list.entries(), ["KubernetesMasterDown", "EtcdDown"]);
    }

    #[test]
    fn test_load_json_mapping_is_invalid_shape() {
        let file = write_source(".json", r#"{"test": "test"}"#);
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidShape { found: "a mapping" }));
    }

    #[test]
    fn test_load_broken_yaml_is_syntax_error() {
        let file = write_source(".yml", "- [unterminated\n");
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }));
    }

    #[tokio::test]
    async fn test_store_replace_swaps_whole_list() {
        let store = WatchListStore::new(WatchList::new(["Old"]));
        let before = store.current().await;

        let previous = store.replace(WatchList::new(["New"])).await;

        assert_eq!(previous.entries(), ["Old"]);
        assert_eq!(before.entries(), ["Old"]);
        assert_eq!(store.current().await.entries(), ["New"]);
    }
}
