//! Normalised batch inputs for `load` and `write`.
//!
//! [`PathSpec`] maps each source path to an optional password and
//! [`WriteSpec`] maps each target path to the payload to store there. Both
//! keep insertion order, which is the order of the result mapping.
//!
//! The typed constructors cannot express a malformed shape. The JSON entry
//! points (`from_json`) are where loosely typed input, e.g. a manifest file
//! or a binding from another language, is checked and rejected with
//! [`HandlerError::InvalidArgument`].

use filehandler_core::{HandlerError, Payload, Result, Value};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

const PATHS_SHAPE: &str = "file_paths should be str, list[str] or dict[str, str]";
const PASSWORD_TYPE: &str = "password values should be str or None";
const PATHS_EXIST: &str = "all file paths should exist";
const WRITE_SHAPE: &str = "file_handler_data should be a dict of file paths to data";
const WRITE_KEYS: &str = "all keys in file_handler_data should be str representing file paths";

/// Ordered mapping of source path to optional password.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSpec {
    entries: IndexMap<PathBuf, Option<String>>,
}

impl PathSpec {
    /// An empty spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths without passwords.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths.into_iter().map(|p| (p, None)).collect()
    }

    /// Paths with optional passwords.
    pub fn with_passwords<I, P, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, Option<S>)>,
        P: Into<PathBuf>,
        S: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(p, pw)| (p, pw.map(Into::into)))
            .collect()
    }

    /// Build a spec from loosely typed input: a string, a list of strings,
    /// or an object of path to password (string or null).
    ///
    /// # Errors
    /// Returns [`HandlerError::InvalidArgument`] for any other shape or a
    /// password that is neither a string nor null.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;

        match value {
            Json::String(path) => Ok(Self::from_paths([path.as_str()])),
            Json::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(|p| (PathBuf::from(p), None))
                        .ok_or_else(|| HandlerError::InvalidArgument(PATHS_SHAPE.to_string()))
                })
                .collect(),
            Json::Object(map) => map
                .iter()
                .map(|(path, password)| match password {
                    Json::Null => Ok((PathBuf::from(path), None)),
                    Json::String(pw) => Ok((PathBuf::from(path), Some(pw.clone()))),
                    _ => Err(HandlerError::InvalidArgument(PASSWORD_TYPE.to_string())),
                })
                .collect(),
            _ => Err(HandlerError::InvalidArgument(PATHS_SHAPE.to_string())),
        }
    }

    /// Add one entry, replacing the password of an existing path.
    pub fn insert(&mut self, path: impl Into<PathBuf>, password: Option<String>) {
        self.entries.insert(path.into(), password);
    }

    /// Check that every path exists, all at once.
    ///
    /// # Errors
    /// Returns [`HandlerError::InvalidArgument`] listing every missing path.
    pub fn validate_exists(&self) -> Result<()> {
        let missing: Vec<String> = self
            .entries
            .keys()
            .filter(|path| !path.exists())
            .map(|path| path.display().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(HandlerError::InvalidArgument(format!(
                "{PATHS_EXIST}: {}",
                missing.join(", ")
            )))
        }
    }

    /// Iterate over `(path, password)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, Option<&str>)> {
        self.entries
            .iter()
            .map(|(path, pw)| (path.as_path(), pw.as_deref()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the spec is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<PathBuf>> FromIterator<(P, Option<String>)> for PathSpec {
    fn from_iter<I: IntoIterator<Item = (P, Option<String>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(p, pw)| (p.into(), pw)).collect(),
        }
    }
}

impl From<&str> for PathSpec {
    fn from(path: &str) -> Self {
        Self::from_paths([path])
    }
}

impl From<String> for PathSpec {
    fn from(path: String) -> Self {
        Self::from_paths([path])
    }
}

impl From<&Path> for PathSpec {
    fn from(path: &Path) -> Self {
        Self::from_paths([path])
    }
}

impl From<PathBuf> for PathSpec {
    fn from(path: PathBuf) -> Self {
        Self::from_paths([path])
    }
}

impl<P: Into<PathBuf>> From<Vec<P>> for PathSpec {
    fn from(paths: Vec<P>) -> Self {
        Self::from_paths(paths)
    }
}

impl<P: Into<PathBuf>, const N: usize> From<[P; N]> for PathSpec {
    fn from(paths: [P; N]) -> Self {
        Self::from_paths(paths)
    }
}

/// Ordered mapping of target path to the payload written there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteSpec {
    entries: IndexMap<PathBuf, Payload>,
}

impl WriteSpec {
    /// An empty spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one entry, replacing the payload of an existing path.
    #[must_use = "returns the spec with the entry added"]
    pub fn with(mut self, path: impl Into<PathBuf>, payload: impl Into<Payload>) -> Self {
        self.insert(path, payload);
        self
    }

    /// Add one entry, replacing the payload of an existing path.
    pub fn insert(&mut self, path: impl Into<PathBuf>, payload: impl Into<Payload>) {
        self.entries.insert(path.into(), payload.into());
    }

    /// Build a spec from a JSON object of path to data. String values become
    /// text payloads, everything else structured data.
    ///
    /// # Errors
    /// Returns [`HandlerError::InvalidArgument`] if `value` is not an object
    /// or a key is empty.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(HandlerError::InvalidArgument(WRITE_SHAPE.to_string()));
        };
        let spec: Self = map
            .iter()
            .map(|(path, data)| {
                let payload = match data {
                    serde_json::Value::String(text) => Payload::Text(text.clone()),
                    other => Payload::Structured(Value::from_json(other.clone())),
                };
                (PathBuf::from(path), payload)
            })
            .collect();
        spec.validate()?;
        Ok(spec)
    }

    /// Reject keys that cannot name a file.
    ///
    /// # Errors
    /// Returns [`HandlerError::InvalidArgument`] for an empty path.
    pub fn validate(&self) -> Result<()> {
        if self.entries.keys().any(|path| path.as_os_str().is_empty()) {
            return Err(HandlerError::InvalidArgument(WRITE_KEYS.to_string()));
        }
        Ok(())
    }

    /// Iterate over `(path, payload)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Payload)> {
        self.entries.iter().map(|(path, data)| (path.as_path(), data))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the spec is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<PathBuf>, D: Into<Payload>> FromIterator<(P, D)> for WriteSpec {
    fn from_iter<I: IntoIterator<Item = (P, D)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(p, d)| (p.into(), d.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn invalid(err: HandlerError) -> String {
        match err {
            HandlerError::InvalidArgument(msg) => msg,
            other => panic!("expected an invalid-argument fault, got {other:?}"),
        }
    }

    #[test]
    fn test_shapes() {
        let single = PathSpec::from("a.txt");
        assert_eq!(single.len(), 1);

        let list = PathSpec::from(["a.txt", "b.csv", "a.txt"]);
        assert_eq!(
            list.iter().map(|(p, _)| p.to_path_buf()).collect::<Vec<_>>(),
            vec![PathBuf::from("a.txt"), PathBuf::from("b.csv")]
        );

        let with_pw = PathSpec::with_passwords([("doc.pdf", Some("pw")), ("a.txt", None)]);
        assert_eq!(
            with_pw.iter().collect::<Vec<_>>(),
            vec![(Path::new("doc.pdf"), Some("pw")), (Path::new("a.txt"), None)]
        );
    }

    #[test]
    fn test_from_json_accepts_the_three_shapes() {
        assert_eq!(PathSpec::from_json(&json!("a.txt")).unwrap(), PathSpec::from("a.txt"));
        assert_eq!(
            PathSpec::from_json(&json!(["a.txt", "b.txt"])).unwrap(),
            PathSpec::from(["a.txt", "b.txt"])
        );
        let spec = PathSpec::from_json(&json!({"doc.pdf": "pw", "a.txt": null})).unwrap();
        assert_eq!(
            spec,
            PathSpec::with_passwords([("doc.pdf", Some("pw")), ("a.txt", None::<&str>)])
        );
    }

    #[test]
    fn test_from_json_rejects_bad_shapes() {
        for bad in [json!(42), json!(null), json!(true), json!([1, 2]), json!(["a", ["b"]])] {
            let err = PathSpec::from_json(&bad).unwrap_err();
            assert_eq!(invalid(err), PATHS_SHAPE, "input {bad}");
        }
    }

    #[test]
    fn test_from_json_rejects_non_string_password() {
        let err = PathSpec::from_json(&json!({"doc.pdf": 1234})).unwrap_err();
        assert_eq!(invalid(err), PASSWORD_TYPE);
    }

    #[test]
    fn test_validate_exists_lists_every_missing_path() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("here.txt");
        std::fs::write(&present, "x").unwrap();
        let gone_a = dir.path().join("gone_a.txt");
        let gone_b = dir.path().join("gone_b.txt");

        assert!(PathSpec::from([&present]).validate_exists().is_ok());

        let msg = invalid(
            PathSpec::from(vec![&gone_a, &present, &gone_b])
                .validate_exists()
                .unwrap_err(),
        );
        assert!(msg.starts_with(PATHS_EXIST));
        assert!(msg.contains("gone_a.txt"));
        assert!(msg.contains("gone_b.txt"));
        assert!(!msg.contains("here.txt"));
    }

    #[test]
    fn test_write_spec_from_json() {
        let spec = WriteSpec::from_json(&json!({
            "out/a.txt": "hello",
            "out/b.json": {"when": "2024-01-01T12:00:00", "n": [1, 2]},
        }))
        .unwrap();
        let entries: Vec<_> = spec.iter().collect();
        assert_eq!(entries[0], (Path::new("out/a.txt"), &Payload::from("hello")));
        let Payload::Structured(value) = entries[1].1 else {
            panic!("expected structured payload");
        };
        assert_eq!(value.get("when").map(Value::kind), Some("datetime"));
    }

    #[test]
    fn test_write_spec_rejects_bad_input() {
        assert_eq!(
            invalid(WriteSpec::from_json(&json!(["a.txt"])).unwrap_err()),
            WRITE_SHAPE
        );
        assert_eq!(
            invalid(WriteSpec::from_json(&json!({"": "x"})).unwrap_err()),
            WRITE_KEYS
        );
        assert_eq!(
            invalid(WriteSpec::new().with("", "x").validate().unwrap_err()),
            WRITE_KEYS
        );
    }
}
