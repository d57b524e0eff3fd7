//! Dispatch core: batch `load` and `write` over many files.
//!
//! Call-level faults (malformed input, missing source paths) are returned as
//! `Err`. Anything that goes wrong with a single file is contained: the
//! message is reported to the [`Diagnostics`] sink and stored under that
//! file's key, and the rest of the batch carries on.

use crate::availability::{self, Opener, DEFAULT_BACKOFF};
use crate::path_spec::{PathSpec, WriteSpec};
use crate::resolver::adapter_for;
use crate::traits::AdapterOptions;
use crate::utils::is_binary_mode;
use filehandler_core::{
    Diagnostics, HandlerError, LogDiagnostics, NoProgress, Payload, Progress, Result,
};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Progress label for `load`.
pub const LOAD_LABEL: &str = "Loading data...";
/// Progress label for `write`.
pub const WRITE_LABEL: &str = "Writing data...";

const DEFAULT_ENCODING: &str = "utf-8";
const DEFAULT_READ_MODE: &str = "r";
const DEFAULT_WRITE_MODE: &str = "w";

/// Outcome of loading one file: the payload, or the error message.
pub type LoadOutcome = std::result::Result<Payload, String>;

/// Result of a batch load, keyed by path in input order.
pub type LoadResult = IndexMap<String, LoadOutcome>;

/// Result of a batch write, keyed by path in input order.
pub type WriteResult = IndexMap<String, WriteOutcome>;

/// Outcome of writing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was written.
    Written,
    /// The target stayed locked after every retry.
    Unavailable(String),
    /// The adapter or the file system failed.
    Failed(String),
}

impl WriteOutcome {
    /// Whether the file was written.
    #[inline]
    #[must_use]
    pub const fn is_written(&self) -> bool {
        matches!(self, Self::Written)
    }

    /// The message for an unwritten file.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Written => None,
            Self::Unavailable(msg) | Self::Failed(msg) => Some(msg),
        }
    }

    /// `true` when written, the message otherwise.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.message()
            .map_or(serde_json::Value::Bool(true), |msg| msg.into())
    }
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            None => write!(f, "written"),
            Some(msg) => write!(f, "{msg}"),
        }
    }
}

/// Options shared by every file in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Text encoding label, `None` (or `"none"`) for no decoding.
    pub encoding: Option<String>,

    /// Transfer mode. `None` means `r` for load and `w` for write. A mode
    /// containing `b` forces binary transfer and disables the encoding.
    pub mode: Option<String>,

    /// Spread the batch over a worker pool.
    pub parallel: bool,

    /// Worker count for parallel runs (None = available parallelism).
    pub workers: Option<usize>,

    /// Pause between availability retries before a write.
    pub backoff: Duration,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            encoding: Some(DEFAULT_ENCODING.to_string()),
            mode: None,
            parallel: false,
            workers: None,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl HandlerOptions {
    /// Set the encoding label
    #[inline]
    #[must_use = "returns options with the encoding configured"]
    pub fn with_encoding(mut self, encoding: Option<&str>) -> Self {
        self.encoding = encoding.map(str::to_string);
        self
    }

    /// Set the transfer mode
    #[inline]
    #[must_use = "returns options with the mode configured"]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Enable or disable parallel execution
    #[inline]
    #[must_use = "returns options with parallel execution configured"]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the worker count for parallel runs
    #[inline]
    #[must_use = "returns options with the worker count configured"]
    pub const fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    /// Set the availability retry backoff
    #[inline]
    #[must_use = "returns options with the backoff configured"]
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn mode_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.mode.as_deref().unwrap_or(default)
    }

    /// Encoding handed to adapters under `mode`.
    fn encoding_for(&self, mode: &str) -> Option<&str> {
        if is_binary_mode(mode) {
            return None;
        }
        self.encoding
            .as_deref()
            .filter(|label| !label.eq_ignore_ascii_case("none"))
    }
}

/// Batch loader and writer over every registered format.
///
/// ```no_run
/// use filehandler_backend::{FileHandler, WriteSpec};
/// use filehandler_core::Payload;
///
/// let handler = FileHandler::new();
/// let written = handler.write(&WriteSpec::new().with("out/notes.txt", "hello"))?;
/// assert!(written["out/notes.txt"].is_written());
///
/// let loaded = handler.load("out/notes.txt")?;
/// assert_eq!(loaded["out/notes.txt"].as_ref().ok(), Some(&Payload::from("hello")));
/// # Ok::<(), filehandler_core::HandlerError>(())
/// ```
#[derive(Clone)]
pub struct FileHandler {
    options: HandlerOptions,
    diagnostics: Arc<dyn Diagnostics>,
    progress: Arc<dyn Progress>,
    opener: Opener,
}

impl fmt::Debug for FileHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for FileHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHandler {
    /// Handler with default options, logging through `log` and no progress.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: HandlerOptions::default(),
            diagnostics: Arc::new(LogDiagnostics),
            progress: Arc::new(NoProgress),
            opener: availability::open_for_read,
        }
    }

    /// Replace the options
    #[must_use = "returns the handler with options configured"]
    pub fn with_options(mut self, options: HandlerOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the diagnostics sink
    #[must_use = "returns the handler with the diagnostics sink configured"]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Replace the progress reporter
    #[must_use = "returns the handler with the progress reporter configured"]
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// Replace the lock test run on existing write targets
    #[must_use = "returns the handler with the opener configured"]
    pub fn with_opener(mut self, opener: Opener) -> Self {
        self.opener = opener;
        self
    }

    /// Current options
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &HandlerOptions {
        &self.options
    }

    /// Load every file in `paths`.
    ///
    /// # Errors
    /// Returns [`HandlerError::InvalidArgument`] if any path does not exist.
    /// No file is read in that case.
    pub fn load(&self, paths: impl Into<PathSpec>) -> Result<LoadResult> {
        self.load_spec(&paths.into())
    }

    /// Load from loosely typed input (see [`PathSpec::from_json`]).
    ///
    /// # Errors
    /// Returns [`HandlerError::InvalidArgument`] for a malformed shape, a
    /// non-string password or a missing path.
    pub fn load_json(&self, paths: &serde_json::Value) -> Result<LoadResult> {
        self.load_spec(&PathSpec::from_json(paths)?)
    }

    /// Load every file in a prepared spec.
    ///
    /// # Errors
    /// Returns [`HandlerError::InvalidArgument`] if any path does not exist.
    pub fn load_spec(&self, spec: &PathSpec) -> Result<LoadResult> {
        spec.validate_exists()?;

        let mode = self.options.mode_or(DEFAULT_READ_MODE);
        let encoding = self.options.encoding_for(mode);
        let items: Vec<(&Path, Option<&str>)> = spec.iter().collect();
        log::debug!("loading {} file(s), mode {mode:?}", items.len());

        let outcomes = self.run(&items, LOAD_LABEL, |&(path, password)| {
            let options = AdapterOptions::read()
                .with_password(password)
                .with_encoding(encoding)
                .with_mode(mode)
                .with_diagnostics(self.diagnostics.as_ref());
            self.load_one(path, &options)
        });

        let loaded = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        self.diagnostics
            .info(&format!("Loaded {loaded} of {} file(s)", items.len()));

        Ok(items
            .iter()
            .map(|(path, _)| path.display().to_string())
            .zip(outcomes)
            .collect())
    }

    /// Write every entry in `data`.
    ///
    /// # Errors
    /// Returns [`HandlerError::InvalidArgument`] if a key cannot name a file.
    pub fn write(&self, data: &WriteSpec) -> Result<WriteResult> {
        data.validate()?;

        let mode = self.options.mode_or(DEFAULT_WRITE_MODE);
        let encoding = self.options.encoding_for(mode);
        let items: Vec<(&Path, &Payload)> = data.iter().collect();
        log::debug!("writing {} file(s), mode {mode:?}", items.len());

        let outcomes = self.run(&items, WRITE_LABEL, |&(path, payload)| {
            let options = AdapterOptions::write()
                .with_encoding(encoding)
                .with_mode(mode)
                .with_diagnostics(self.diagnostics.as_ref());
            self.write_one(path, payload, &options)
        });

        let written = outcomes.iter().filter(|outcome| outcome.is_written()).count();
        self.diagnostics
            .info(&format!("Wrote {written} of {} file(s)", items.len()));

        Ok(items
            .iter()
            .map(|(path, _)| path.display().to_string())
            .zip(outcomes)
            .collect())
    }

    /// Write from a loosely typed JSON object (see [`WriteSpec::from_json`]).
    ///
    /// # Errors
    /// Returns [`HandlerError::InvalidArgument`] for a malformed shape or key.
    pub fn write_json(&self, data: &serde_json::Value) -> Result<WriteResult> {
        self.write(&WriteSpec::from_json(data)?)
    }

    /// Load one file with the adapter its extension selects, containing any
    /// failure.
    pub fn load_one(&self, path: &Path, options: &AdapterOptions<'_>) -> LoadOutcome {
        adapter_for(path, options.mode)
            .load(path, options)
            .map_err(|e| {
                let message = format!("Error loading file {}: {e}", path.display());
                self.diagnostics.error(&message);
                message
            })
    }

    /// Create the parent directory, wait for the target, then write it,
    /// containing any failure.
    pub fn write_one(
        &self,
        path: &Path,
        payload: &Payload,
        options: &AdapterOptions<'_>,
    ) -> WriteOutcome {
        match self.try_write(path, payload, options) {
            Ok(true) => WriteOutcome::Written,
            Ok(false) => {
                let message = format!("File {} is not accessible for writing.", path.display());
                self.diagnostics.warn(&message);
                WriteOutcome::Unavailable(message)
            }
            Err(e) => {
                let message = format!("Error writing file {}: {e}", path.display());
                self.diagnostics.error(&message);
                WriteOutcome::Failed(message)
            }
        }
    }

    fn try_write(&self, path: &Path, payload: &Payload, options: &AdapterOptions<'_>) -> Result<bool> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        if !availability::probe(
            path,
            self.options.backoff,
            self.diagnostics.as_ref(),
            self.opener,
        )? {
            return Ok(false);
        }
        adapter_for(path, options.mode).write(path, payload, options)?;
        Ok(true)
    }

    /// Map `f` over `items`, sequentially or on a worker pool. Output order
    /// always matches input order.
    fn run<T, R, F>(&self, items: &[T], label: &str, f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        self.progress.start(items.len(), label);
        let step = |item: &T| {
            let result = f(item);
            self.progress.advance();
            result
        };

        let results = if self.options.parallel && items.len() > 1 {
            match self.pool() {
                Ok(pool) => pool.install(|| items.par_iter().map(step).collect()),
                Err(e) => {
                    self.diagnostics
                        .warn(&format!("Worker pool unavailable, running sequentially: {e}"));
                    items.iter().map(step).collect()
                }
            }
        } else {
            items.iter().map(step).collect()
        };

        self.progress.finish();
        results
    }

    fn pool(&self) -> std::result::Result<rayon::ThreadPool, HandlerError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers.unwrap_or(0))
            .thread_name(|i| format!("filehandler-{i}"))
            .build()
            .map_err(|e| HandlerError::Unexpected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filehandler_core::{CountingProgress, MemoryDiagnostics, Severity};
    use tempfile::TempDir;

    #[test]
    fn test_binary_mode_disables_encoding() {
        let options = HandlerOptions::default();
        assert_eq!(options.encoding_for("r"), Some("utf-8"));
        assert_eq!(options.encoding_for("rb"), None);
        assert_eq!(options.encoding_for("wb"), None);

        let none = HandlerOptions::default().with_encoding(Some("None"));
        assert_eq!(none.encoding_for("r"), None);
    }

    #[test]
    fn test_default_modes() {
        let options = HandlerOptions::default();
        assert_eq!(options.mode_or(DEFAULT_READ_MODE), "r");
        assert_eq!(options.mode_or(DEFAULT_WRITE_MODE), "w");
        let options = options.with_mode("a");
        assert_eq!(options.mode_or(DEFAULT_WRITE_MODE), "a");
    }

    #[test]
    fn test_write_outcome_json() {
        assert_eq!(WriteOutcome::Written.to_json(), serde_json::json!(true));
        assert_eq!(
            WriteOutcome::Failed("boom".into()).to_json(),
            serde_json::json!("boom")
        );
        assert_eq!(WriteOutcome::Unavailable("busy".into()).to_string(), "busy");
    }

    #[test]
    fn test_contained_failure_reaches_diagnostics() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();

        let diagnostics = Arc::new(MemoryDiagnostics::new());
        let progress = Arc::new(CountingProgress::new());
        let handler = FileHandler::new()
            .with_diagnostics(diagnostics.clone())
            .with_progress(progress.clone());

        let results = handler.load(path.as_path()).unwrap();
        let message = results[&path.display().to_string()].clone().unwrap_err();
        assert!(message.starts_with(&format!("Error loading file {}: JSON error:", path.display())));
        assert_eq!(diagnostics.messages(Severity::Error), vec![message]);
        assert_eq!(
            diagnostics.messages(Severity::Info),
            vec!["Loaded 0 of 1 file(s)".to_string()]
        );
        assert_eq!((progress.total(), progress.done()), (1, 1));
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("note.txt");
        let handler = FileHandler::new().with_diagnostics(Arc::new(MemoryDiagnostics::new()));

        let results = handler.write(&WriteSpec::new().with(&path, "hi")).unwrap();
        assert!(results[&path.display().to_string()].is_written());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hi");
    }

    #[test]
    fn test_write_summary_counts_written_files() {
        let dir = TempDir::new().unwrap();
        let diagnostics = Arc::new(MemoryDiagnostics::new());
        let handler = FileHandler::new().with_diagnostics(diagnostics.clone());

        let data = WriteSpec::new()
            .with(dir.path().join("a.txt"), "a")
            .with(dir.path().join("b.pdf"), "b");
        handler.write(&data).unwrap();
        assert_eq!(
            diagnostics.messages(Severity::Info),
            vec!["Wrote 1 of 2 file(s)".to_string()]
        );
    }
}
