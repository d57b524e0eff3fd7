//! Pre-write availability probe.
//!
//! A target is available when it does not exist yet or can be opened for
//! reading. Permission failures are treated as a transient lock and retried
//! with a fixed backoff; any other I/O failure is returned as an error.
//!
//! The check itself is an [`Opener`], so callers can swap the plain
//! `File::open` for their own lock test.

use filehandler_core::{Diagnostics, HandlerError, Result};
use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::Path;
use std::time::Duration;

/// Tries to open an existing target; `PermissionDenied` means locked.
pub type Opener = fn(&Path) -> io::Result<()>;

/// Default [`Opener`]: open the file for reading and close it again.
pub fn open_for_read(path: &Path) -> io::Result<()> {
    File::open(path).map(drop)
}

/// Number of attempts before a target is reported unavailable.
pub const MAX_RETRIES: u32 = 10;

/// Default pause between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Probe `path` with `open`, retrying permission failures up to
/// [`MAX_RETRIES`] times.
///
/// Returns `Ok(false)` once the retries are exhausted.
///
/// # Errors
/// Returns [`HandlerError::Unexpected`] for any failure other than a
/// permission error.
pub fn probe(
    path: &Path,
    backoff: Duration,
    diagnostics: &dyn Diagnostics,
    open: Opener,
) -> Result<bool> {
    for attempt in 1..=MAX_RETRIES {
        if !path.exists() {
            return Ok(true);
        }
        match open(path) {
            Ok(_) => return Ok(true),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                diagnostics.warn(&format!(
                    "File {} is unaccessible. Verify! We will try again in {} seconds (already tried {attempt} times)!",
                    path.display(),
                    backoff.as_secs()
                ));
                std::thread::sleep(backoff);
            }
            Err(e) => return Err(HandlerError::Unexpected(e.to_string())),
        }
    }
    Ok(false)
}
