//! File-parallel driver: rewrite each path in place and tally the outcome.

use std::fmt;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::transform_source;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub total: usize,
    pub succeeded: usize,
    /// Sorted by path.
    pub failures: Vec<Failure>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}/{} Processed Successfully", self.succeeded, self.total)?;
        for failure in &self.failures {
            writeln!(f, "{}: {}", failure.path.display(), failure.message)?;
        }
        Ok(())
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Replaces `path` with `text` through a temporary file in the same directory,
/// so the file is either fully rewritten or untouched.
fn write_atomically(path: &Path, text: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_error(path))?;
    tmp.write_all(text.as_bytes()).map_err(io_error(path))?;
    if let Ok(meta) = std::fs::metadata(path) {
        if let Err(err) = std::fs::set_permissions(tmp.path(), meta.permissions()) {
            tracing::debug!(path = %path.display(), error = %err, "could not copy file mode");
        }
    }
    tmp.persist(path).map_err(|e| io_error(path)(e.error))?;
    Ok(())
}

/// Reads, rewrites and writes back one file.
pub fn process_file(path: &Path, config: &Config) -> Result<()> {
    let text = std::fs::read_to_string(path).map_err(io_error(path))?;
    let name = path.to_string_lossy();
    let rewritten = transform_source(&name, &text, config)?;
    write_atomically(path, &rewritten)
}

/// Rewrites every path, spreading files over scoped worker threads.
pub fn run(paths: &[PathBuf], config: &Config) -> Report {
    let next = AtomicUsize::new(0);
    let succeeded = AtomicUsize::new(0);
    let failures = Mutex::new(Vec::new());

    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(paths.len())
        .max(1);

    std::thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(path) = paths.get(index) else {
                    break;
                };
                match process_file(path, config) {
                    Ok(()) => {
                        succeeded.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "rewrite failed");
                        let failure = Failure {
                            path: path.clone(),
                            message: err.to_string(),
                        };
                        failures
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .push(failure);
                    }
                }
            });
        }
    });

    let mut failures = failures
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    failures.sort_by(|a, b| a.path.cmp(&b.path));
    Report {
        total: paths.len(),
        succeeded: succeeded.into_inner(),
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_failures_after_the_tally() {
        let report = Report {
            total: 3,
            succeeded: 1,
            failures: vec![
                Failure {
                    path: "a.jsx".into(),
                    message: "pattern not found: default export".into(),
                },
                Failure {
                    path: "b.jsx".into(),
                    message: "arity exceeds 2: wrapper factory called with 3 arguments".into(),
                },
            ],
        };
        insta::assert_snapshot!(report.to_string(), @r"
        1/3 Processed Successfully
        a.jsx: pattern not found: default export
        b.jsx: arity exceeds 2: wrapper factory called with 3 arguments
        ");
    }

    #[cfg(unix)]
    #[test]
    fn rewritten_file_keeps_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("View.jsx");
        std::fs::write(
            &path,
            "const View = ({ a }) => a;\nconst s = (st) => ({ a: st.a });\nexport default connect(s)(View);\n",
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        process_file(&path, &Config::default()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("const a = useSelector((st) => st.a);"));
    }

    #[test]
    fn empty_batch() {
        let report = run(&[], &Config::default());
        assert_eq!(report.to_string(), "0/0 Processed Successfully\n");
    }
}
