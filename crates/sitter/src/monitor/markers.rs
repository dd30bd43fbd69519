use std::io;
use std::path::PathBuf;

/// Classification of the terminal marker files next to the output prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerState {
    /// Neither marker exists; the job has not reported yet.
    Missing,
    /// The job script wrote its success marker.
    Success,
    /// The job script wrote its fail marker.
    Fail,
}

/// The two sentinel files written by the monitored job itself. The monitor
/// only ever reads them, except for the one-time purge at startup.
pub struct Markers {
    success: PathBuf,
    fail: PathBuf,
}

impl Markers {
    pub fn new(output_prefix: &str) -> Self {
        Self {
            success: PathBuf::from(format!("{output_prefix}.success")),
            fail: PathBuf::from(format!("{output_prefix}.fail")),
        }
    }

    /// Removes markers left over from a previous run of the same pipeline
    /// step. Called exactly once, before the first submission; stale markers
    /// must not be misread as fresh completion.
    pub fn clear(&self) -> io::Result<()> {
        for path in [&self.success, &self.fail] {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    /// Current marker state. Success wins when both markers exist.
    pub fn check(&self) -> MarkerState {
        if self.success.exists() {
            MarkerState::Success
        } else if self.fail.exists() {
            MarkerState::Fail
        } else {
            MarkerState::Missing
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::monitor::markers::{MarkerState, Markers};

    fn markers_in(dir: &TempDir) -> (Markers, String) {
        let prefix = dir.path().join("job").display().to_string();
        (Markers::new(&prefix), prefix)
    }

    #[test]
    fn classification() {
        let dir = TempDir::new().unwrap();
        let (markers, prefix) = markers_in(&dir);

        assert_eq!(markers.check(), MarkerState::Missing);
        std::fs::write(format!("{prefix}.fail"), "").unwrap();
        assert_eq!(markers.check(), MarkerState::Fail);
        std::fs::write(format!("{prefix}.success"), "").unwrap();
        assert_eq!(markers.check(), MarkerState::Success);
    }

    #[test]
    fn check_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let (markers, prefix) = markers_in(&dir);

        assert_eq!(markers.check(), markers.check());
        std::fs::write(format!("{prefix}.success"), "").unwrap();
        assert_eq!(markers.check(), MarkerState::Success);
        assert_eq!(markers.check(), MarkerState::Success);
    }

    #[test]
    fn clear_removes_stale_markers() {
        let dir = TempDir::new().unwrap();
        let (markers, prefix) = markers_in(&dir);

        std::fs::write(format!("{prefix}.success"), "").unwrap();
        std::fs::write(format!("{prefix}.fail"), "").unwrap();
        markers.clear().unwrap();
        assert_eq!(markers.check(), MarkerState::Missing);

        // Clearing an already clean state is a no-op.
        markers.clear().unwrap();
        assert_eq!(markers.check(), MarkerState::Missing);
    }
}
