use std::fmt::{self, Write as _};
use std::path::PathBuf;

use scenery_decode::{DecodeError, TextureError};

/// Outcome of [`crate::Library::load_batch`].
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub cached: usize,
    /// Files replaced by placeholders.
    pub unreadable: Vec<(PathBuf, DecodeError)>,
    pub skipped: Vec<PathBuf>,
    /// Textures that failed to load, by the definition that uses them.
    pub textures: Vec<(PathBuf, TextureError)>,
}

impl LoadReport {
    /// Whether anything needs telling to the user.
    #[must_use]
    pub fn has_problems(&self) -> bool {
        !self.unreadable.is_empty() || !self.textures.is_empty()
    }

    /// One message covering every problem in the batch, if there were any.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        if !self.has_problems() {
            return None;
        }
        let mut out = String::new();
        if !self.unreadable.is_empty() {
            let _ = writeln!(out, "Can't read {}:", plural(self.unreadable.len(), "file"));
            for (path, err) in &self.unreadable {
                let _ = writeln!(out, "  {}: {err}", path.display());
            }
        }
        if !self.textures.is_empty() {
            let _ = writeln!(out, "Can't read {}:", plural(self.textures.len(), "texture"));
            for (path, err) in &self.textures {
                let _ = writeln!(out, "  {} ({}): {}", err.filename, path.display(), err.reason);
            }
        }
        Some(out)
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} loaded, {} cached, {} placeholders, {} skipped, {} texture errors",
            self.loaded,
            self.cached,
            self.unreadable.len(),
            self.skipped.len(),
            self.textures.len()
        )
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_report_has_no_summary() {
        let report = LoadReport {
            loaded: 3,
            skipped: vec![PathBuf::from("sand.bch")],
            ..LoadReport::default()
        };
        assert!(!report.has_problems());
        assert_eq!(report.summary(), None);
        assert_eq!(
            report.to_string(),
            "3 loaded, 0 cached, 0 placeholders, 1 skipped, 0 texture errors"
        );
    }

    #[test]
    fn summary_groups_problems() {
        let report = LoadReport {
            textures: vec![
                (
                    PathBuf::from("a.obj"),
                    TextureError {
                        filename: "a.png".to_owned(),
                        reason: "not found".to_owned(),
                    },
                ),
                (
                    PathBuf::from("b.pol"),
                    TextureError {
                        filename: "b".to_owned(),
                        reason: "not found".to_owned(),
                    },
                ),
            ],
            ..LoadReport::default()
        };
        let summary = report.summary().unwrap();
        assert!(summary.starts_with("Can't read 2 textures:\n"));
        assert!(summary.contains("  a.png (a.obj): not found\n"));
        assert!(!summary.contains("file"));
    }
}
