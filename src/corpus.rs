//! Building the input corpus from a directory.
//!
//! The corpus is the ordered list of files every strategy processes. It is
//! deliberately small: only direct children of the directory are considered,
//! filtered by extension, sorted by file name and capped. Thumbnails written
//! by earlier runs sit next to the sources with a `.thumb.` marker and are
//! skipped, so a second run measures the same inputs as the first.

use crate::config::CorpusConfig;
use crate::runner::OUTPUT_MARKER;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Cannot read {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Ordered, immutable list of input files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    paths: Vec<PathBuf>,
}

impl Corpus {
    /// Wrap an already-selected list. No filtering or capping is applied.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Scan `dir` for input images.
///
/// An empty result is not an error; the caller decides what to tell the user.
pub fn scan_corpus(dir: &Path, config: &CorpusConfig) -> Result<Corpus, CorpusError> {
    if !dir.is_dir() {
        return Err(CorpusError::NotADirectory(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        // Checked before pushing so a cap of 0 yields an empty corpus
        if paths.len() >= config.max_files {
            break;
        }
        let entry = entry.map_err(|source| CorpusError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_candidate(entry.path(), &config.extensions) {
            paths.push(entry.into_path());
        }
    }
    Ok(Corpus::new(paths))
}

fn is_candidate(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.contains(OUTPUT_MARKER) {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_bytes;
    use tempfile::TempDir;

    fn names(corpus: &Corpus) -> Vec<String> {
        corpus
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn picks_jpegs_case_insensitively_sorted() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.JPG", "a.jpeg", "c.png", "d.Jpg", "notes.txt"] {
            write_bytes(&tmp.path().join(name), 10);
        }

        let corpus = scan_corpus(tmp.path(), &CorpusConfig::default()).unwrap();
        assert_eq!(names(&corpus), vec!["a.jpeg", "b.JPG", "d.Jpg"]);
    }

    #[test]
    fn caps_at_max_files() {
        let tmp = TempDir::new().unwrap();
        for i in 0..15 {
            write_bytes(&tmp.path().join(format!("img{i:02}.jpg")), 10);
        }

        let corpus = scan_corpus(tmp.path(), &CorpusConfig::default()).unwrap();
        assert_eq!(corpus.len(), 10);
        assert_eq!(names(&corpus)[9], "img09.jpg");
    }

    #[test]
    fn zero_max_files_is_empty_corpus() {
        let tmp = TempDir::new().unwrap();
        for i in 0..15 {
            write_bytes(&tmp.path().join(format!("img{i:02}.jpg")), 10);
        }

        let config = CorpusConfig {
            max_files: 0,
            ..CorpusConfig::default()
        };
        let corpus = scan_corpus(tmp.path(), &config).unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn cap_of_one_takes_first_by_name() {
        let tmp = TempDir::new().unwrap();
        for name in ["c.jpg", "a.jpg", "b.jpg"] {
            write_bytes(&tmp.path().join(name), 10);
        }

        let config = CorpusConfig {
            max_files: 1,
            ..CorpusConfig::default()
        };
        let corpus = scan_corpus(tmp.path(), &config).unwrap();
        assert_eq!(names(&corpus), vec!["a.jpg"]);
    }

    #[test]
    fn skips_previous_outputs() {
        let tmp = TempDir::new().unwrap();
        write_bytes(&tmp.path().join("a.jpg"), 10);
        write_bytes(&tmp.path().join("a.jpg.thumb.image_lanczos3.jpg"), 5);

        let corpus = scan_corpus(tmp.path(), &CorpusConfig::default()).unwrap();
        assert_eq!(names(&corpus), vec!["a.jpg"]);
    }

    #[test]
    fn does_not_recurse() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("nested.jpg")).unwrap();
        write_bytes(&tmp.path().join("nested.jpg/inner.jpg"), 10);
        write_bytes(&tmp.path().join("top.jpg"), 10);

        let corpus = scan_corpus(tmp.path(), &CorpusConfig::default()).unwrap();
        assert_eq!(names(&corpus), vec!["top.jpg"]);
    }

    #[test]
    fn custom_extensions() {
        let tmp = TempDir::new().unwrap();
        write_bytes(&tmp.path().join("a.jpg"), 10);
        write_bytes(&tmp.path().join("b.PNG"), 10);

        let config = CorpusConfig {
            extensions: vec!["png".into()],
            ..CorpusConfig::default()
        };
        let corpus = scan_corpus(tmp.path(), &config).unwrap();
        assert_eq!(names(&corpus), vec!["b.PNG"]);
    }

    #[test]
    fn empty_directory_is_empty_corpus() {
        let tmp = TempDir::new().unwrap();
        let corpus = scan_corpus(tmp.path(), &CorpusConfig::default()).unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn missing_directory_is_error() {
        let result = scan_corpus(Path::new("/nonexistent/photos"), &CorpusConfig::default());
        assert!(matches!(result, Err(CorpusError::NotADirectory(_))));
    }

    #[test]
    fn new_keeps_given_order() {
        let corpus = Corpus::new(vec!["z.jpg".into(), "a.jpg".into()]);
        let collected: Vec<&PathBuf> = (&corpus).into_iter().collect();
        assert_eq!(collected, vec![&PathBuf::from("z.jpg"), &PathBuf::from("a.jpg")]);
    }
}
