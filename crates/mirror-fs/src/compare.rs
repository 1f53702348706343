//! File equivalence policies
//!
//! The reconciler asks a [`Comparator`] whether a replica file can be kept as
//! is. Comparators never fail: anything that cannot be inspected is reported
//! as "not equivalent", and the copy that follows surfaces the real error.

use std::fmt;
use std::fs::{self, File, Metadata};
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use filetime::FileTime;

const CHUNK_SIZE: usize = 64 * 1024;

/// Decides whether a replica file matches its source counterpart.
pub trait Comparator: Send + Sync {
    /// Returns `true` if `replica` can be kept for `source`.
    ///
    /// Must return `false` if `replica` does not exist.
    fn equivalent(&self, source: &Path, replica: &Path) -> bool;

    /// Short policy name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Metadata-only comparison: file type, size, and modification time.
///
/// File bytes are never read. A content change that keeps both the size and
/// the modification time is not detected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShallowComparator;

impl Comparator for ShallowComparator {
    fn equivalent(&self, source: &Path, replica: &Path) -> bool {
        let Some((src, rep)) = regular_pair(source, replica) else {
            return false;
        };
        src.len() == rep.len()
            && FileTime::from_last_modification_time(&src)
                == FileTime::from_last_modification_time(&rep)
    }

    fn name(&self) -> &'static str {
        "shallow"
    }
}

/// Byte-for-byte comparison, after a size check.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentComparator;

impl Comparator for ContentComparator {
    fn equivalent(&self, source: &Path, replica: &Path) -> bool {
        let Some((src, rep)) = regular_pair(source, replica) else {
            return false;
        };
        if src.len() != rep.len() {
            return false;
        }
        same_bytes(source, replica).unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "content"
    }
}

/// Selectable comparison policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareMode {
    #[default]
    Shallow,
    Content,
}

impl CompareMode {
    /// Build the comparator for this policy.
    pub fn comparator(self) -> Box<dyn Comparator> {
        match self {
            Self::Shallow => Box::new(ShallowComparator),
            Self::Content => Box::new(ContentComparator),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shallow => "shallow",
            Self::Content => "content",
        }
    }
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shallow" => Ok(Self::Shallow),
            "content" => Ok(Self::Content),
            other => Err(format!(
                "unknown compare mode '{other}' (expected 'shallow' or 'content')"
            )),
        }
    }
}

fn regular_pair(source: &Path, replica: &Path) -> Option<(Metadata, Metadata)> {
    let src = fs::metadata(source).ok()?;
    let rep = fs::metadata(replica).ok()?;
    (src.is_file() && rep.is_file()).then_some((src, rep))
}

fn same_bytes(a: &Path, b: &Path) -> io::Result<bool> {
    let mut left = File::open(a)?;
    let mut right = File::open(b)?;
    let mut left_buf = vec![0u8; CHUNK_SIZE];
    let mut right_buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = fill(&mut left, &mut left_buf)?;
        let m = fill(&mut right, &mut right_buf)?;
        if n != m || left_buf[..n] != right_buf[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

/// Read until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    #[case("shallow", CompareMode::Shallow)]
    #[case("content", CompareMode::Content)]
    #[case("Content", CompareMode::Content)]
    fn parse_compare_mode(#[case] input: &str, #[case] expected: CompareMode) {
        assert_eq!(input.parse::<CompareMode>().unwrap(), expected);
    }

    #[test]
    fn parse_unknown_compare_mode_fails() {
        let err = "sha256".parse::<CompareMode>().unwrap_err();
        assert!(err.contains("sha256"));
    }

    #[test]
    fn mode_builds_matching_comparator() {
        assert_eq!(CompareMode::Shallow.comparator().name(), "shallow");
        assert_eq!(CompareMode::Content.comparator().name(), "content");
        assert_eq!(CompareMode::default(), CompareMode::Shallow);
    }

    #[test]
    fn fill_reads_whole_buffer_across_short_reads() {
        let data = vec![7u8; CHUNK_SIZE + 10];
        let mut reader = io::Cursor::new(data);
        let mut buf = vec![0u8; CHUNK_SIZE];
        assert_eq!(fill(&mut reader, &mut buf).unwrap(), CHUNK_SIZE);
        assert_eq!(fill(&mut reader, &mut buf).unwrap(), 10);
        assert_eq!(fill(&mut reader, &mut buf).unwrap(), 0);
    }

    #[test]
    fn same_bytes_detects_difference_past_first_chunk() {
        let dir = tempdir().unwrap();
        let mut a = vec![1u8; CHUNK_SIZE * 2];
        let b = a.clone();
        a[CHUNK_SIZE + 5] = 2;
        fs::write(dir.path().join("a"), &a).unwrap();
        fs::write(dir.path().join("b"), &b).unwrap();

        assert!(!same_bytes(&dir.path().join("a"), &dir.path().join("b")).unwrap());
        assert!(same_bytes(&dir.path().join("b"), &dir.path().join("b")).unwrap());
    }
}
