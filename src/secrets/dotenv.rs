//! `.env` file parsing.
//!
//! Format: one `KEY=value` per line, `#` comments, blank lines allowed.
//! Lines without `=` are skipped. The first `=` splits key from value and
//! both sides are trimmed. A later duplicate key replaces the earlier one.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure to read a `.env` file that exists.
#[derive(Debug, Error)]
pub enum DotenvError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid UTF-8", path.display())]
    Utf8 { path: PathBuf },
}

/// Parse `.env` contents into a key/value map.
pub fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    values
}

/// Read and parse a `.env` file.
///
/// A missing file yields an empty map. Any other read failure is an error
/// for the caller to decide on.
pub fn load_dotenv(path: &Path) -> Result<HashMap<String, String>, DotenvError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(source) => {
            return Err(DotenvError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let contents = String::from_utf8(bytes).map_err(|_| DotenvError::Utf8 {
        path: path.to_path_buf(),
    })?;
    Ok(parse_dotenv(&contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_comments_blanks_and_last_wins() {
        let values = parse_dotenv("# comment\n\nFOO=bar\nFOO=baz\nBROKEN_LINE_NO_EQUALS\n");
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("FOO").map(String::as_str), Some("baz"));
    }

    #[test]
    fn test_split_on_first_equals_only() {
        let values = parse_dotenv("AVA_ENCRYPTION_KEY=abc==\nURL = a=b=c ");
        assert_eq!(values["AVA_ENCRYPTION_KEY"], "abc==");
        assert_eq!(values["URL"], "a=b=c");
    }

    #[test]
    fn test_whitespace_and_indented_comments() {
        let values = parse_dotenv("   # indented comment\n\t KEY \t=\t value \r\n");
        assert_eq!(values.len(), 1);
        assert_eq!(values["KEY"], "value");
    }

    #[test]
    fn test_empty_value_is_kept() {
        let values = parse_dotenv("EMPTY=\n");
        assert_eq!(values.get("EMPTY").map(String::as_str), Some(""));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let values = load_dotenv(&dir.path().join(".env")).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_dotenv(dir.path());
        assert!(matches!(result, Err(DotenvError::Io { .. })));
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"KEY=\xff\xfe\n").unwrap();
        let result = load_dotenv(file.path());
        assert!(matches!(result, Err(DotenvError::Utf8 { .. })));
    }
}
