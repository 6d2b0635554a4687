//! Reading TagScript source files in a named text encoding.

use crate::error::{Result, TagScriptError};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Text encodings accepted for source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// UTF-8 with an optional leading byte order mark.
    Utf8Sig,
    Ascii,
    /// ISO-8859-1. Every byte maps to the code point of the same value.
    Latin1,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf8Sig => "utf-8-sig",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin-1",
        }
    }

    /// Decode bytes, or `None` when they are not valid in this encoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).ok(),
            Encoding::Utf8Sig => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                String::from_utf8(bytes.to_vec()).ok()
            }
            Encoding::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = TagScriptError;

    fn from_str(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "utf-8-sig" | "utf8-sig" => Ok(Encoding::Utf8Sig),
            "ascii" | "us-ascii" => Ok(Encoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(Encoding::Latin1),
            _ => Err(TagScriptError::UnsupportedEncoding {
                name: name.to_string(),
            }),
        }
    }
}

/// Read and decode a source file.
pub fn read_source(path: &Path, encoding: Encoding) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => TagScriptError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => TagScriptError::Io(err),
    })?;

    encoding.decode(&bytes).ok_or_else(|| TagScriptError::Decode {
        path: path.to_path_buf(),
        encoding: encoding.name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encoding_names() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("utf_8_sig".parse::<Encoding>().unwrap(), Encoding::Utf8Sig);
        assert_eq!("ISO-8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert!(matches!(
            "ebcdic".parse::<Encoding>(),
            Err(TagScriptError::UnsupportedEncoding { .. })
        ));
    }

    #[test]
    fn test_decode() {
        assert_eq!(Encoding::Utf8Sig.decode(b"\xEF\xBB\xBFTASK: a").as_deref(), Some("TASK: a"));
        assert_eq!(Encoding::Utf8.decode(b"\xEF\xBB\xBFx").as_deref(), Some("\u{feff}x"));
        assert_eq!(Encoding::Ascii.decode(b"caf\xE9"), None);
        assert_eq!(Encoding::Latin1.decode(b"caf\xE9").as_deref(), Some("caf\u{e9}"));
        assert_eq!(Encoding::Utf8.decode(b"caf\xE9"), None);
    }

    #[test]
    fn test_missing_file() {
        let err = read_source(Path::new("/definitely/not/here.tag"), Encoding::Utf8).unwrap_err();
        assert!(matches!(err, TagScriptError::FileNotFound { .. }));
    }
}
