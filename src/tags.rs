//! `.m3u`-style sidecar tag reader (§11): a playlist file sitting next to a
//! set of streams can carry `# @KEY value` comment lines that apply either
//! globally or to the specific filename named by the preceding `# filename`
//! marker line.
//!
//! Format, one directive per line:
//! - `# @KEY value` before any `# filename` marker: a global tag, applied to
//!   every file in the playlist unless overridden per-file.
//! - `# filename.ext` (a comment line that isn't a `@KEY` line): names the
//!   file subsequent `@KEY` lines apply to, until the next such marker.
//! - Blank lines and plain (non-`#`) lines are ignored by the tag reader
//!   (the latter are the playlist's actual file list, consumed by the
//!   caller, not by this module).
//!
//! Keys are matched case-insensitively; values are the rest of the line
//! after the key, trimmed.

use std::collections::HashMap;

/// Tags parsed from one `.m3u` sidecar: global tags plus a per-file
/// override map, both keyed case-insensitively (keys are stored
/// lowercased).
#[derive(Clone, Debug, Default)]
pub struct TagReader {
    global: HashMap<String, String>,
    per_file: HashMap<String, HashMap<String, String>>,
}

impl TagReader {
    /// Parses `contents` (the full text of a `.m3u` file).
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let mut reader = Self::default();
        let mut current_file: Option<String> = None;

        for line in contents.lines() {
            let line = line.trim();
            let Some(comment) = line.strip_prefix('#') else {
                continue;
            };
            let comment = comment.trim();

            if let Some(rest) = comment.strip_prefix('@') {
                let Some((key, value)) = rest.split_once([' ', '\t']) else {
                    continue;
                };
                let key = key.trim().to_ascii_lowercase();
                let value = value.trim().to_string();
                match &current_file {
                    Some(file) => {
                        let _ = reader.per_file.entry(file.clone()).or_default().insert(key, value);
                    }
                    None => {
                        let _ = reader.global.insert(key, value);
                    }
                }
            } else if !comment.is_empty() {
                current_file = Some(comment.to_string());
            }
        }

        reader
    }

    /// Looks up `key` (case-insensitive) for `filename`, falling back to the
    /// global value if the file has no override.
    #[must_use]
    pub fn get(&self, filename: &str, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.per_file
            .get(filename)
            .and_then(|tags| tags.get(&key))
            .or_else(|| self.global.get(&key))
            .map(String::as_str)
    }

    /// The global tag value for `key`, ignoring any per-file overrides.
    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.global.get(&key.to_ascii_lowercase()).map(String::as_str)
    }
}

#[cfg(test)]
mod test {
    use super::TagReader;

    #[test]
    fn reads_global_tag() {
        let reader = TagReader::parse("# @title My Soundtrack\nsong1.vag\nsong2.vag\n");
        assert_eq!(reader.get("song1.vag", "title"), Some("My Soundtrack"));
        assert_eq!(reader.get("song2.vag", "title"), Some("My Soundtrack"));
    }

    #[test]
    fn per_file_overrides_global() {
        let input = "# @artist Default Artist\n\
                      # song1.vag\n\
                      # @artist Special Artist\n\
                      song1.vag\n\
                      song2.vag\n";
        let reader = TagReader::parse(input);
        assert_eq!(reader.get("song1.vag", "artist"), Some("Special Artist"));
        assert_eq!(reader.get("song2.vag", "artist"), Some("Default Artist"));
    }

    #[test]
    fn key_matching_is_case_insensitive() {
        let reader = TagReader::parse("# @TITLE Loud\n");
        assert_eq!(reader.get("anything", "title"), Some("Loud"));
        assert_eq!(reader.get_global("Title"), Some("Loud"));
    }

    #[test]
    fn ignores_plain_lines() {
        let reader = TagReader::parse("not a comment\nsong.vag\n");
        assert_eq!(reader.get("song.vag", "title"), None);
    }
}
