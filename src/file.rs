//! Reading and writing document files.
//!
//! The patching core never touches the filesystem; this module is the thin
//! layer that turns a file into a [`Node`] tree and back.

use crate::document::Node;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Pseudo path used when parsing text that did not come from a file.
const BUFFER_PATH: &str = "<buffer>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    #[serde(alias = "yml")]
    Yaml,
    Json,
}

#[derive(Error, Debug)]
pub enum FileError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to back up {}: {source}", path.display())]
    Backup { path: PathBuf, source: io::Error },

    #[error("invalid {format} in {}: {message}", path.display())]
    Parse {
        path: PathBuf,
        format: Format,
        message: String,
    },

    #[error("document cannot be written as {format}: {message}")]
    Serialize { format: Format, message: String },
}

impl Format {
    /// Pick a format from the file extension. Anything that is not `.json`
    /// is treated as YAML, which also covers plain JSON documents.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Format::Json,
            _ => Format::Yaml,
        }
    }

    /// Parse document text. Blank text and a bare `null` document become an
    /// empty map.
    pub fn parse(self, content: &str) -> Result<Node, FileError> {
        self.parse_from(Path::new(BUFFER_PATH), content)
    }

    fn parse_from(self, path: &Path, content: &str) -> Result<Node, FileError> {
        if content.trim().is_empty() {
            return Ok(Node::empty_map());
        }

        let parsed = match self {
            Format::Yaml => serde_yaml::from_str::<Node>(content).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str::<Node>(content).map_err(|e| e.to_string()),
        };

        match parsed {
            Ok(node) if node.is_null() => Ok(Node::empty_map()),
            Ok(node) => Ok(node),
            Err(message) => Err(FileError::Parse {
                path: path.to_path_buf(),
                format: self,
                message,
            }),
        }
    }

    pub fn render(self, node: &Node) -> Result<String, FileError> {
        match self {
            Format::Yaml => serde_yaml::to_string(node).map_err(|e| FileError::Serialize {
                format: self,
                message: e.to_string(),
            }),
            Format::Json => {
                let mut text =
                    serde_json::to_string_pretty(node).map_err(|e| FileError::Serialize {
                        format: self,
                        message: e.to_string(),
                    })?;
                text.push('\n');
                Ok(text)
            }
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Yaml => f.write_str("yaml"),
            Format::Json => f.write_str("json"),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown document format '{other}' (expected yaml or json)")),
        }
    }
}

/// A document read from disk together with the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    /// Raw file content, `None` when the file does not exist.
    pub content: Option<String>,
    pub document: Node,
}

impl LoadedDocument {
    pub fn exists(&self) -> bool {
        self.content.is_some()
    }
}

/// Load a document from disk.
///
/// A missing file is not an error: it yields an empty map, so a changeset can
/// create a document from scratch.
pub fn load_document(path: &Path, format: Format) -> Result<LoadedDocument, FileError> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let document = format.parse_from(path, &content)?;
            Ok(LoadedDocument {
                content: Some(content),
                document,
            })
        }
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "file does not exist, starting from an empty document");
            Ok(LoadedDocument {
                content: None,
                document: Node::empty_map(),
            })
        }
        Err(source) => Err(FileError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Copy `path` to `<name>.<pid>.<unix-seconds>~` in the same directory.
pub fn create_backup(path: &Path) -> Result<PathBuf, FileError> {
    let backup_error = |source: io::Error| FileError::Backup {
        path: path.to_path_buf(),
        source,
    };

    let file_name = path.file_name().ok_or_else(|| {
        backup_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "path has no file name",
        ))
    })?;

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();

    let mut backup_name = file_name.to_os_string();
    backup_name.push(format!(".{}.{}~", std::process::id(), stamp));
    let destination = path.with_file_name(backup_name);

    fs::copy(path, &destination).map_err(backup_error)?;
    tracing::info!(
        path = %path.display(),
        backup = %destination.display(),
        "backup created"
    );
    Ok(destination)
}

/// Atomic file write: tempfile + fsync + rename.
///
/// The replacement keeps the permissions of the file it replaces.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), FileError> {
    let write_error = |source: io::Error| FileError::Write {
        path: path.to_path_buf(),
        source,
    };

    // A bare file name has an empty parent; the tempfile must still land
    // on the same filesystem as the target.
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(write_error)?;
    temp.write_all(content).map_err(write_error)?;

    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(write_error)?;
    }

    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;

    tracing::info!(path = %path.display(), bytes = content.len(), "document written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a/b.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a/b.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a/b.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a/b.yml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("noext")), Format::Yaml);
    }

    #[test]
    fn format_from_str() {
        assert_eq!("YAML".parse::<Format>().unwrap(), Format::Yaml);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert!("xml".parse::<Format>().is_err());
    }

    #[test]
    fn format_deserializes_yml_alias() {
        #[derive(serde::Deserialize)]
        struct Holder {
            format: Format,
        }
        let holder: Holder = toml_edit::de::from_str("format = \"yml\"").unwrap();
        assert_eq!(holder.format, Format::Yaml);
    }

    #[test]
    fn non_string_keys_and_large_integers_round_trip() {
        let text = "ports:\n  '8080': http\nbig: 18446744073709551615\n";
        let doc = Format::Yaml.parse("ports:\n  8080: http\nbig: 18446744073709551615\n").unwrap();
        assert_eq!(Format::Yaml.render(&doc).unwrap(), text);
        assert_eq!(Format::Yaml.parse(text).unwrap(), doc);
    }

    #[test]
    fn blank_and_null_documents_are_empty_maps() {
        assert_eq!(Format::Yaml.parse("").unwrap(), Node::empty_map());
        assert_eq!(Format::Yaml.parse("  \n").unwrap(), Node::empty_map());
        assert_eq!(Format::Yaml.parse("~\n").unwrap(), Node::empty_map());
        assert_eq!(Format::Json.parse("null").unwrap(), Node::empty_map());
    }

    #[test]
    fn parse_error_names_the_source() {
        let err = Format::Json.parse("{not json").unwrap_err();
        assert!(matches!(err, FileError::Parse { format: Format::Json, .. }));
        assert!(err.to_string().contains("<buffer>"));
    }

    #[test]
    fn missing_file_loads_as_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_document(&dir.path().join("absent.yaml"), Format::Yaml).unwrap();
        assert!(!loaded.exists());
        assert_eq!(loaded.document, Node::empty_map());
    }

    #[test]
    fn existing_file_keeps_raw_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.yaml");
        fs::write(&path, "# comment\na: 1\n").unwrap();

        let loaded = load_document(&path, Format::Yaml).unwrap();
        assert_eq!(loaded.content.as_deref(), Some("# comment\na: 1\n"));
        assert_eq!(loaded.document.get("a"), Some(&Node::from(1)));
    }

    #[test]
    fn unreadable_document_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "[1, 2").unwrap();

        let err = load_document(&path, Format::Json).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn yaml_render_and_reload() {
        let doc: Node = serde_json::from_str(r#"{"a": {"b": ["x", "5"]}}"#).unwrap();
        let text = Format::Yaml.render(&doc).unwrap();
        assert_eq!(text, "a:\n  b:\n  - x\n  - '5'\n");
        assert_eq!(Format::Yaml.parse(&text).unwrap(), doc);
    }

    #[test]
    fn json_render_ends_with_newline() {
        let doc: Node = serde_json::from_str(r#"{"a": 1}"#).unwrap();
        assert_eq!(Format::Json.render(&doc).unwrap(), "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.yaml");
        fs::write(&path, "old: 1\n").unwrap();

        write_atomic(&path, b"new: 2\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new: 2\n");
    }

    #[test]
    fn backup_copies_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.yaml");
        fs::write(&path, "keep: me\n").unwrap();

        let backup = create_backup(&path).unwrap();
        assert_ne!(backup, path);
        assert_eq!(backup.parent(), path.parent());
        assert!(backup.to_string_lossy().ends_with('~'));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "keep: me\n");
    }

    #[test]
    fn backup_of_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_backup(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, FileError::Backup { .. }));
    }
}
