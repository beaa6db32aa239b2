//! Sequence and chain files - pretty JSON

use crate::chain::{ChainConfig, ChainItem, Playbook};
use crate::sequence::Sequence;
use automatron_core::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Directory recordings are kept in when no path is given.
pub const DEFAULT_DIR: &str = "sequences";

pub struct SequenceStore {
    dir: PathBuf,
}

impl SequenceStore {
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_DIR)
    }

    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// `<dir>/<name>.json`, with the name sanitized.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let stem = name.strip_suffix(".json").unwrap_or(name);
        self.dir.join(format!("{}.json", sanitize(stem)))
    }

    /// Read a sequence file. Only the envelope is checked: the file must be a
    /// JSON object with an `actions` array.
    pub fn load(path: impl AsRef<Path>) -> Result<Sequence> {
        let (shown, value) = read_json(path.as_ref())?;
        let sequence = sequence_from_value(&shown, value)?;
        tracing::info!(path = %shown, actions = sequence.len(), "Loaded sequence");
        Ok(sequence)
    }

    /// Write a sequence, creating parent directories and replacing any existing file.
    pub fn save(sequence: &Sequence, path: impl AsRef<Path>) -> Result<()> {
        write_json(sequence, path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), actions = sequence.len(), "Saved sequence");
        Ok(())
    }

    /// Read a chain file: a JSON array of chain items.
    pub fn load_chain(path: impl AsRef<Path>) -> Result<ChainConfig> {
        let (shown, value) = read_json(path.as_ref())?;
        let chain = chain_from_value(&shown, value)?;
        tracing::info!(path = %shown, items = chain.items.len(), "Loaded chain");
        Ok(chain)
    }

    /// Read a file that holds either a chain (a JSON array) or a sequence.
    pub fn load_playbook(path: impl AsRef<Path>) -> Result<Playbook> {
        let (shown, value) = read_json(path.as_ref())?;
        if value.is_array() {
            let chain = chain_from_value(&shown, value)?;
            tracing::info!(path = %shown, items = chain.items.len(), "Loaded chain");
            Ok(Playbook::Chain(chain))
        } else {
            let sequence = sequence_from_value(&shown, value)?;
            tracing::info!(path = %shown, actions = sequence.len(), "Loaded sequence");
            Ok(Playbook::Sequence(sequence))
        }
    }

    pub fn save_chain(chain: &ChainConfig, path: impl AsRef<Path>) -> Result<()> {
        write_json(chain, path.as_ref())
    }

    /// Sequence files in the store directory, sorted by name.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Default for SequenceStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read_json(path: &Path) -> Result<(String, Value)> {
    let shown = path.display().to_string();
    let content = fs::read_to_string(path)
        .map_err(|e| Error::from(e).with_context(serde_json::json!({ "path": shown })))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| Error::format(&shown, &format!("not valid JSON: {}", e)))?;
    Ok((shown, value))
}

fn sequence_from_value(shown: &str, value: Value) -> Result<Sequence> {
    match value.get("actions") {
        Some(Value::Array(_)) => {}
        Some(_) => return Err(Error::format(shown, "`actions` is not an array")),
        None if value.is_object() => return Err(Error::format(shown, "missing `actions`")),
        None => return Err(Error::format(shown, "not a JSON object")),
    }
    serde_json::from_value(value)
        .map_err(|e| Error::format(shown, &format!("invalid metadata: {}", e)))
}

fn chain_from_value(shown: &str, value: Value) -> Result<ChainConfig> {
    let Value::Array(entries) = value else {
        return Err(Error::format(shown, "chain must be a JSON array"));
    };

    let mut items = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        let item: ChainItem = serde_json::from_value(entry)
            .map_err(|e| Error::format(shown, &format!("item {}: {}", i + 1, e)))?;
        item.validate()
            .map_err(|reason| Error::format(shown, &format!("item {}: {}", i + 1, reason)))?;
        items.push(item);
    }
    Ok(ChainConfig { items })
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, value)
        .map_err(|e| Error::new(automatron_core::ErrorCode::Io, e.to_string()))?;
    writeln!(w)?;
    w.flush()?;
    Ok(())
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Action, ActionKind};
    use crate::sequence::{ActionEntry, SequenceMetadata};
    use automatron_core::{ErrorCode, MouseButton};

    fn sample() -> Sequence {
        Sequence::new(
            SequenceMetadata {
                session_id: "abcd1234".into(),
                total_actions: 2,
                ..SequenceMetadata::default()
            },
            vec![
                Action::new(ActionKind::click(10, 10, MouseButton::Left)),
                Action::new(ActionKind::TypeString { text: "hello".into() }).with_delay(0.8),
            ],
        )
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/seq.json");

        SequenceStore::save(&sample(), &path).unwrap();
        let loaded = SequenceStore::load(&path).unwrap();

        assert_eq!(loaded, sample());
    }

    #[test]
    fn save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seq.json");
        SequenceStore::save(&sample(), &path).unwrap();
        SequenceStore::save(&Sequence::default(), &path).unwrap();
        assert!(SequenceStore::load(&path).unwrap().is_empty());
    }

    #[test]
    fn missing_actions_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");

        for content in [r#"{"metadata": {}}"#, r#"{"actions": {}}"#, "[1, 2]", "not json"] {
            fs::write(&path, content).unwrap();
            let err = SequenceStore::load(&path).unwrap_err();
            assert_eq!(err.code, ErrorCode::Format, "{}", content);
        }
    }

    #[test]
    fn incomplete_actions_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{"actions": [{"type": "click"}, {"type": "keystroke", "key": "enter"}]}"#)
            .unwrap();

        let seq = SequenceStore::load(&path).unwrap();
        assert_eq!(seq.len(), 2);
        assert!(matches!(seq.actions[0], ActionEntry::Malformed { .. }));
    }

    #[test]
    fn missing_file_is_io() {
        let err = SequenceStore::load("/definitely/not/here.json").unwrap_err();
        assert_eq!(err.code, ErrorCode::Io);
    }

    #[test]
    fn chain_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");

        fs::write(&path, r#"[{"sequence_file": "a.json"}, {"sequence_file": "b.json", "loop_count": 3, "extra_delay": 0.5}]"#).unwrap();
        let chain = SequenceStore::load_chain(&path).unwrap();
        assert_eq!(chain.items.len(), 2);
        assert_eq!(chain.items[0].loop_count, 1);
        assert_eq!(chain.items[0].extra_delay, 1.0);
        assert_eq!(chain.items[1].loop_count, 3);

        for bad in [
            r#"{"sequence_file": "a.json"}"#,
            r#"[{"sequence_file": "a.json", "loop_count": 0}]"#,
            r#"[{"sequence_file": "a.json", "extra_delay": -1}]"#,
            r#"[{"loop_count": 2}]"#,
        ] {
            fs::write(&path, bad).unwrap();
            let err = SequenceStore::load_chain(&path).unwrap_err();
            assert_eq!(err.code, ErrorCode::Format, "{}", bad);
        }
    }

    #[test]
    fn chain_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        let chain = ChainConfig {
            items: vec![ChainItem::new("one.json").loops(2).delay(3.0)],
        };
        SequenceStore::save_chain(&chain, &path).unwrap();
        assert_eq!(SequenceStore::load_chain(&path).unwrap(), chain);
    }

    #[test]
    fn playbook_is_a_chain_or_a_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let seq_path = dir.path().join("setup.json");
        let chain_path = dir.path().join("setup_chain.json");
        SequenceStore::save(&sample(), &seq_path).unwrap();
        fs::write(&chain_path, r#"[{"sequence_file": "setup.json", "loop_count": 2}]"#).unwrap();

        assert_eq!(
            SequenceStore::load_playbook(&seq_path).unwrap(),
            Playbook::Sequence(sample())
        );
        match SequenceStore::load_playbook(&chain_path).unwrap() {
            Playbook::Chain(chain) => assert_eq!(chain.items[0].loop_count, 2),
            other => panic!("expected chain, got {:?}", other),
        }

        fs::write(&chain_path, r#"[{"loop_count": 2}]"#).unwrap();
        let err = SequenceStore::load_playbook(&chain_path).unwrap_err();
        assert_eq!(err.code, ErrorCode::Format);
    }

    #[test]
    fn list_and_path_for() {
        let dir = tempfile::tempdir().unwrap();
        let store = SequenceStore::with_dir(dir.path());
        assert_eq!(store.path_for("log in/out"), dir.path().join("log_in_out.json"));

        SequenceStore::save(&sample(), store.path_for("b")).unwrap();
        SequenceStore::save(&sample(), store.path_for("a")).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let names: Vec<_> = store
            .list()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.json", "b.json"]);
    }
}
