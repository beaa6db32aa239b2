//! Sequence envelope: metadata plus the ordered action list

use crate::actions::{Action, ActionKind, ClipboardOp};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DESKTOP_ONLY: &str = "desktop_only";

/// A finished recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(default)]
    pub metadata: SequenceMetadata,
    pub actions: Vec<ActionEntry>,
}

impl Sequence {
    pub fn new(metadata: SequenceMetadata, actions: Vec<Action>) -> Self {
        Self {
            metadata,
            actions: actions.into_iter().map(ActionEntry::Valid).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions that parsed, in order.
    pub fn valid_actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter_map(ActionEntry::as_action)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, alias = "actions_count")]
    pub total_actions: usize,
    #[serde(default, alias = "duration")]
    pub duration_sec: f64,
    #[serde(default = "default_mode", alias = "config", deserialize_with = "mode_or_config")]
    pub mode: String,
    /// Anything else found in the file, written back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SequenceMetadata {
    fn default() -> Self {
        Self {
            session_id: String::new(),
            created_at: String::new(),
            total_actions: 0,
            duration_sec: 0.0,
            mode: default_mode(),
            extra: Map::new(),
        }
    }
}

fn default_mode() -> String {
    DESKTOP_ONLY.to_string()
}

/// Accepts `"mode": "desktop_only"` and the legacy `"config": {"mode": ...}`.
fn mode_or_config<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::String(s) => s,
        Value::Object(map) => map
            .get("mode")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(default_mode),
        _ => default_mode(),
    })
}

/// One element of the `actions` array.
///
/// Loading never fails on individual actions: entries that do not parse are
/// kept verbatim and only rejected when playback reaches them.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEntry {
    Valid(Action),
    /// `"type"` is missing or not one this build knows; skipped on replay
    Unknown { type_name: Option<String>, raw: Value },
    /// Known `"type"` but missing or invalid fields
    Malformed { reason: String, raw: Value },
}

impl ActionEntry {
    pub fn as_action(&self) -> Option<&Action> {
        match self {
            ActionEntry::Valid(a) => Some(a),
            _ => None,
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        match self {
            ActionEntry::Valid(a) => Some(a.name()),
            ActionEntry::Unknown { type_name, .. } => type_name.as_deref(),
            ActionEntry::Malformed { raw, .. } => raw.get("type").and_then(Value::as_str),
        }
    }

    pub fn from_value(raw: Value) -> Self {
        let type_name = raw.get("type").and_then(Value::as_str).map(str::to_string);

        let Some(name) = type_name.as_deref() else {
            return ActionEntry::Unknown { type_name, raw };
        };

        if let Some(op) = ClipboardOp::from_type_name(name) {
            return match serde_json::from_value::<Action>(clipboard_shim(&raw, op)) {
                Ok(action) => ActionEntry::Valid(action),
                Err(e) => ActionEntry::Malformed {
                    reason: e.to_string(),
                    raw,
                },
            };
        }

        if !ActionKind::TYPE_NAMES.contains(&name) {
            return ActionEntry::Unknown { type_name, raw };
        }

        match serde_json::from_value::<Action>(raw.clone()) {
            Ok(action) => ActionEntry::Valid(action),
            Err(e) => ActionEntry::Malformed {
                reason: e.to_string(),
                raw,
            },
        }
    }
}

fn clipboard_shim(raw: &Value, op: ClipboardOp) -> Value {
    let mut obj = raw.as_object().cloned().unwrap_or_default();
    obj.insert("type".into(), Value::from("clipboard"));
    obj.insert("operation".into(), Value::from(op.to_string()));
    Value::Object(obj)
}

impl From<Action> for ActionEntry {
    fn from(a: Action) -> Self {
        ActionEntry::Valid(a)
    }
}

impl Serialize for ActionEntry {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            ActionEntry::Valid(a) => a.serialize(s),
            ActionEntry::Unknown { raw, .. } | ActionEntry::Malformed { raw, .. } => raw.serialize(s),
        }
    }
}

impl<'de> Deserialize<'de> for ActionEntry {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Value::deserialize(d).map(ActionEntry::from_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_metadata_aliases() {
        let meta: SequenceMetadata = serde_json::from_value(json!({
            "session_id": "a1b2c3d4",
            "created_at": "2024-05-01 10:00:00",
            "actions_count": 3,
            "duration": 4.5,
            "config": {"mode": "desktop_only"},
            "recorder": "legacy"
        }))
        .unwrap();

        assert_eq!(meta.total_actions, 3);
        assert_eq!(meta.duration_sec, 4.5);
        assert_eq!(meta.mode, "desktop_only");
        assert_eq!(meta.extra["recorder"], "legacy");
    }

    #[test]
    fn entries_are_classified_lazily() {
        let seq: Sequence = serde_json::from_value(json!({
            "actions": [
                {"type": "type_string", "text": "hi"},
                {"type": "click"},
                {"type": "hover", "coordinates": {"x": 1, "y": 1}},
                {"type": "paste", "delay_before": 0.3},
                {"text": "no type"}
            ]
        }))
        .unwrap();

        assert_eq!(seq.len(), 5);
        assert!(matches!(seq.actions[0], ActionEntry::Valid(_)));
        assert!(matches!(seq.actions[1], ActionEntry::Malformed { .. }));
        assert!(matches!(
            &seq.actions[2],
            ActionEntry::Unknown { type_name: Some(t), .. } if t == "hover"
        ));
        match &seq.actions[3] {
            ActionEntry::Valid(a) => {
                assert_eq!(a.kind, ActionKind::Clipboard { operation: ClipboardOp::Paste });
                assert_eq!(a.delay_before, Some(0.3));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(seq.actions[4], ActionEntry::Unknown { type_name: None, .. }));
    }

    #[test]
    fn unparsed_entries_round_trip_verbatim() {
        let raw = json!({"type": "hover", "target": "#menu"});
        let entry = ActionEntry::from_value(raw.clone());
        assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
    }

    #[test]
    fn missing_metadata_defaults() {
        let seq: Sequence = serde_json::from_value(json!({"actions": []})).unwrap();
        assert_eq!(seq.metadata.mode, DESKTOP_ONLY);
        assert!(seq.is_empty());
    }
}
