//! Recorded action types
//!
//! Actions serialize as flat JSON objects with a `"type"` discriminator,
//! matching the sequence files written by earlier recorders.

use automatron_core::driver::PIXELS_PER_NOTCH;
use automatron_core::{MouseButton, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One replayable unit of user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Seconds since the previous recorded action. Absent on the first one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_before: Option<f64>,
    /// Minimum seconds between the last replayed click and this action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_after_click: Option<f64>,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            delay_before: None,
            delay_after_click: None,
            kind,
        }
    }

    pub fn with_delay(mut self, secs: f64) -> Self {
        self.delay_before = Some(secs);
        self
    }

    pub fn with_delay_after_click(mut self, secs: f64) -> Self {
        self.delay_after_click = Some(secs);
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    Click {
        coordinates: Point,
        #[serde(default)]
        button: MouseButton,
        /// Reference image for visual re-targeting
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<PathBuf>,
    },
    TypeString {
        text: String,
    },
    Keystroke {
        key: String,
    },
    Scroll(ScrollAction),
    Clipboard {
        operation: ClipboardOp,
    },
    DragStart {
        coordinates: Point,
    },
    DragEnd {
        coordinates: Point,
    },
    DragDrop {
        from: Point,
        to: Point,
    },
}

impl ActionKind {
    pub fn click(x: i32, y: i32, button: MouseButton) -> Self {
        ActionKind::Click {
            coordinates: Point::new(x, y),
            button,
            image: None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Click { .. } => "click",
            ActionKind::TypeString { .. } => "type_string",
            ActionKind::Keystroke { .. } => "keystroke",
            ActionKind::Scroll(_) => "scroll",
            ActionKind::Clipboard { .. } => "clipboard",
            ActionKind::DragStart { .. } => "drag_start",
            ActionKind::DragEnd { .. } => "drag_end",
            ActionKind::DragDrop { .. } => "drag_drop",
        }
    }

    /// Every `"type"` value this enum accepts.
    pub const TYPE_NAMES: [&'static str; 8] = [
        "click",
        "type_string",
        "keystroke",
        "scroll",
        "clipboard",
        "drag_start",
        "drag_end",
        "drag_drop",
    ];
}

/// One scroll burst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollAction {
    /// Signed pixels, positive is up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_delta: Option<i32>,
    /// Per-tick delta written by the legacy recorder, in wheel notches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Point>,
    #[serde(default = "one")]
    pub steps: u32,
    #[serde(default)]
    pub duration_sec: f64,
    #[serde(default, alias = "coordinates", skip_serializing_if = "Option::is_none")]
    pub start: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<ScrollDirection>,
    /// Cumulative scroll position before and after this burst
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_position: Option<i64>,
}

fn one() -> u32 {
    1
}

impl ScrollAction {
    pub fn new(total_delta: i32, steps: u32, duration_sec: f64) -> Self {
        Self {
            total_delta: Some(total_delta),
            delta: None,
            steps,
            duration_sec,
            start: None,
            end: None,
            direction: Some(ScrollDirection::of(total_delta)),
            start_position: None,
            final_position: None,
        }
    }

    /// Pixels to scroll: `total_delta`, falling back to the legacy `delta.y`
    /// converted from notches.
    pub fn effective_delta(&self) -> i32 {
        match self.total_delta {
            Some(total) if total != 0 => total,
            _ => self
                .delta
                .map(|d| d.y.saturating_mul(PIXELS_PER_NOTCH))
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn of(delta: i32) -> Self {
        if delta > 0 {
            ScrollDirection::Up
        } else {
            ScrollDirection::Down
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardOp {
    #[serde(alias = "c")]
    Copy,
    #[serde(alias = "v")]
    Paste,
    #[serde(alias = "x")]
    Cut,
    #[serde(alias = "a")]
    SelectAll,
}

impl ClipboardOp {
    /// Letter pressed together with ctrl.
    pub fn letter(&self) -> char {
        match self {
            ClipboardOp::Copy => 'c',
            ClipboardOp::Paste => 'v',
            ClipboardOp::Cut => 'x',
            ClipboardOp::SelectAll => 'a',
        }
    }

    /// Legacy files used the operation itself as the action type.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "copy" => Some(ClipboardOp::Copy),
            "paste" => Some(ClipboardOp::Paste),
            "cut" => Some(ClipboardOp::Cut),
            "select_all" => Some(ClipboardOp::SelectAll),
            _ => None,
        }
    }
}

impl fmt::Display for ClipboardOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClipboardOp::Copy => "copy",
            ClipboardOp::Paste => "paste",
            ClipboardOp::Cut => "cut",
            ClipboardOp::SelectAll => "select_all",
        };
        f.write_str(s)
    }
}
