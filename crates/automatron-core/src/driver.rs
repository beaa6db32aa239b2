//! The input driver capability consumed by playback
//!
//! Platform drivers live in [`crate::platform`]. [`DryRunDriver`] performs no
//! OS input at all: it tracks the cursor and records every call, which is
//! what `--dry-run` and the tests use.

use crate::keys::Key;
use crate::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Screen coordinate in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        let dx = other.x as f64 - self.x as f64;
        let dy = other.y as f64 - self.y as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Mouse button, serialized as `left` / `right` / `middle` / `button<N>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
    Other(u8),
}

impl MouseButton {
    pub fn is_primary(&self) -> bool {
        *self == MouseButton::Left
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => f.write_str("left"),
            MouseButton::Right => f.write_str("right"),
            MouseButton::Middle => f.write_str("middle"),
            MouseButton::Other(id) => write!(f, "button{}", id),
        }
    }
}

impl FromStr for MouseButton {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Older recordings wrote the listener's debug name, e.g. "Button.right"
        let name = s.trim().trim_start_matches("Button.").to_lowercase();
        match name.as_str() {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            other => other
                .strip_prefix("button")
                .unwrap_or(other)
                .parse::<u8>()
                .map(MouseButton::Other)
                .map_err(|_| Error::config(format!("Unknown mouse button: {}", s))),
        }
    }
}

impl TryFrom<String> for MouseButton {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<MouseButton> for String {
    fn from(b: MouseButton) -> Self {
        b.to_string()
    }
}

/// OS-level cursor/key/scroll injection and screen lookup.
///
/// Scroll amounts are signed pixels, positive scrolls up, one wheel notch is
/// [`PIXELS_PER_NOTCH`] pixels.
pub trait InputDriver {
    fn cursor_position(&mut self) -> Result<Point>;

    /// Move through each point in turn, spending `per_point` on each.
    fn move_cursor_along(&mut self, points: &[Point], per_point: Duration) -> Result<()>;

    fn click(&mut self, button: MouseButton) -> Result<()>;

    fn mouse_down(&mut self) -> Result<()>;

    fn mouse_up(&mut self) -> Result<()>;

    fn press_key(&mut self, key: Key) -> Result<()>;

    fn type_char(&mut self, c: char) -> Result<()>;

    fn scroll_by(&mut self, amount_px: i32) -> Result<()>;

    fn hotkey(&mut self, modifier: Key, key: char) -> Result<()>;

    /// Center of the best on-screen match of the image, if any.
    fn locate_image(&mut self, _path: &Path, _confidence: f64) -> Result<Option<Point>> {
        Ok(None)
    }
}

/// Pixel distance of one mouse wheel notch.
pub const PIXELS_PER_NOTCH: i32 = 50;

/// Converts pixel scroll amounts into whole device wheel units, keeping the
/// sub-unit remainder for the next call so a run of small steps adds up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollCarry {
    /// Pending amount in wheel units times [`PIXELS_PER_NOTCH`]
    pending: i64,
}

impl ScrollCarry {
    pub const fn new() -> Self {
        Self { pending: 0 }
    }

    /// Whole wheel units to send for `amount_px`, where one notch is
    /// `units_per_notch` device units.
    pub fn units(&mut self, amount_px: i32, units_per_notch: i32) -> i32 {
        let per_notch = i64::from(PIXELS_PER_NOTCH);
        self.pending = self
            .pending
            .saturating_add(i64::from(amount_px) * i64::from(units_per_notch));
        let whole = (self.pending / per_notch).clamp(i64::from(i32::MIN), i64::from(i32::MAX));
        self.pending -= whole * per_notch;
        whole as i32
    }
}

impl<D: InputDriver + ?Sized> InputDriver for Box<D> {
    fn cursor_position(&mut self) -> Result<Point> {
        (**self).cursor_position()
    }
    fn move_cursor_along(&mut self, points: &[Point], per_point: Duration) -> Result<()> {
        (**self).move_cursor_along(points, per_point)
    }
    fn click(&mut self, button: MouseButton) -> Result<()> {
        (**self).click(button)
    }
    fn mouse_down(&mut self) -> Result<()> {
        (**self).mouse_down()
    }
    fn mouse_up(&mut self) -> Result<()> {
        (**self).mouse_up()
    }
    fn press_key(&mut self, key: Key) -> Result<()> {
        (**self).press_key(key)
    }
    fn type_char(&mut self, c: char) -> Result<()> {
        (**self).type_char(c)
    }
    fn scroll_by(&mut self, amount_px: i32) -> Result<()> {
        (**self).scroll_by(amount_px)
    }
    fn hotkey(&mut self, modifier: Key, key: char) -> Result<()> {
        (**self).hotkey(modifier, key)
    }
    fn locate_image(&mut self, path: &Path, confidence: f64) -> Result<Option<Point>> {
        (**self).locate_image(path, confidence)
    }
}

// ============================================================================
// Dry run
// ============================================================================

/// One call observed by [`DryRunDriver`].
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    MoveAlong { to: Point, points: usize },
    Click(MouseButton),
    MouseDown,
    MouseUp,
    PressKey(Key),
    TypeChar(char),
    Scroll(i32),
    Hotkey(Key, char),
    LocateImage { path: PathBuf, confidence: f64 },
}

/// Shared view of the calls a [`DryRunDriver`] received.
#[derive(Debug, Clone, Default)]
pub struct DriverLog(Arc<Mutex<Vec<DriverCall>>>);

impl DriverLog {
    pub fn calls(&self) -> Vec<DriverCall> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Sum of all scroll amounts, in order of emission.
    pub fn scroll_amounts(&self) -> Vec<i32> {
        self.0
            .lock()
            .iter()
            .filter_map(|c| match c {
                DriverCall::Scroll(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: DriverCall) {
        tracing::debug!(?call, "dry-run driver");
        self.0.lock().push(call);
    }
}

/// Driver that injects nothing and records every call.
#[derive(Debug, Default)]
pub struct DryRunDriver {
    cursor: Point,
    log: DriverLog,
    images: HashMap<PathBuf, Point>,
}

impl DryRunDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(cursor: Point) -> Self {
        Self {
            cursor,
            ..Self::default()
        }
    }

    /// Make `locate_image` report a match for `path` at `center`.
    pub fn with_image(mut self, path: impl Into<PathBuf>, center: Point) -> Self {
        self.images.insert(path.into(), center);
        self
    }

    pub fn log(&self) -> DriverLog {
        self.log.clone()
    }
}

impl InputDriver for DryRunDriver {
    fn cursor_position(&mut self) -> Result<Point> {
        Ok(self.cursor)
    }

    fn move_cursor_along(&mut self, points: &[Point], _per_point: Duration) -> Result<()> {
        if let Some(last) = points.last() {
            self.cursor = *last;
            self.log.push(DriverCall::MoveAlong {
                to: *last,
                points: points.len(),
            });
        }
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> Result<()> {
        self.log.push(DriverCall::Click(button));
        Ok(())
    }

    fn mouse_down(&mut self) -> Result<()> {
        self.log.push(DriverCall::MouseDown);
        Ok(())
    }

    fn mouse_up(&mut self) -> Result<()> {
        self.log.push(DriverCall::MouseUp);
        Ok(())
    }

    fn press_key(&mut self, key: Key) -> Result<()> {
        self.log.push(DriverCall::PressKey(key));
        Ok(())
    }

    fn type_char(&mut self, c: char) -> Result<()> {
        self.log.push(DriverCall::TypeChar(c));
        Ok(())
    }

    fn scroll_by(&mut self, amount_px: i32) -> Result<()> {
        self.log.push(DriverCall::Scroll(amount_px));
        Ok(())
    }

    fn hotkey(&mut self, modifier: Key, key: char) -> Result<()> {
        self.log.push(DriverCall::Hotkey(modifier, key));
        Ok(())
    }

    fn locate_image(&mut self, path: &Path, confidence: f64) -> Result<Option<Point>> {
        self.log.push(DriverCall::LocateImage {
            path: path.to_path_buf(),
            confidence,
        });
        Ok(self.images.get(path).copied())
    }
}
