//! Named keys and the recorded-name lookup table

use serde::{Deserialize, Serialize};

/// Keys the driver can press by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Space,
    Enter,
    Backspace,
    Tab,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Delete,
    Shift,
    Ctrl,
    Alt,
    Home,
    End,
    PageUp,
    PageDown,
    CapsLock,
    Meta,
    F(u8),
}

impl Key {
    /// Name written into recorded `keystroke` actions.
    pub fn name(&self) -> String {
        match self {
            Key::Space => "space".into(),
            Key::Enter => "enter".into(),
            Key::Backspace => "backspace".into(),
            Key::Tab => "tab".into(),
            Key::Escape => "esc".into(),
            Key::Up => "up".into(),
            Key::Down => "down".into(),
            Key::Left => "left".into(),
            Key::Right => "right".into(),
            Key::Delete => "delete".into(),
            Key::Shift => "shift".into(),
            Key::Ctrl => "ctrl".into(),
            Key::Alt => "alt".into(),
            Key::Home => "home".into(),
            Key::End => "end".into(),
            Key::PageUp => "page_up".into(),
            Key::PageDown => "page_down".into(),
            Key::CapsLock => "caps_lock".into(),
            Key::Meta => "cmd".into(),
            Key::F(n) => format!("f{}", n),
        }
    }

    pub fn is_modifier(&self) -> bool {
        matches!(self, Key::Shift | Key::Ctrl | Key::Alt)
    }

    /// Windows virtual key code.
    pub fn vk(&self) -> u16 {
        match self {
            Key::Backspace => vk::BACKSPACE,
            Key::Tab => vk::TAB,
            Key::Enter => vk::RETURN,
            Key::Shift => vk::SHIFT,
            Key::Ctrl => vk::CONTROL,
            Key::Alt => vk::ALT,
            Key::CapsLock => vk::CAPS_LOCK,
            Key::Escape => vk::ESCAPE,
            Key::Space => vk::SPACE,
            Key::PageUp => vk::PAGE_UP,
            Key::PageDown => vk::PAGE_DOWN,
            Key::End => vk::END,
            Key::Home => vk::HOME,
            Key::Left => vk::LEFT,
            Key::Up => vk::UP,
            Key::Right => vk::RIGHT,
            Key::Down => vk::DOWN,
            Key::Delete => vk::DELETE,
            Key::Meta => vk::LWIN,
            Key::F(n) => vk::F1 + (*n).clamp(1, 24) as u16 - 1,
        }
    }
}

/// Fixed playback table: recorded key name to driver key.
///
/// Accepts the legacy `Key.` prefix. Names outside the table return `None`
/// and are skipped by the player.
pub fn playback_key(name: &str) -> Option<Key> {
    let name = name.trim().trim_start_matches("Key.");
    match name.to_lowercase().as_str() {
        "space" => Some(Key::Space),
        "enter" => Some(Key::Enter),
        "backspace" => Some(Key::Backspace),
        "tab" => Some(Key::Tab),
        "esc" => Some(Key::Escape),
        "up" => Some(Key::Up),
        "down" => Some(Key::Down),
        "left" => Some(Key::Left),
        "right" => Some(Key::Right),
        "delete" => Some(Key::Delete),
        "shift" => Some(Key::Shift),
        "ctrl" => Some(Key::Ctrl),
        "alt" => Some(Key::Alt),
        "home" => Some(Key::Home),
        "end" => Some(Key::End),
        "page_up" => Some(Key::PageUp),
        "page_down" => Some(Key::PageDown),
        _ => None,
    }
}

/// Parses `ctrl+<letter>` keystroke names into the letter.
pub fn ctrl_combo(name: &str) -> Option<char> {
    let rest = name.trim().strip_prefix("ctrl+")?;
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

/// Common virtual key codes
pub mod vk {
    pub const BACKSPACE: u16 = 0x08;
    pub const TAB: u16 = 0x09;
    pub const RETURN: u16 = 0x0D;
    pub const SHIFT: u16 = 0x10;
    pub const CONTROL: u16 = 0x11;
    pub const ALT: u16 = 0x12;
    pub const CAPS_LOCK: u16 = 0x14;
    pub const ESCAPE: u16 = 0x1B;
    pub const SPACE: u16 = 0x20;
    pub const PAGE_UP: u16 = 0x21;
    pub const PAGE_DOWN: u16 = 0x22;
    pub const END: u16 = 0x23;
    pub const HOME: u16 = 0x24;
    pub const LEFT: u16 = 0x25;
    pub const UP: u16 = 0x26;
    pub const RIGHT: u16 = 0x27;
    pub const DOWN: u16 = 0x28;
    pub const DELETE: u16 = 0x2E;

    // Letters A-Z are 0x41-0x5A
    pub const A: u16 = 0x41;
    pub const C: u16 = 0x43;
    pub const V: u16 = 0x56;
    pub const X: u16 = 0x58;

    pub const F1: u16 = 0x70;

    pub const LWIN: u16 = 0x5B;

    /// Virtual key code of an ASCII letter or digit.
    pub fn of_char(c: char) -> Option<u16> {
        let c = c.to_ascii_uppercase();
        if c.is_ascii_uppercase() || c.is_ascii_digit() {
            Some(c as u16)
        } else {
            None
        }
    }
}
