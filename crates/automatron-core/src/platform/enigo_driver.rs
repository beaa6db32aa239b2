//! macOS / Linux input through enigo

use std::time::Duration;

use enigo::{Axis, Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};

use crate::driver::{InputDriver, MouseButton, Point, ScrollCarry};
use crate::keys::Key;
use crate::{Error, Result};

pub struct EnigoDriver {
    enigo: Enigo,
    notches: ScrollCarry,
}

impl EnigoDriver {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| Error::driver("Connect to input backend", e))?;
        Ok(Self {
            enigo,
            notches: ScrollCarry::new(),
        })
    }
}

impl InputDriver for EnigoDriver {
    fn cursor_position(&mut self) -> Result<Point> {
        let (x, y) = self
            .enigo
            .location()
            .map_err(|e| Error::driver("Read cursor position", e))?;
        Ok(Point::new(x, y))
    }

    fn move_cursor_along(&mut self, points: &[Point], per_point: Duration) -> Result<()> {
        for p in points {
            self.enigo
                .move_mouse(p.x, p.y, Coordinate::Abs)
                .map_err(|e| Error::transient(format!("Move mouse failed: {}", e)))?;
            std::thread::sleep(per_point);
        }
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> Result<()> {
        let button = to_enigo_button(button)?;
        self.enigo
            .button(button, Direction::Click)
            .map_err(|e| Error::transient(format!("Click failed: {}", e)))
    }

    fn mouse_down(&mut self) -> Result<()> {
        self.enigo
            .button(Button::Left, Direction::Press)
            .map_err(|e| Error::transient(format!("Mouse down failed: {}", e)))
    }

    fn mouse_up(&mut self) -> Result<()> {
        self.enigo
            .button(Button::Left, Direction::Release)
            .map_err(|e| Error::transient(format!("Mouse up failed: {}", e)))
    }

    fn press_key(&mut self, key: Key) -> Result<()> {
        let key = to_enigo_key(key)?;
        self.enigo
            .key(key, Direction::Click)
            .map_err(|e| Error::transient(format!("Key press failed: {}", e)))
    }

    fn type_char(&mut self, c: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.enigo
            .text(c.encode_utf8(&mut buf))
            .map_err(|e| Error::transient(format!("Typing failed: {}", e)))
    }

    /// enigo scrolls down for positive lengths, so the sign is flipped.
    fn scroll_by(&mut self, amount_px: i32) -> Result<()> {
        let notches = self.notches.units(amount_px, 1);
        if notches == 0 {
            return Ok(());
        }
        self.enigo
            .scroll(notches.saturating_neg(), Axis::Vertical)
            .map_err(|e| Error::transient(format!("Scroll failed: {}", e)))
    }

    fn hotkey(&mut self, modifier: Key, key: char) -> Result<()> {
        let modifier = to_enigo_key(modifier)?;
        let press = |enigo: &mut Enigo| -> std::result::Result<(), enigo::InputError> {
            enigo.key(modifier, Direction::Press)?;
            enigo.key(enigo::Key::Unicode(key), Direction::Click)?;
            enigo.key(modifier, Direction::Release)
        };
        press(&mut self.enigo).map_err(|e| Error::transient(format!("Hotkey failed: {}", e)))
    }
}

fn to_enigo_button(button: MouseButton) -> Result<Button> {
    match button {
        MouseButton::Left => Ok(Button::Left),
        MouseButton::Right => Ok(Button::Right),
        MouseButton::Middle => Ok(Button::Middle),
        MouseButton::Other(id) => Err(Error::unsupported(format!(
            "Mouse button {} cannot be injected",
            id
        ))),
    }
}

fn to_enigo_key(key: Key) -> Result<enigo::Key> {
    use enigo::Key as K;
    Ok(match key {
        Key::Space => K::Space,
        Key::Enter => K::Return,
        Key::Backspace => K::Backspace,
        Key::Tab => K::Tab,
        Key::Escape => K::Escape,
        Key::Up => K::UpArrow,
        Key::Down => K::DownArrow,
        Key::Left => K::LeftArrow,
        Key::Right => K::RightArrow,
        Key::Delete => K::Delete,
        Key::Shift => K::Shift,
        Key::Ctrl => K::Control,
        Key::Alt => K::Alt,
        Key::Home => K::Home,
        Key::End => K::End,
        Key::PageUp => K::PageUp,
        Key::PageDown => K::PageDown,
        Key::CapsLock => K::CapsLock,
        Key::Meta => K::Meta,
        Key::F(1) => K::F1,
        Key::F(2) => K::F2,
        Key::F(3) => K::F3,
        Key::F(4) => K::F4,
        Key::F(5) => K::F5,
        Key::F(6) => K::F6,
        Key::F(7) => K::F7,
        Key::F(8) => K::F8,
        Key::F(9) => K::F9,
        Key::F(10) => K::F10,
        Key::F(11) => K::F11,
        Key::F(12) => K::F12,
        Key::F(n) => return Err(Error::unsupported(format!("Function key F{}", n))),
    })
}
