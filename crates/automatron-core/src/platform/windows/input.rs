//! Windows input injection
//!
//! Uses SendInput for keyboard and mouse events.

use std::path::Path;
use std::time::Duration;

use windows::Win32::Foundation::POINT;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
    MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP,
    MOUSEEVENTF_WHEEL, MOUSEEVENTF_XDOWN, MOUSEEVENTF_XUP, MOUSEINPUT, MOUSE_EVENT_FLAGS,
    VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{GetCursorPos, SetCursorPos};

use crate::driver::{InputDriver, MouseButton, Point, ScrollCarry};
use crate::keys::{vk, Key};
use crate::{Error, Result};

const WHEEL_DELTA: i32 = 120;

/// [`InputDriver`] over `SendInput` / `SetCursorPos`.
#[derive(Debug, Default)]
pub struct SendInputDriver {
    wheel: ScrollCarry,
}

impl SendInputDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputDriver for SendInputDriver {
    fn cursor_position(&mut self) -> Result<Point> {
        let mut p = POINT::default();
        unsafe {
            GetCursorPos(&mut p).map_err(|e| Error::driver("GetCursorPos", format!("{:?}", e)))?;
        }
        Ok(Point::new(p.x, p.y))
    }

    fn move_cursor_along(&mut self, points: &[Point], per_point: Duration) -> Result<()> {
        for p in points {
            move_mouse(p.x, p.y)?;
            std::thread::sleep(per_point);
        }
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> Result<()> {
        let (down, up, data) = button_flags(button)?;
        send_inputs(&[
            make_mouse_input(down, 0, 0, data),
            make_mouse_input(up, 0, 0, data),
        ])
    }

    fn mouse_down(&mut self) -> Result<()> {
        send_inputs(&[make_mouse_input(MOUSEEVENTF_LEFTDOWN, 0, 0, 0)])
    }

    fn mouse_up(&mut self) -> Result<()> {
        send_inputs(&[make_mouse_input(MOUSEEVENTF_LEFTUP, 0, 0, 0)])
    }

    fn press_key(&mut self, key: Key) -> Result<()> {
        let code = key.vk();
        send_inputs(&[make_key_input(code, false), make_key_input(code, true)])
    }

    fn type_char(&mut self, c: char) -> Result<()> {
        let mut units = [0u16; 2];
        let mut inputs = Vec::new();
        for &unit in c.encode_utf16(&mut units).iter() {
            inputs.push(make_unicode_input(unit, false));
            inputs.push(make_unicode_input(unit, true));
        }
        send_inputs(&inputs)
    }

    /// Positive pixels scroll up.
    fn scroll_by(&mut self, amount_px: i32) -> Result<()> {
        let data = self.wheel.units(amount_px, WHEEL_DELTA);
        if data == 0 {
            return Ok(());
        }
        send_inputs(&[make_mouse_input(MOUSEEVENTF_WHEEL, 0, 0, data)])
    }

    fn hotkey(&mut self, modifier: Key, key: char) -> Result<()> {
        let code = vk::of_char(key)
            .ok_or_else(|| Error::unsupported(format!("No virtual key for '{}'", key)))?;
        shortcut(code, &[modifier.vk()])
    }

    fn locate_image(&mut self, _path: &Path, _confidence: f64) -> Result<Option<Point>> {
        Ok(None)
    }
}

fn move_mouse(x: i32, y: i32) -> Result<()> {
    unsafe {
        SetCursorPos(x, y).map_err(|e| Error::transient(format!("Failed to move mouse: {:?}", e)))?;
    }
    Ok(())
}

fn button_flags(button: MouseButton) -> Result<(MOUSE_EVENT_FLAGS, MOUSE_EVENT_FLAGS, i32)> {
    match button {
        MouseButton::Left => Ok((MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, 0)),
        MouseButton::Right => Ok((MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, 0)),
        MouseButton::Middle => Ok((MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, 0)),
        // XBUTTON1 / XBUTTON2
        MouseButton::Other(4) | MouseButton::Other(8) => Ok((MOUSEEVENTF_XDOWN, MOUSEEVENTF_XUP, 1)),
        MouseButton::Other(5) | MouseButton::Other(9) => Ok((MOUSEEVENTF_XDOWN, MOUSEEVENTF_XUP, 2)),
        MouseButton::Other(id) => Err(Error::unsupported(format!("Mouse button {} cannot be injected", id))),
    }
}

fn shortcut(key: u16, modifiers: &[u16]) -> Result<()> {
    let mut inputs = Vec::new();

    for &modifier in modifiers {
        inputs.push(make_key_input(modifier, false));
    }

    inputs.push(make_key_input(key, false));
    inputs.push(make_key_input(key, true));

    // Release modifiers in reverse order
    for &modifier in modifiers.iter().rev() {
        inputs.push(make_key_input(modifier, true));
    }

    send_inputs(&inputs)
}

fn make_mouse_input(flags: MOUSE_EVENT_FLAGS, dx: i32, dy: i32, data: i32) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: data as u32,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn make_key_input(code: u16, key_up: bool) -> INPUT {
    let flags = if key_up { KEYEVENTF_KEYUP } else { KEYBD_EVENT_FLAGS(0) };

    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(code),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn make_unicode_input(unit: u16, key_up: bool) -> INPUT {
    let mut flags = KEYEVENTF_UNICODE;
    if key_up {
        flags |= KEYEVENTF_KEYUP;
    }

    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(0),
                wScan: unit,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

/// Short writes are reported as transient.
fn send_inputs(inputs: &[INPUT]) -> Result<()> {
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };

    if sent as usize != inputs.len() {
        return Err(Error::transient(format!(
            "SendInput failed: sent {} of {} inputs",
            sent,
            inputs.len()
        )));
    }

    Ok(())
}
