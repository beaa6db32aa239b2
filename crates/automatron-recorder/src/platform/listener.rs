//! Global input hook over rdev

use crate::capture::{EventSender, RawEvent, RawKey};
use automatron_core::keys::Key;
use automatron_core::{Error, MouseButton, Result};
use rdev::{listen, Button, Event, EventType};
use std::sync::atomic::{AtomicI32, Ordering};
use std::thread;

pub(crate) fn spawn(sender: EventSender) -> Result<()> {
    thread::Builder::new()
        .name("automatron-listener".into())
        .spawn(move || run(sender))
        .map(|_| ())
        .map_err(|e| Error::driver("Spawn listener thread", e))
}

fn run(sender: EventSender) {
    // Button and wheel events carry no position, so track the last move
    let mouse_x = AtomicI32::new(0);
    let mouse_y = AtomicI32::new(0);
    let stop_sender = sender.clone();

    let callback = move |event: Event| {
        if !sender.is_running() {
            return;
        }
        let x = || mouse_x.load(Ordering::Relaxed);
        let y = || mouse_y.load(Ordering::Relaxed);

        let raw = match event.event_type {
            EventType::MouseMove { x: mx, y: my } => {
                mouse_x.store(mx as i32, Ordering::Relaxed);
                mouse_y.store(my as i32, Ordering::Relaxed);
                RawEvent::Move { x: mx as i32, y: my as i32 }
            }
            EventType::ButtonPress(b) => RawEvent::ButtonPress { x: x(), y: y(), button: button(b) },
            EventType::ButtonRelease(b) => RawEvent::ButtonRelease { x: x(), y: y(), button: button(b) },
            EventType::Wheel { delta_x, delta_y } => RawEvent::Scroll {
                x: x(),
                y: y(),
                dx: delta_x as f64,
                dy: delta_y as f64,
            },
            EventType::KeyPress(k) => RawEvent::KeyPress(raw_key(k, event.name.as_deref())),
            EventType::KeyRelease(k) => RawEvent::KeyRelease(raw_key(k, None)),
        };
        sender.send(raw);
    };

    tracing::info!("Input listener running");
    if let Err(e) = listen(callback) {
        tracing::error!(error = ?e, "Input listener failed");
        stop_sender.send(RawEvent::Stop);
    }
}

fn button(b: Button) -> MouseButton {
    match b {
        Button::Left => MouseButton::Left,
        Button::Right => MouseButton::Right,
        Button::Middle => MouseButton::Middle,
        Button::Unknown(id) => MouseButton::Other(id),
    }
}

fn raw_key(key: rdev::Key, name: Option<&str>) -> RawKey {
    if let Some(named) = named_key(key) {
        return RawKey::Named(named);
    }
    let code = virtual_code(key);

    let mut chars = name.unwrap_or_default().chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return RawKey::Char { ch, code };
    }

    match (key, code) {
        (rdev::Key::Space, _) => RawKey::Named(Key::Space),
        (rdev::Key::Unknown(code), _) => RawKey::Code(code),
        (_, Some(code)) => RawKey::Code(code),
        (other, None) => RawKey::Other(format!("{:?}", other).to_lowercase()),
    }
}

fn named_key(key: rdev::Key) -> Option<Key> {
    use rdev::Key as K;
    Some(match key {
        K::ShiftLeft | K::ShiftRight => Key::Shift,
        K::ControlLeft | K::ControlRight => Key::Ctrl,
        K::Alt | K::AltGr => Key::Alt,
        K::MetaLeft | K::MetaRight => Key::Meta,
        K::Return | K::KpReturn => Key::Enter,
        K::Escape => Key::Escape,
        K::Tab => Key::Tab,
        K::Backspace => Key::Backspace,
        K::Delete | K::KpDelete => Key::Delete,
        K::UpArrow => Key::Up,
        K::DownArrow => Key::Down,
        K::LeftArrow => Key::Left,
        K::RightArrow => Key::Right,
        K::Home => Key::Home,
        K::End => Key::End,
        K::PageUp => Key::PageUp,
        K::PageDown => Key::PageDown,
        K::CapsLock => Key::CapsLock,
        K::F1 => Key::F(1),
        K::F2 => Key::F(2),
        K::F3 => Key::F(3),
        K::F4 => Key::F(4),
        K::F5 => Key::F(5),
        K::F6 => Key::F(6),
        K::F7 => Key::F(7),
        K::F8 => Key::F(8),
        K::F9 => Key::F(9),
        K::F10 => Key::F(10),
        K::F11 => Key::F(11),
        K::F12 => Key::F(12),
        _ => return None,
    })
}

/// Windows virtual key code for letter and digit keys.
fn virtual_code(key: rdev::Key) -> Option<u32> {
    use rdev::Key as K;
    let c = match key {
        K::KeyA => 'A',
        K::KeyB => 'B',
        K::KeyC => 'C',
        K::KeyD => 'D',
        K::KeyE => 'E',
        K::KeyF => 'F',
        K::KeyG => 'G',
        K::KeyH => 'H',
        K::KeyI => 'I',
        K::KeyJ => 'J',
        K::KeyK => 'K',
        K::KeyL => 'L',
        K::KeyM => 'M',
        K::KeyN => 'N',
        K::KeyO => 'O',
        K::KeyP => 'P',
        K::KeyQ => 'Q',
        K::KeyR => 'R',
        K::KeyS => 'S',
        K::KeyT => 'T',
        K::KeyU => 'U',
        K::KeyV => 'V',
        K::KeyW => 'W',
        K::KeyX => 'X',
        K::KeyY => 'Y',
        K::KeyZ => 'Z',
        K::Num0 => '0',
        K::Num1 => '1',
        K::Num2 => '2',
        K::Num3 => '3',
        K::Num4 => '4',
        K::Num5 => '5',
        K::Num6 => '6',
        K::Num7 => '7',
        K::Num8 => '8',
        K::Num9 => '9',
        _ => return None,
    };
    Some(c as u32)
}
