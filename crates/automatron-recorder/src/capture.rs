//! Turns raw input events into recorded actions
//!
//! Listener threads push [`TimedEvent`]s into one bounded channel; a single
//! aggregator thread owns the [`EventCapture`] state machine, so events from
//! the pointer and keyboard sources are applied in delivery order.

use crate::actions::{Action, ActionKind, ClipboardOp, ScrollAction, ScrollDirection};
use crate::config::CaptureConfig;
use crate::sequence::{Sequence, SequenceMetadata, DESKTOP_ONLY};
use automatron_core::keys::{vk, Key};
use automatron_core::{Error, MouseButton, Point, Result};
pub use crossbeam_channel::{Receiver, Sender};
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// ============================================================================
// Raw events
// ============================================================================

/// A raw event stamped with the time since the session started.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    pub at: Duration,
    pub event: RawEvent,
}

impl TimedEvent {
    pub fn new(at: Duration, event: RawEvent) -> Self {
        Self { at, event }
    }

    pub fn at_secs(secs: f64, event: RawEvent) -> Self {
        Self::new(Duration::from_secs_f64(secs), event)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    ButtonPress { x: i32, y: i32, button: MouseButton },
    ButtonRelease { x: i32, y: i32, button: MouseButton },
    Move { x: i32, y: i32 },
    /// Wheel ticks, `dy > 0` is up
    Scroll { x: i32, y: i32, dx: f64, dy: f64 },
    KeyPress(RawKey),
    KeyRelease(RawKey),
    Stop,
}

/// A key as reported by a listener.
#[derive(Debug, Clone, PartialEq)]
pub enum RawKey {
    /// Key that produced a character, plus its virtual key code when known
    Char { ch: char, code: Option<u32> },
    Named(Key),
    /// Named key with no [`Key`] counterpart, e.g. `insert`
    Other(String),
    /// Only the virtual key code is known
    Code(u32),
}

impl RawKey {
    pub fn char(ch: char) -> Self {
        RawKey::Char { ch, code: None }
    }

    /// Name as written into a `keystroke` action.
    pub fn name(&self) -> String {
        match self {
            RawKey::Char { ch, .. } => control_char_name(*ch).unwrap_or_else(|| ch.to_string()),
            RawKey::Named(k) => k.name(),
            RawKey::Other(name) => name.clone(),
            RawKey::Code(code) => format!("<{}>", code),
        }
    }

    fn modifier(&self) -> Option<Key> {
        match self {
            RawKey::Named(k) if k.is_modifier() => Some(*k),
            _ => None,
        }
    }
}

/// Keystroke name for an ASCII control character.
fn control_char_name(ch: char) -> Option<String> {
    let code = ch as u32;
    let name = match code {
        8 => "backspace".to_string(),
        9 => "tab".to_string(),
        10 | 13 => "enter".to_string(),
        27 => "esc".to_string(),
        127 => "delete".to_string(),
        1..=26 => format!("ctrl+{}", char::from(b'a' + (code as u8) - 1)),
        0 | 28..=31 => format!("ctrl+{}", char::from(b'@' + code as u8)),
        _ => return None,
    };
    Some(name)
}

fn is_control(ch: char) -> bool {
    (ch as u32) < 32 || ch as u32 == 127
}

/// Clipboard operation for a key pressed while ctrl is held.
fn clipboard_op(key: &RawKey) -> Option<ClipboardOp> {
    let by_char = |ch: char| match ch as u32 {
        3 => Some(ClipboardOp::Copy),
        24 => Some(ClipboardOp::Cut),
        22 => Some(ClipboardOp::Paste),
        1 => Some(ClipboardOp::SelectAll),
        _ => None,
    };
    let by_code = |code: u32| match u16::try_from(code).ok()? {
        vk::C => Some(ClipboardOp::Copy),
        vk::X => Some(ClipboardOp::Cut),
        vk::V => Some(ClipboardOp::Paste),
        vk::A => Some(ClipboardOp::SelectAll),
        _ => None,
    };
    match key {
        RawKey::Char { ch, code } => by_char(*ch).or_else(|| code.and_then(by_code)),
        RawKey::Code(code) => by_code(*code),
        _ => None,
    }
}

// ============================================================================
// Capture state
// ============================================================================

#[derive(Debug, Default)]
struct Modifiers {
    ctrl: bool,
    shift: bool,
    alt: bool,
}

impl Modifiers {
    fn set(&mut self, key: Key, down: bool) {
        match key {
            Key::Ctrl => self.ctrl = down,
            Key::Shift => self.shift = down,
            Key::Alt => self.alt = down,
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
struct TextBuffer {
    chars: String,
    first_at: Option<Duration>,
}

impl TextBuffer {
    fn push(&mut self, c: char, at: Duration) {
        if self.chars.is_empty() {
            self.first_at = Some(at);
        }
        self.chars.push(c);
    }

    fn flush(&mut self) -> Option<(Duration, String)> {
        if self.chars.is_empty() {
            return None;
        }
        let at = self.first_at.take().unwrap_or_default();
        Some((at, std::mem::take(&mut self.chars)))
    }
}

#[derive(Debug)]
struct ScrollBurst {
    total: i32,
    steps: u32,
    first_at: Duration,
    last_at: Duration,
    start: Point,
    end: Point,
}

impl ScrollBurst {
    fn new(at: Duration, pos: Point, delta: i32) -> Self {
        Self {
            total: delta,
            steps: 1,
            first_at: at,
            last_at: at,
            start: pos,
            end: pos,
        }
    }

    fn accepts(&self, at: Duration, delta: i32, timeout: Duration) -> bool {
        at.saturating_sub(self.last_at) <= timeout && (delta > 0) == (self.total > 0)
    }

    fn extend(&mut self, at: Duration, pos: Point, delta: i32) {
        self.total = self.total.saturating_add(delta);
        self.steps = self.steps.saturating_add(1);
        self.last_at = at;
        self.end = pos;
    }

    fn into_action(self, final_position: i64) -> ScrollAction {
        ScrollAction {
            total_delta: Some(self.total),
            delta: None,
            steps: self.steps,
            duration_sec: (self.last_at - self.first_at).as_secs_f64(),
            start: Some(self.start),
            end: Some(self.end),
            direction: Some(ScrollDirection::of(self.total)),
            start_position: Some(final_position.saturating_sub(i64::from(self.total))),
            final_position: Some(final_position),
        }
    }
}

/// Working memory of one recording. Never persisted.
#[derive(Debug, Default)]
struct CaptureState {
    modifiers: Modifiers,
    text: TextBuffer,
    pending_button: Option<MouseButton>,
    drag_anchor: Option<Point>,
    burst: Option<ScrollBurst>,
    /// Cumulative scroll position in pixels
    scroll_position: i64,
}

/// Capture state machine: feed it events, then `finish()` into a [`Sequence`].
#[derive(Debug)]
pub struct EventCapture {
    config: CaptureConfig,
    state: CaptureState,
    actions: Vec<Action>,
    last_action_at: Option<Duration>,
    last_event_at: Duration,
    stopped: bool,
}

impl EventCapture {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            state: CaptureState::default(),
            actions: Vec::new(),
            last_action_at: None,
            last_event_at: Duration::ZERO,
            stopped: false,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Actions emitted so far; pending text and scroll are not included.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Apply one event. Returns `false` once capture has stopped.
    pub fn handle(&mut self, ev: TimedEvent) -> bool {
        if self.stopped {
            return false;
        }
        let at = ev.at.max(self.last_event_at);
        self.last_event_at = at;

        match ev.event {
            RawEvent::ButtonPress { x, y, button } => self.on_press(x, y, button),
            RawEvent::ButtonRelease { x, y, button } => self.on_release(at, x, y, button),
            RawEvent::Move { .. } => {}
            RawEvent::Scroll { x, y, dy, .. } => self.on_scroll(at, x, y, dy),
            RawEvent::KeyPress(key) => self.on_key_press(at, key),
            RawEvent::KeyRelease(key) => {
                if let Some(m) = key.modifier() {
                    self.state.modifiers.set(m, false);
                }
            }
            RawEvent::Stop => self.stop(),
        }
        !self.stopped
    }

    /// Flush everything pending and build the sequence.
    pub fn finish(mut self) -> Sequence {
        self.close_pending();
        let session_id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        let duration_sec = (self.last_event_at.as_secs_f64() * 100.0).round() / 100.0;
        let metadata = SequenceMetadata {
            session_id,
            created_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            total_actions: self.actions.len(),
            duration_sec,
            mode: DESKTOP_ONLY.to_string(),
            extra: Default::default(),
        };
        tracing::info!(
            session_id = %metadata.session_id,
            actions = metadata.total_actions,
            duration_sec,
            "Recording finished"
        );
        Sequence::new(metadata, self.actions)
    }

    fn stop(&mut self) {
        self.close_pending();
        self.stopped = true;
        tracing::debug!("Capture stopped");
    }

    fn is_stop_key(&self, key: &RawKey) -> bool {
        key.name().eq_ignore_ascii_case(self.config.stop_key.trim())
    }

    // ------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------

    fn push(&mut self, at: Duration, kind: ActionKind) {
        let mut action = Action::new(kind);
        if let Some(prev) = self.last_action_at {
            action.delay_before = Some(at.saturating_sub(prev).as_secs_f64());
        }
        self.last_action_at = Some(at.max(self.last_action_at.unwrap_or_default()));
        tracing::debug!(index = self.actions.len(), action = action.name(), "Recorded");
        self.actions.push(action);
    }

    fn flush_text(&mut self) {
        if let Some((at, text)) = self.state.text.flush() {
            self.push(at, ActionKind::TypeString { text });
        }
    }

    fn finalize_burst(&mut self) {
        if let Some(burst) = self.state.burst.take() {
            let at = burst.first_at;
            let scroll = burst.into_action(self.state.scroll_position);
            self.push(at, ActionKind::Scroll(scroll));
        }
    }

    /// At most one of pending text and an open burst exists at a time.
    fn close_pending(&mut self) {
        self.flush_text();
        self.finalize_burst();
    }

    fn emit(&mut self, at: Duration, kind: ActionKind) {
        self.close_pending();
        self.push(at, kind);
    }

    // ------------------------------------------------------------------
    // Pointer
    // ------------------------------------------------------------------

    fn on_press(&mut self, x: i32, y: i32, button: MouseButton) {
        if self.state.pending_button.is_some() {
            return;
        }
        self.state.pending_button = Some(button);
        if button.is_primary() {
            self.state.drag_anchor = Some(Point::new(x, y));
        }
    }

    fn on_release(&mut self, at: Duration, x: i32, y: i32, button: MouseButton) {
        if self.state.pending_button != Some(button) {
            return;
        }
        self.state.pending_button = None;
        let to = Point::new(x, y);

        let kind = match self.state.drag_anchor.take() {
            Some(from) if button.is_primary() && from.distance(to) > self.config.drag_threshold => {
                ActionKind::DragDrop { from, to }
            }
            _ => ActionKind::click(x, y, button),
        };
        self.emit(at, kind);
    }

    fn on_scroll(&mut self, at: Duration, x: i32, y: i32, dy: f64) {
        let pixels = (dy * self.config.notch_pixels).trunc() as i32;
        if pixels.saturating_abs() < self.config.scroll_epsilon || pixels == 0 {
            return;
        }
        self.flush_text();

        let pos = Point::new(x, y);
        let timeout = Duration::from_millis(self.config.scroll_timeout_ms);
        match self.state.burst.as_mut() {
            Some(burst) if burst.accepts(at, pixels, timeout) => burst.extend(at, pos, pixels),
            _ => {
                self.finalize_burst();
                self.state.burst = Some(ScrollBurst::new(at, pos, pixels));
            }
        }
        self.state.scroll_position = self.state.scroll_position.saturating_add(i64::from(pixels));
    }

    // ------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------

    fn on_key_press(&mut self, at: Duration, key: RawKey) {
        let m = &self.state.modifiers;
        tracing::trace!(key = %key.name(), ctrl = m.ctrl, shift = m.shift, alt = m.alt, "Key press");

        if self.is_stop_key(&key) {
            self.stop();
            return;
        }
        if let Some(m) = key.modifier() {
            self.state.modifiers.set(m, true);
            return;
        }

        if self.state.modifiers.ctrl {
            if let Some(operation) = clipboard_op(&key) {
                self.emit(at, ActionKind::Clipboard { operation });
                return;
            }
            if let RawKey::Char { ch, .. } = key {
                if ch.is_ascii_alphanumeric() {
                    let key = format!("ctrl+{}", ch.to_ascii_lowercase());
                    self.emit(at, ActionKind::Keystroke { key });
                    return;
                }
            }
        }

        match key {
            RawKey::Char { ch, .. } if !is_control(ch) => {
                self.finalize_burst();
                self.state.text.push(ch, at);
            }
            other => {
                let key = other.name();
                self.emit(at, ActionKind::Keystroke { key });
            }
        }
    }
}

// ============================================================================
// Session: channel + aggregator thread
// ============================================================================

/// Cloneable handle listeners use to submit events.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<TimedEvent>,
    start: Instant,
    stop: Arc<AtomicBool>,
}

impl EventSender {
    /// Stamp `event` with the session time and submit it. Blocks while the
    /// channel is full so no event is dropped.
    pub fn send(&self, event: RawEvent) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return false;
        }
        let at = self.start.elapsed();
        self.tx.send(TimedEvent { at, event }).is_ok()
    }

    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::Relaxed)
    }
}

/// Recording session - owns the aggregator thread
pub struct CaptureSession {
    sender: EventSender,
    stop: Arc<AtomicBool>,
    aggregator: thread::JoinHandle<Sequence>,
}

impl CaptureSession {
    pub fn start(config: CaptureConfig) -> Result<Self> {
        config.validate()?;
        let (tx, rx) = bounded::<TimedEvent>(config.channel_capacity);
        let stop = Arc::new(AtomicBool::new(false));

        let stop_agg = stop.clone();
        let aggregator = thread::Builder::new()
            .name("automatron-capture".into())
            .spawn(move || run_aggregator(rx, stop_agg, config))
            .map_err(|e| Error::driver("Spawn capture thread", e))?;

        tracing::info!("Capture session started");
        Ok(Self {
            sender: EventSender {
                tx,
                start: Instant::now(),
                stop: stop.clone(),
            },
            stop,
            aggregator,
        })
    }

    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Ask the aggregator to stop, as if the stop key had been pressed.
    pub fn stop(&self) {
        let _ = self.sender.tx.send(TimedEvent {
            at: self.sender.start.elapsed(),
            event: RawEvent::Stop,
        });
    }

    /// Block until capture stops, then return the recording.
    pub fn wait(self) -> Result<Sequence> {
        drop(self.sender);
        self.aggregator
            .join()
            .map_err(|_| Error::driver("Capture thread", "panicked"))
    }
}

fn run_aggregator(rx: Receiver<TimedEvent>, stop: Arc<AtomicBool>, config: CaptureConfig) -> Sequence {
    let mut capture = EventCapture::new(config);
    for ev in rx.iter() {
        if !capture.handle(ev) {
            break;
        }
    }
    stop.store(true, Ordering::SeqCst);
    capture.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(at: f64, key: RawKey) -> TimedEvent {
        TimedEvent::at_secs(at, RawEvent::KeyPress(key))
    }

    fn release(at: f64, key: RawKey) -> TimedEvent {
        TimedEvent::at_secs(at, RawEvent::KeyRelease(key))
    }

    fn tick(at: f64, dy: f64) -> TimedEvent {
        TimedEvent::at_secs(at, RawEvent::Scroll { x: 400, y: 300, dx: 0.0, dy })
    }

    fn mouse(at: f64, down: bool, x: i32, y: i32, button: MouseButton) -> TimedEvent {
        let event = if down {
            RawEvent::ButtonPress { x, y, button }
        } else {
            RawEvent::ButtonRelease { x, y, button }
        };
        TimedEvent::at_secs(at, event)
    }

    fn capture(events: Vec<TimedEvent>) -> Vec<ActionKind> {
        capture_with(CaptureConfig::default(), events)
    }

    fn capture_with(config: CaptureConfig, events: Vec<TimedEvent>) -> Vec<ActionKind> {
        let mut cap = EventCapture::new(config);
        for ev in events {
            cap.handle(ev);
        }
        cap.finish()
            .valid_actions()
            .map(|a| a.kind.clone())
            .collect()
    }

    fn scroll_totals(kinds: &[ActionKind]) -> Vec<(i32, u32)> {
        kinds
            .iter()
            .filter_map(|k| match k {
                ActionKind::Scroll(s) => Some((s.total_delta.unwrap_or(0), s.steps)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn printable_keys_coalesce_into_one_string() {
        let kinds = capture(vec![
            press(0.0, RawKey::char('a')),
            press(0.1, RawKey::char('b')),
            press(0.2, RawKey::char('c')),
            TimedEvent::at_secs(0.5, RawEvent::Stop),
        ]);
        assert_eq!(kinds, vec![ActionKind::TypeString { text: "abc".into() }]);
    }

    #[test]
    fn control_key_splits_text() {
        let kinds = capture(vec![
            press(0.0, RawKey::char('h')),
            press(0.1, RawKey::char('i')),
            press(0.2, RawKey::Named(Key::Enter)),
            press(0.3, RawKey::char('x')),
            press(0.4, RawKey::Named(Key::Escape)),
        ]);
        assert_eq!(
            kinds,
            vec![
                ActionKind::TypeString { text: "hi".into() },
                ActionKind::Keystroke { key: "enter".into() },
                ActionKind::TypeString { text: "x".into() },
            ]
        );
    }

    #[test]
    fn same_sign_ticks_form_one_burst() {
        let kinds = capture(vec![
            tick(0.0, 1.0),
            tick(0.1, 1.0),
            tick(0.2, 1.0),
            tick(0.3, -1.0),
            TimedEvent::at_secs(1.0, RawEvent::Stop),
        ]);
        assert_eq!(scroll_totals(&kinds), vec![(150, 3), (-50, 1)]);
    }

    #[test]
    fn burst_sums_raw_pixel_ticks() {
        let config = CaptureConfig {
            notch_pixels: 1.0,
            scroll_epsilon: 0,
            ..CaptureConfig::default()
        };
        let kinds = capture_with(
            config,
            vec![tick(0.0, 2.0), tick(0.1, 3.0), tick(0.2, 4.0), tick(0.25, -1.0)],
        );
        assert_eq!(scroll_totals(&kinds), vec![(9, 3), (-1, 1)]);
    }

    #[test]
    fn burst_times_out() {
        let kinds = capture(vec![tick(0.0, -1.0), tick(0.2, -1.0), tick(0.6, -1.0)]);
        assert_eq!(scroll_totals(&kinds), vec![(-100, 2), (-50, 1)]);
    }

    #[test]
    fn tiny_ticks_are_discarded() {
        let kinds = capture(vec![tick(0.0, 0.05), tick(0.1, -0.09)]);
        assert!(kinds.is_empty());
    }

    #[test]
    fn burst_records_span_and_positions() {
        let mut cap = EventCapture::new(CaptureConfig::default());
        cap.handle(TimedEvent::at_secs(0.0, RawEvent::Scroll { x: 10, y: 10, dx: 0.0, dy: -1.0 }));
        cap.handle(TimedEvent::at_secs(0.25, RawEvent::Scroll { x: 12, y: 14, dx: 0.0, dy: -1.0 }));
        let seq = cap.finish();
        let ActionKind::Scroll(s) = &seq.valid_actions().next().unwrap().kind else {
            panic!("expected scroll");
        };
        assert_eq!(s.start, Some(Point::new(10, 10)));
        assert_eq!(s.end, Some(Point::new(12, 14)));
        assert!((s.duration_sec - 0.25).abs() < 1e-9);
        assert_eq!(s.direction, Some(ScrollDirection::Down));
        assert_eq!(s.start_position, Some(0));
        assert_eq!(s.final_position, Some(-100));
    }

    #[test]
    fn short_move_is_click_long_move_is_drag() {
        let left = MouseButton::Left;
        let kinds = capture(vec![
            mouse(0.0, true, 100, 100, left),
            mouse(0.1, false, 105, 103, left),
            mouse(1.0, true, 100, 100, left),
            mouse(1.2, false, 100, 120, left),
        ]);
        assert_eq!(
            kinds,
            vec![
                ActionKind::click(105, 103, left),
                ActionKind::DragDrop {
                    from: Point::new(100, 100),
                    to: Point::new(100, 120),
                },
            ]
        );
    }

    #[test]
    fn secondary_buttons_always_click() {
        let right = MouseButton::Right;
        let kinds = capture(vec![
            mouse(0.0, true, 0, 0, right),
            mouse(0.1, false, 300, 300, right),
        ]);
        assert_eq!(kinds, vec![ActionKind::click(300, 300, right)]);
    }

    #[test]
    fn overlapping_buttons_track_the_first() {
        let kinds = capture(vec![
            mouse(0.0, true, 10, 10, MouseButton::Left),
            mouse(0.1, true, 10, 10, MouseButton::Right),
            mouse(0.2, false, 10, 10, MouseButton::Right),
            mouse(0.3, false, 11, 11, MouseButton::Left),
        ]);
        assert_eq!(kinds, vec![ActionKind::click(11, 11, MouseButton::Left)]);
    }

    #[test]
    fn ctrl_combos_become_clipboard_actions() {
        let ctrl = RawKey::Named(Key::Ctrl);
        let kinds = capture(vec![
            press(0.0, RawKey::char('a')),
            press(0.1, ctrl.clone()),
            press(0.2, RawKey::char('\u{3}')),
            press(0.3, RawKey::Code(vk::V as u32)),
            press(0.4, RawKey::Char { ch: 'x', code: Some(vk::X as u32) }),
            press(0.5, RawKey::char('\u{1}')),
            press(0.6, RawKey::char('s')),
            release(0.7, ctrl),
            press(0.8, RawKey::char('v')),
        ]);
        assert_eq!(
            kinds,
            vec![
                ActionKind::TypeString { text: "a".into() },
                ActionKind::Clipboard { operation: ClipboardOp::Copy },
                ActionKind::Clipboard { operation: ClipboardOp::Paste },
                ActionKind::Clipboard { operation: ClipboardOp::Cut },
                ActionKind::Clipboard { operation: ClipboardOp::SelectAll },
                ActionKind::Keystroke { key: "ctrl+s".into() },
                ActionKind::TypeString { text: "v".into() },
            ]
        );
    }

    #[test]
    fn control_characters_map_to_keystrokes() {
        let names: Vec<String> = ['\u{8}', '\t', '\r', '\n', '\u{7f}', '\u{13}']
            .into_iter()
            .map(|c| RawKey::char(c).name())
            .collect();
        assert_eq!(names, ["backspace", "tab", "enter", "enter", "delete", "ctrl+s"]);
    }

    #[test]
    fn stop_key_ends_capture_and_flushes() {
        let mut cap = EventCapture::new(CaptureConfig::default());
        cap.handle(press(0.0, RawKey::char('o')));
        cap.handle(press(0.1, RawKey::char('k')));
        assert!(!cap.handle(press(0.2, RawKey::Named(Key::Escape))));
        assert!(!cap.handle(press(0.3, RawKey::char('z'))));
        assert!(cap.is_stopped());

        let seq = cap.finish();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.metadata.total_actions, 1);
        assert_eq!(seq.metadata.mode, DESKTOP_ONLY);
        assert_eq!(seq.metadata.session_id.len(), 8);
    }

    #[test]
    fn custom_stop_key() {
        let config = CaptureConfig {
            stop_key: "f9".into(),
            ..CaptureConfig::default()
        };
        let kinds = capture_with(
            config,
            vec![press(0.0, RawKey::Named(Key::Escape)), press(0.1, RawKey::Named(Key::F(9)))],
        );
        assert_eq!(kinds, vec![ActionKind::Keystroke { key: "esc".into() }]);
    }

    #[test]
    fn delays_are_gaps_between_actions() {
        let mut cap = EventCapture::new(CaptureConfig::default());
        cap.handle(mouse(1.0, true, 5, 5, MouseButton::Left));
        cap.handle(mouse(1.5, false, 5, 5, MouseButton::Left));
        cap.handle(press(2.0, RawKey::char('q')));
        cap.handle(press(3.0, RawKey::Named(Key::Tab)));
        let seq = cap.finish();

        let delays: Vec<Option<f64>> = seq.valid_actions().map(|a| a.delay_before).collect();
        assert_eq!(delays, vec![None, Some(0.5), Some(1.0)]);
    }

    #[test]
    fn scroll_is_finalized_before_typing() {
        let kinds = capture(vec![
            tick(0.0, 1.0),
            press(0.1, RawKey::char('a')),
            tick(0.15, 1.0),
            TimedEvent::at_secs(0.2, RawEvent::Stop),
        ]);
        assert_eq!(kinds.len(), 3);
        assert!(matches!(kinds[0], ActionKind::Scroll(_)));
        assert_eq!(kinds[1], ActionKind::TypeString { text: "a".into() });
        assert!(matches!(kinds[2], ActionKind::Scroll(_)));
    }

    #[test]
    fn extreme_ticks_saturate() {
        let kinds = capture(vec![
            tick(0.0, 1e12),
            tick(0.1, 1e12),
            tick(1.0, -1e12),
            tick(1.1, -1e12),
            TimedEvent::at_secs(2.0, RawEvent::Stop),
        ]);
        assert_eq!(scroll_totals(&kinds), vec![(i32::MAX, 2), (i32::MIN, 2)]);
    }

    #[test]
    fn session_serializes_concurrent_sources() {
        let session = CaptureSession::start(CaptureConfig::default()).unwrap();
        let keys = session.sender();
        let pointer = session.sender();

        let kb = thread::spawn(move || {
            for c in "hello".chars() {
                keys.send(RawEvent::KeyPress(RawKey::char(c)));
            }
        });
        let ms = thread::spawn(move || {
            pointer.send(RawEvent::ButtonPress { x: 1, y: 1, button: MouseButton::Right });
            pointer.send(RawEvent::ButtonRelease { x: 1, y: 1, button: MouseButton::Right });
        });
        kb.join().unwrap();
        ms.join().unwrap();
        session.stop();

        let seq = session.wait().unwrap();
        let typed: String = seq
            .valid_actions()
            .filter_map(|a| match &a.kind {
                ActionKind::TypeString { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(typed, "hello");
        assert_eq!(
            seq.valid_actions()
                .filter(|a| matches!(a.kind, ActionKind::Click { .. }))
                .count(),
            1
        );
    }
}
