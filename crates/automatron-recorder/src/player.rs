//! Sequence playback through an [`InputDriver`]

use crate::actions::{Action, ActionKind, ClipboardOp, ScrollAction};
use crate::config::PlaybackConfig;
use crate::sequence::{ActionEntry, Sequence};
use automatron_core::keys::{ctrl_combo, playback_key, Key};
use automatron_core::motion::bezier_path;
use automatron_core::{Clock, Error, ErrorCode, InputDriver, MouseButton, Point, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Executes single actions with human-like pacing.
///
/// Owns the driver exclusively for the whole session. The time of the last
/// replayed click is kept here and read by the `delay_after_click` gate.
pub struct ActionExecutor<D, C> {
    driver: D,
    clock: C,
    config: PlaybackConfig,
    rng: StdRng,
    last_click: Option<Duration>,
}

impl<D: InputDriver, C: Clock> ActionExecutor<D, C> {
    pub fn new(driver: D, clock: C, config: PlaybackConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            driver,
            clock,
            config,
            rng,
            last_click: None,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Pause, then perform one action.
    pub fn execute(&mut self, action: &Action) -> Result<()> {
        self.pre_action_delay(action);

        match &action.kind {
            ActionKind::Click {
                coordinates,
                button,
                image,
            } => self.click(*coordinates, *button, image.as_deref()),
            ActionKind::TypeString { text } => {
                self.wait_after_click(action);
                self.type_string(text)
            }
            ActionKind::Keystroke { key } => {
                self.wait_after_click(action);
                self.keystroke(key)
            }
            ActionKind::Scroll(scroll) => self.scroll(scroll),
            ActionKind::Clipboard { operation } => self.clipboard(*operation),
            ActionKind::DragStart { coordinates } => {
                self.move_to(*coordinates)?;
                self.with_retry("mouse_down", |d| d.mouse_down())
            }
            ActionKind::DragEnd { coordinates } => {
                self.move_to(*coordinates)?;
                self.with_retry("mouse_up", |d| d.mouse_up())
            }
            ActionKind::DragDrop { from, to } => {
                self.move_to(*from)?;
                self.with_retry("mouse_down", |d| d.mouse_down())?;
                self.move_to(*to)?;
                self.with_retry("mouse_up", |d| d.mouse_up())
            }
        }
    }

    /// Sleep the configured countdown before a run.
    pub fn start_delay(&self) {
        let secs = self.config.start_delay_secs;
        if secs > 0.0 {
            tracing::info!(secs, "Starting playback");
            self.clock.sleep_secs(secs);
        }
    }

    /// Sleep, bypassing all pacing rules.
    pub fn pause(&self, secs: f64) {
        self.clock.sleep_secs(secs);
    }

    /// Wait after a loop: `extra_delay`, but never less than `min_loop_delay_secs`.
    pub fn loop_pause(&self, extra_delay: f64) {
        self.pause(self.config.min_loop_delay_secs.max(extra_delay));
    }

    fn pre_action_delay(&mut self, action: &Action) {
        let secs = match action.delay_before {
            Some(delay) => self.config.clamp_delay(delay),
            None => self.uniform(self.config.missing_delay),
        };
        self.clock.sleep_secs(secs);
    }

    fn wait_after_click(&mut self, action: &Action) {
        let (Some(min_gap), Some(clicked_at)) = (action.delay_after_click, self.last_click) else {
            return;
        };
        let since = self.clock.now().saturating_sub(clicked_at).as_secs_f64();
        let remaining = min_gap - since;
        if remaining > 0.0 {
            tracing::debug!(remaining, "Waiting after click");
            self.clock.sleep_secs(remaining);
        }
    }

    fn click(&mut self, recorded: Point, button: MouseButton, image: Option<&Path>) -> Result<()> {
        let pause = self.uniform(self.config.pre_click_pause);
        self.clock.sleep_secs(pause);

        let target = match image {
            Some(path) => self.locate(path).unwrap_or_else(|| {
                tracing::warn!(
                    image = %path.display(),
                    fallback = %recorded,
                    "Image not found, using recorded coordinates"
                );
                recorded
            }),
            None => recorded,
        };

        self.move_to(target)?;
        self.clock.sleep_secs(self.config.click_settle_secs);
        self.with_retry("click", |d| d.click(button))?;
        self.last_click = Some(self.clock.now());

        let pause = self.uniform(self.config.post_click_pause);
        self.clock.sleep_secs(pause);
        Ok(())
    }

    fn locate(&mut self, path: &Path) -> Option<Point> {
        let confidences = self.config.image_confidences.clone();
        for confidence in confidences {
            match self.with_retry("locate_image", |d| d.locate_image(path, confidence)) {
                Ok(Some(found)) => {
                    tracing::info!(image = %path.display(), confidence, at = %found, "Image located");
                    return Some(found);
                }
                Ok(None) => {}
                Err(e) => tracing::debug!(error = %e, confidence, "Image lookup failed"),
            }
        }
        None
    }

    fn type_string(&mut self, text: &str) -> Result<()> {
        for c in text.chars() {
            self.with_retry("type_char", |d| d.type_char(c))?;
            let pause = self.uniform(self.config.typing_pause);
            self.clock.sleep_secs(pause);
        }
        Ok(())
    }

    fn keystroke(&mut self, name: &str) -> Result<()> {
        if let Some(key) = playback_key(name) {
            return self.with_retry("press_key", |d| d.press_key(key));
        }
        if let Some(c) = ctrl_combo(name) {
            return self.with_retry("hotkey", |d| d.hotkey(Key::Ctrl, c));
        }
        tracing::debug!(key = name, "No mapping for key, skipped");
        Ok(())
    }

    fn scroll(&mut self, scroll: &ScrollAction) -> Result<()> {
        let total = scroll.effective_delta();
        if total == 0 {
            tracing::debug!("Zero scroll, skipped");
            return Ok(());
        }
        if let Some(start) = scroll.start {
            self.move_to(start)?;
        }

        let steps = scroll.steps.max(1);
        let step_pause = scroll.duration_sec.max(0.0) / steps as f64;
        let mut emitted = 0i32;
        for i in 0..steps {
            let due = ((i + 1) as f64 * total as f64 / steps as f64).round() as i32;
            let amount = due - emitted;
            if amount != 0 {
                self.with_retry("scroll", |d| d.scroll_by(amount))?;
                emitted += amount;
            }
            if i + 1 < steps {
                self.clock.sleep_secs(step_pause);
            }
        }
        Ok(())
    }

    fn clipboard(&mut self, op: ClipboardOp) -> Result<()> {
        self.clock.sleep_secs(self.config.clipboard_settle_secs);
        self.with_retry("hotkey", |d| d.hotkey(Key::Ctrl, op.letter()))
    }

    /// Move along a curved path, then make sure the cursor sits on `target`.
    fn move_to(&mut self, target: Point) -> Result<()> {
        let from = self.with_retry("cursor_position", |d| d.cursor_position())?;
        let path = bezier_path(from, target, &mut self.rng);
        let per_point = Duration::from_millis(self.config.move_step_ms);
        self.with_retry("move", |d| d.move_cursor_along(&path, per_point))?;

        if self.with_retry("cursor_position", |d| d.cursor_position())? != target {
            self.with_retry("move", |d| d.move_cursor_along(&[target], Duration::ZERO))?;
        }
        Ok(())
    }

    fn with_retry<T>(&mut self, what: &str, mut op: impl FnMut(&mut D) -> Result<T>) -> Result<T> {
        let Self {
            driver,
            clock,
            config,
            rng,
            ..
        } = self;
        config.retry.run(&*clock, rng, what, || op(&mut *driver))
    }

    fn uniform(&mut self, range: [f64; 2]) -> f64 {
        if range[1] > range[0] {
            self.rng.gen_range(range[0]..=range[1])
        } else {
            range[0]
        }
    }
}

/// Counts from one playback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackReport {
    pub executed: usize,
    /// Entries with an unknown type
    pub skipped: usize,
}

/// Plays whole sequences, stopping at the first failing action.
pub struct SequencePlayer<D, C> {
    executor: ActionExecutor<D, C>,
}

impl<D: InputDriver, C: Clock> SequencePlayer<D, C> {
    pub fn new(executor: ActionExecutor<D, C>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &ActionExecutor<D, C> {
        &self.executor
    }

    pub fn into_executor(self) -> ActionExecutor<D, C> {
        self.executor
    }

    pub fn play(&mut self, sequence: &Sequence) -> Result<PlaybackReport> {
        let mut report = PlaybackReport::default();
        let total = sequence.len();

        for (index, entry) in sequence.actions.iter().enumerate() {
            match entry {
                ActionEntry::Valid(action) => {
                    tracing::info!(index, total, action = action.name(), "Replaying action");
                    if let Err(e) = self.executor.execute(action) {
                        let err = Error::action_execution(index, action.name(), &e);
                        tracing::error!(index, action = action.name(), error = %e, "Action failed");
                        return Err(err);
                    }
                    report.executed += 1;
                }
                ActionEntry::Unknown { type_name, .. } => {
                    tracing::warn!(index, action = ?type_name, "Unknown action type, skipped");
                    report.skipped += 1;
                }
                ActionEntry::Malformed { reason, .. } => {
                    let name = entry.type_name().unwrap_or("unknown");
                    tracing::error!(index, action = name, reason = %reason, "Malformed action");
                    return Err(Error::new(
                        ErrorCode::ActionExecution,
                        format!("Action {} ({}) is malformed: {}", index, name, reason),
                    )
                    .with_context(serde_json::json!({ "index": index, "action": name })));
                }
            }
        }

        tracing::info!(executed = report.executed, skipped = report.skipped, "Playback complete");
        Ok(report)
    }

    /// Play `sequence` `loops` times with a loop pause between runs. The
    /// first failing loop ends the run.
    pub fn play_repeated(
        &mut self,
        sequence: &Sequence,
        loops: u32,
        extra_delay: f64,
    ) -> Result<PlaybackReport> {
        let mut total = PlaybackReport::default();
        for iteration in 1..=loops {
            tracing::info!(iteration, of = loops, "Playing loop");
            let report = self.play(sequence)?;
            total.executed += report.executed;
            total.skipped += report.skipped;
            if iteration < loops {
                self.executor.loop_pause(extra_delay);
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ScrollAction;
    use automatron_core::{DriverCall, DryRunDriver, ManualClock};
    use serde_json::json;

    fn config() -> PlaybackConfig {
        PlaybackConfig {
            seed: Some(11),
            ..PlaybackConfig::default()
        }
    }

    fn executor(driver: DryRunDriver) -> (ActionExecutor<DryRunDriver, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (ActionExecutor::new(driver, clock.clone(), config()), clock)
    }

    fn secs(d: &[Duration]) -> f64 {
        d.iter().map(Duration::as_secs_f64).sum()
    }

    #[test]
    fn recorded_delays_are_clamped() {
        let (mut exec, clock) = executor(DryRunDriver::new());

        exec.execute(&Action::new(ActionKind::Keystroke { key: "enter".into() }).with_delay(9.0))
            .unwrap();
        exec.execute(&Action::new(ActionKind::Keystroke { key: "tab".into() }).with_delay(0.02))
            .unwrap();

        assert_eq!(clock.sleeps(), vec![Duration::from_secs(5), Duration::from_millis(100)]);
    }

    #[test]
    fn missing_delay_is_drawn() {
        let (mut exec, clock) = executor(DryRunDriver::new());
        exec.execute(&Action::new(ActionKind::Keystroke { key: "enter".into() }))
            .unwrap();

        let slept = clock.sleeps()[0].as_secs_f64();
        assert!((0.5..=1.5).contains(&slept), "{}", slept);
    }

    #[test]
    fn scroll_steps_sum_to_total() {
        let driver = DryRunDriver::new();
        let log = driver.log();
        let (mut exec, clock) = executor(driver);

        let scroll = ScrollAction::new(10, 3, 0.6);
        exec.execute(&Action::new(ActionKind::Scroll(scroll)).with_delay(0.1))
            .unwrap();

        assert_eq!(log.scroll_amounts(), vec![3, 4, 3]);
        // Pre-action delay, then a pause between steps but not after the last
        let sleeps = clock.sleeps();
        assert_eq!(sleeps.len(), 3);
        assert!((sleeps[1].as_secs_f64() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn legacy_scroll_moves_to_start_first() {
        let driver = DryRunDriver::new();
        let log = driver.log();
        let (mut exec, _) = executor(driver);

        let action: Action = serde_json::from_value(json!({
            "type": "scroll",
            "coordinates": {"x": 40, "y": 50},
            "delta": {"x": 0, "y": -2}
        }))
        .unwrap();
        exec.execute(&action).unwrap();

        // Legacy deltas count wheel notches
        let calls = log.calls();
        assert!(matches!(calls[0], DriverCall::MoveAlong { to, .. } if to == Point::new(40, 50)));
        assert_eq!(log.scroll_amounts(), vec![-2 * automatron_core::driver::PIXELS_PER_NOTCH]);
    }

    #[test]
    fn zero_scroll_is_a_no_op() {
        let driver = DryRunDriver::new();
        let log = driver.log();
        let (mut exec, _) = executor(driver);
        exec.execute(&Action::new(ActionKind::Scroll(ScrollAction::new(0, 2, 0.0))))
            .unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn click_moves_then_clicks_recorded_button() {
        let driver = DryRunDriver::at(Point::new(0, 0));
        let log = driver.log();
        let (mut exec, clock) = executor(driver);

        exec.execute(&Action::new(ActionKind::click(300, 200, MouseButton::Right)).with_delay(0.5))
            .unwrap();

        assert_eq!(
            log.calls(),
            vec![
                DriverCall::MoveAlong { to: Point::new(300, 200), points: 10 },
                DriverCall::Click(MouseButton::Right),
            ]
        );
        let sleeps = clock.sleeps();
        assert_eq!(sleeps.len(), 4);
        assert!((0.5..=1.0).contains(&sleeps[1].as_secs_f64()));
        assert_eq!(sleeps[2], Duration::from_millis(200));
        assert!((0.1..=0.3).contains(&sleeps[3].as_secs_f64()));
    }

    #[test]
    fn typing_waits_out_click_gate() {
        let (mut exec, clock) = executor(DryRunDriver::new());
        exec.execute(&Action::new(ActionKind::click(10, 10, MouseButton::Left)).with_delay(0.1))
            .unwrap();
        exec.execute(
            &Action::new(ActionKind::TypeString { text: "ok".into() })
                .with_delay(0.1)
                .with_delay_after_click(2.0),
        )
        .unwrap();

        // [delay, pre-click, settle] happen before the click; post-click,
        // delay and gate must add up to the requested gap.
        let sleeps = clock.sleeps();
        assert!((secs(&sleeps[3..6]) - 2.0).abs() < 1e-6, "{:?}", sleeps);
    }

    #[test]
    fn gate_is_ignored_without_a_click() {
        let (mut exec, clock) = executor(DryRunDriver::new());
        exec.execute(
            &Action::new(ActionKind::Keystroke { key: "enter".into() })
                .with_delay(0.1)
                .with_delay_after_click(3.0),
        )
        .unwrap();
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(100)]);
    }

    #[test]
    fn typing_goes_char_by_char() {
        let driver = DryRunDriver::new();
        let log = driver.log();
        let (mut exec, clock) = executor(driver);

        exec.execute(&Action::new(ActionKind::TypeString { text: "hé!".into() }).with_delay(0.1))
            .unwrap();

        assert_eq!(
            log.calls(),
            vec![DriverCall::TypeChar('h'), DriverCall::TypeChar('é'), DriverCall::TypeChar('!')]
        );
        for pause in &clock.sleeps()[1..] {
            assert!((0.05..=0.15).contains(&pause.as_secs_f64()));
        }
    }

    #[test]
    fn keystroke_mapping() {
        let driver = DryRunDriver::new();
        let log = driver.log();
        let (mut exec, _) = executor(driver);

        for key in ["Key.enter", "ctrl+s", "f13", "page_down"] {
            exec.execute(&Action::new(ActionKind::Keystroke { key: key.into() }))
                .unwrap();
        }

        assert_eq!(
            log.calls(),
            vec![
                DriverCall::PressKey(Key::Enter),
                DriverCall::Hotkey(Key::Ctrl, 's'),
                DriverCall::PressKey(Key::PageDown),
            ]
        );
    }

    #[test]
    fn clipboard_is_a_ctrl_hotkey() {
        let driver = DryRunDriver::new();
        let log = driver.log();
        let (mut exec, clock) = executor(driver);

        exec.execute(&Action::new(ActionKind::Clipboard { operation: ClipboardOp::Cut }).with_delay(0.1))
            .unwrap();

        assert_eq!(log.calls(), vec![DriverCall::Hotkey(Key::Ctrl, 'x')]);
        assert_eq!(clock.sleeps()[1], Duration::from_millis(100));
    }

    #[test]
    fn drag_drop_presses_and_releases() {
        let driver = DryRunDriver::new();
        let log = driver.log();
        let (mut exec, _) = executor(driver);

        exec.execute(&Action::new(ActionKind::DragDrop {
            from: Point::new(100, 100),
            to: Point::new(100, 120),
        }))
        .unwrap();

        assert_eq!(
            log.calls(),
            vec![
                DriverCall::MoveAlong { to: Point::new(100, 100), points: 10 },
                DriverCall::MouseDown,
                DriverCall::MoveAlong { to: Point::new(100, 120), points: 10 },
                DriverCall::MouseUp,
            ]
        );
    }

    #[test]
    fn image_retargets_click() {
        let driver = DryRunDriver::new().with_image("ok.png", Point::new(7, 8));
        let log = driver.log();
        let (mut exec, _) = executor(driver);

        let click = ActionKind::Click {
            coordinates: Point::new(500, 500),
            button: MouseButton::Left,
            image: Some("ok.png".into()),
        };
        exec.execute(&Action::new(click)).unwrap();

        let calls = log.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[1], DriverCall::MoveAlong { to, .. } if to == Point::new(7, 8)));
    }

    #[test]
    fn missing_image_falls_back_to_coordinates() {
        let driver = DryRunDriver::new();
        let log = driver.log();
        let (mut exec, _) = executor(driver);

        let click = ActionKind::Click {
            coordinates: Point::new(500, 500),
            button: MouseButton::Left,
            image: Some("gone.png".into()),
        };
        exec.execute(&Action::new(click)).unwrap();

        let lookups: Vec<f64> = log
            .calls()
            .iter()
            .filter_map(|c| match c {
                DriverCall::LocateImage { confidence, .. } => Some(*confidence),
                _ => None,
            })
            .collect();
        assert_eq!(lookups, vec![0.9, 0.8, 0.7, 0.6, 0.5]);
        assert!(log
            .calls()
            .contains(&DriverCall::MoveAlong { to: Point::new(500, 500), points: 10 }));
    }

    /// Fails `click` a fixed number of times before delegating.
    struct Flaky {
        inner: DryRunDriver,
        failures: u32,
        error: Error,
    }

    impl InputDriver for Flaky {
        fn cursor_position(&mut self) -> Result<Point> {
            self.inner.cursor_position()
        }
        fn move_cursor_along(&mut self, points: &[Point], per_point: Duration) -> Result<()> {
            self.inner.move_cursor_along(points, per_point)
        }
        fn click(&mut self, button: MouseButton) -> Result<()> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(self.error.clone());
            }
            self.inner.click(button)
        }
        fn mouse_down(&mut self) -> Result<()> {
            self.inner.mouse_down()
        }
        fn mouse_up(&mut self) -> Result<()> {
            self.inner.mouse_up()
        }
        fn press_key(&mut self, key: Key) -> Result<()> {
            self.inner.press_key(key)
        }
        fn type_char(&mut self, c: char) -> Result<()> {
            self.inner.type_char(c)
        }
        fn scroll_by(&mut self, amount_px: i32) -> Result<()> {
            self.inner.scroll_by(amount_px)
        }
        fn hotkey(&mut self, modifier: Key, key: char) -> Result<()> {
            self.inner.hotkey(modifier, key)
        }
    }

    #[test]
    fn transient_click_failures_are_retried() {
        let inner = DryRunDriver::new();
        let log = inner.log();
        let driver = Flaky {
            inner,
            failures: 2,
            error: Error::transient("busy"),
        };
        let clock = ManualClock::new();
        let mut exec = ActionExecutor::new(driver, clock.clone(), config());

        exec.execute(&Action::new(ActionKind::click(1, 1, MouseButton::Left)).with_delay(0.1))
            .unwrap();

        assert!(log.calls().contains(&DriverCall::Click(MouseButton::Left)));
        let backoff: Vec<_> = clock.sleeps().into_iter().filter(|d| *d >= Duration::from_secs(1)).collect();
        assert_eq!(backoff.len(), 2);
    }

    #[test]
    fn failing_action_aborts_with_index() {
        let driver = Flaky {
            inner: DryRunDriver::new(),
            failures: u32::MAX,
            error: Error::driver("click", "no display"),
        };
        let log = driver.inner.log();
        let mut player = SequencePlayer::new(ActionExecutor::new(driver, ManualClock::new(), config()));

        let seq = Sequence::new(
            Default::default(),
            vec![
                Action::new(ActionKind::Keystroke { key: "enter".into() }),
                Action::new(ActionKind::click(5, 5, MouseButton::Left)),
                Action::new(ActionKind::Keystroke { key: "tab".into() }),
            ],
        );
        let err = player.play(&seq).unwrap_err();

        assert_eq!(err.code, ErrorCode::ActionExecution);
        assert_eq!(err.context.unwrap()["index"], 1);
        assert!(!log.calls().contains(&DriverCall::PressKey(Key::Tab)));
    }

    #[test]
    fn unknown_entries_are_skipped_and_malformed_abort() {
        let driver = DryRunDriver::new();
        let log = driver.log();
        let mut player = SequencePlayer::new(ActionExecutor::new(driver, ManualClock::new(), config()));

        let seq: Sequence = serde_json::from_value(json!({
            "actions": [
                {"type": "keystroke", "key": "enter"},
                {"type": "hover", "coordinates": {"x": 1, "y": 1}},
                {"type": "keystroke", "key": "tab"}
            ]
        }))
        .unwrap();
        let report = player.play(&seq).unwrap();
        assert_eq!(report, PlaybackReport { executed: 2, skipped: 1 });

        let seq: Sequence = serde_json::from_value(json!({
            "actions": [
                {"type": "click"},
                {"type": "keystroke", "key": "esc"}
            ]
        }))
        .unwrap();
        let err = player.play(&seq).unwrap_err();
        assert_eq!(err.code, ErrorCode::ActionExecution);
        assert_eq!(err.context.unwrap()["index"], 0);
        assert!(!log.calls().contains(&DriverCall::PressKey(Key::Escape)));
    }

    #[test]
    fn repeated_play_pauses_between_loops() {
        let driver = DryRunDriver::new();
        let log = driver.log();
        let clock = ManualClock::new();
        let mut player = SequencePlayer::new(ActionExecutor::new(driver, clock.clone(), config()));

        let seq: Sequence = serde_json::from_value(json!({
            "actions": [
                {"type": "keystroke", "key": "enter", "delay_before": 0.1},
                {"type": "hover"}
            ]
        }))
        .unwrap();
        let report = player.play_repeated(&seq, 3, 2.5).unwrap();

        assert_eq!(report, PlaybackReport { executed: 3, skipped: 3 });
        assert_eq!(log.len(), 3);
        let pauses = clock.sleeps().into_iter().filter(|d| *d == Duration::from_millis(2500));
        assert_eq!(pauses.count(), 2);
        assert!((clock.total_slept().as_secs_f64() - 5.3).abs() < 1e-9);
    }

    #[test]
    fn repeated_play_keeps_the_loop_floor() {
        let clock = ManualClock::new();
        let mut player =
            SequencePlayer::new(ActionExecutor::new(DryRunDriver::new(), clock.clone(), config()));
        let seq = Sequence::new(
            Default::default(),
            vec![Action::new(ActionKind::Keystroke { key: "tab".into() }).with_delay(0.1)],
        );

        player.play_repeated(&seq, 2, 0.0).unwrap();
        assert!(clock.sleeps().contains(&Duration::from_secs(1)));
        assert!((clock.total_slept().as_secs_f64() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn repeated_play_stops_at_the_first_failure() {
        let driver = DryRunDriver::new();
        let log = driver.log();
        let mut player = SequencePlayer::new(ActionExecutor::new(driver, ManualClock::new(), config()));

        let seq: Sequence = serde_json::from_value(json!({
            "actions": [
                {"type": "keystroke", "key": "enter"},
                {"type": "click"}
            ]
        }))
        .unwrap();
        let err = player.play_repeated(&seq, 5, 0.0).unwrap_err();

        assert_eq!(err.code, ErrorCode::ActionExecution);
        assert_eq!(log.len(), 1);
    }
}
