use std::time::Duration;

use chrono::Local;
use macroquad::math::{Vec2, vec2};
use rand::{SeedableRng, rngs::StdRng};
use tokio::{runtime::Handle, time::Instant};
use tracing::{debug, info};

use crate::{
    alarm::{AlarmClock, AlarmConfig, AlarmPhase, COUNTDOWN_FLOOR, format_time},
    error::AlarmError,
    output::SharedGraph,
    pattern::PatternPlayer,
    screen::{ScreenController, ViewState},
    tapgame::{self, TapOutcome, TapState},
    timers::{self, EventReceiver, EventSender, TimerEvent, TimerKind, TimerSlot},
};

pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);
pub const RELOCATION_PERIOD: Duration = Duration::from_millis(500);

pub const STATUS_READY: &str = "Set a time and press SET ALARM.";
pub const STATUS_ARMED: &str = "Alarm set.";
pub const STATUS_DISMISSED: &str = "Alarm dismissed.";
pub const COMPLETION_NOTICE: &str = "Wake-up complete! Alarm dismissed.";

#[derive(Clone, Copy, Debug)]
pub struct SessionSettings {
    pub base_volume: f32,
    pub button_size: f32,
    pub viewport: Vec2,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            base_volume: 0.2,
            button_size: 120.0,
            viewport: vec2(1280.0, 720.0),
        }
    }
}

/// Every timer the alarm can own, one slot per category.
#[derive(Debug)]
struct AlarmTimers {
    deadline: TimerSlot,
    countdown: TimerSlot,
    tone: TimerSlot,
    relocation: TimerSlot,
}

impl AlarmTimers {
    fn new() -> Self {
        Self {
            deadline: TimerSlot::new(TimerKind::Deadline),
            countdown: TimerSlot::new(TimerKind::Countdown),
            tone: TimerSlot::new(TimerKind::Tone),
            relocation: TimerSlot::new(TimerKind::Relocation),
        }
    }

    fn slot(&self, kind: TimerKind) -> &TimerSlot {
        match kind {
            TimerKind::Deadline => &self.deadline,
            TimerKind::Countdown => &self.countdown,
            TimerKind::Tone => &self.tone,
            TimerKind::Relocation => &self.relocation,
        }
    }

    fn cancel_all(&mut self) {
        self.deadline.cancel();
        self.countdown.cancel();
        self.tone.cancel();
        self.relocation.cancel();
    }
}

/// One alarm from arming to dismissal, plus everything the screens show.
///
/// All state changes happen on the caller's thread: timer tasks only post
/// [`TimerEvent`]s, which the frame loop feeds back through
/// [`AlarmSession::handle_event`].
pub struct AlarmSession {
    runtime: Handle,
    events: EventSender,
    graph: SharedGraph,
    player: PatternPlayer,
    clock: AlarmClock,
    screen: ScreenController,
    timers: AlarmTimers,
    tap: Option<TapState>,
    rng: StdRng,
    viewport: Vec2,
    button_size: f32,
    button_position: Vec2,
    countdown_text: String,
    scheduled_text: String,
    status: String,
    notice: Option<String>,
    audio_unlocked: bool,
}

impl AlarmSession {
    pub fn new(
        runtime: Handle,
        graph: SharedGraph,
        settings: SessionSettings,
    ) -> (Self, EventReceiver) {
        Self::with_rng(runtime, graph, settings, StdRng::from_entropy())
    }

    pub fn with_rng(
        runtime: Handle,
        graph: SharedGraph,
        settings: SessionSettings,
        rng: StdRng,
    ) -> (Self, EventReceiver) {
        let (events, receiver) = timers::channel();
        let session = Self {
            runtime,
            events,
            graph,
            player: PatternPlayer::new(settings.base_volume),
            clock: AlarmClock::new(),
            screen: ScreenController::new(),
            timers: AlarmTimers::new(),
            tap: None,
            rng,
            viewport: settings.viewport,
            button_size: settings.button_size,
            button_position: centered(settings.viewport, settings.button_size),
            countdown_text: COUNTDOWN_FLOOR.to_string(),
            scheduled_text: String::new(),
            status: STATUS_READY.to_string(),
            notice: None,
            audio_unlocked: false,
        };
        (session, receiver)
    }

    pub fn view(&self) -> ViewState {
        self.screen.view()
    }

    pub fn screen(&self) -> &ScreenController {
        &self.screen
    }

    pub fn phase(&self) -> AlarmPhase {
        self.clock.phase()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn countdown_text(&self) -> &str {
        &self.countdown_text
    }

    pub fn scheduled_text(&self) -> &str {
        &self.scheduled_text
    }

    pub fn tap_count(&self) -> u32 {
        self.tap.map(|state| state.count()).unwrap_or(0)
    }

    pub fn tap_indicator(&self) -> String {
        self.tap.unwrap_or_default().indicator()
    }

    pub fn button_position(&self) -> Vec2 {
        self.button_position
    }

    pub fn button_size(&self) -> f32 {
        self.button_size
    }

    pub fn is_timer_active(&self, kind: TimerKind) -> bool {
        self.timers.slot(kind).is_active()
    }

    pub fn active_timers(&self) -> usize {
        [
            TimerKind::Deadline,
            TimerKind::Countdown,
            TimerKind::Tone,
            TimerKind::Relocation,
        ]
        .into_iter()
        .filter(|kind| self.is_timer_active(*kind))
        .count()
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = vec2(width, height);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// First click or key press anywhere lets the audio graph start.
    pub fn user_gesture(&mut self) {
        if self.audio_unlocked {
            return;
        }
        self.audio_unlocked = true;
        self.resume_audio();
    }

    pub fn arm(&mut self, config: AlarmConfig) -> Result<(), AlarmError> {
        let now = Instant::now();
        let deadline = match self.clock.arm(config, now) {
            Ok(deadline) => deadline,
            Err(err) => {
                self.status = err.to_string();
                debug!(?config, "alarm rejected");
                return Err(err);
            }
        };
        self.cancel_all();
        self.tap = None;

        let total = deadline - now;
        self.countdown_text = format_time(total);
        self.scheduled_text = scheduled_label(total);
        self.screen.show(ViewState::Countdown);
        self.timers
            .countdown
            .every(&self.runtime, &self.events, COUNTDOWN_PERIOD);
        self.timers
            .deadline
            .once(&self.runtime, &self.events, deadline);
        self.status = STATUS_ARMED.to_string();
        info!(
            minutes = config.total_minutes(),
            at = %self.scheduled_text,
            "alarm armed"
        );
        Ok(())
    }

    pub fn handle_event(&mut self, event: TimerEvent) {
        if !self.timers.slot(event.kind).accepts(&event) {
            debug!(?event, "dropping stale timer event");
            return;
        }
        match event.kind {
            TimerKind::Deadline => {
                self.timers.deadline.complete();
                self.fire();
            }
            TimerKind::Countdown => self.countdown_tick(),
            TimerKind::Tone => self.tone_tick(),
            TimerKind::Relocation => self.relocate(),
        }
    }

    /// Drains every event the timers have posted so far.
    pub fn pump(&mut self, receiver: &mut EventReceiver) -> usize {
        let mut handled = 0;
        while let Ok(event) = receiver.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn tap(&mut self) {
        let Some(state) = self.tap.as_mut() else {
            return;
        };
        match state.tap() {
            TapOutcome::Ignored => {}
            TapOutcome::Counted(count) => {
                debug!(count, "dismiss tap");
                self.start_tone();
                self.relocate();
            }
            TapOutcome::Completed => {
                self.start_tone();
                self.relocate();
                self.dismiss();
            }
        }
    }

    pub fn cancel_all(&mut self) {
        self.timers.cancel_all();
    }

    fn countdown_tick(&mut self) {
        match self.clock.remaining(Instant::now()) {
            Some(remaining) => self.countdown_text = format_time(remaining),
            None => {
                self.timers.countdown.cancel();
                self.countdown_text = COUNTDOWN_FLOOR.to_string();
            }
        }
    }

    fn fire(&mut self) {
        self.resume_audio();
        if !self.clock.fire() {
            return;
        }
        self.timers.countdown.cancel();
        self.countdown_text = COUNTDOWN_FLOOR.to_string();
        info!("alarm ringing");
        self.start_game();
    }

    fn start_game(&mut self) {
        self.screen.show(ViewState::Alarming);
        self.tap = Some(TapState::new());
        self.start_tone();
        self.timers
            .relocation
            .every(&self.runtime, &self.events, RELOCATION_PERIOD);
        self.relocate();
    }

    fn start_tone(&mut self) {
        self.timers
            .tone
            .every(&self.runtime, &self.events, self.player.tick_period());
    }

    fn tone_tick(&mut self) {
        let tap_count = self.tap_count();
        if let Ok(mut graph) = self.graph.lock() {
            self.player.play_tier(&mut graph, tap_count);
        }
    }

    fn relocate(&mut self) {
        match tapgame::relocate(self.viewport, self.button_size, &mut self.rng) {
            Some(position) => self.button_position = position,
            None => debug!(
                width = self.viewport.x,
                height = self.viewport.y,
                "viewport too small to move the dismiss button"
            ),
        }
    }

    fn dismiss(&mut self) {
        self.cancel_all();
        if let Ok(mut graph) = self.graph.lock() {
            graph.cancel_scheduled();
        }
        self.tap = None;
        self.clock.reset();
        self.screen.show(ViewState::Settings);
        self.button_position = centered(self.viewport, self.button_size);
        self.status = STATUS_DISMISSED.to_string();
        self.notice = Some(COMPLETION_NOTICE.to_string());
        info!("alarm dismissed");
    }

    fn resume_audio(&mut self) {
        if let Ok(mut graph) = self.graph.lock() {
            graph.resume();
        }
    }
}

fn centered(viewport: Vec2, size: f32) -> Vec2 {
    ((viewport - Vec2::splat(size)) * 0.5).max(Vec2::ZERO)
}

fn scheduled_label(total: Duration) -> String {
    chrono::Duration::from_std(total)
        .ok()
        .and_then(|delta| Local::now().checked_add_signed(delta))
        .map(|at| at.format("(%H:%M)").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use tokio::time;

    use super::*;
    use crate::{
        output::{AudioState, ToneGraph},
        pattern::MELODY_BANK,
        tapgame::{EDGE_MARGIN, MAX_TAPS},
        tone::Waveform,
    };

    fn session() -> (AlarmSession, EventReceiver, SharedGraph) {
        let graph = ToneGraph::new(Waveform::Saw, 0.2).shared();
        let (session, receiver) = AlarmSession::with_rng(
            Handle::current(),
            graph.clone(),
            SessionSettings::default(),
            StdRng::seed_from_u64(42),
        );
        (session, receiver, graph)
    }

    /// Lets the paused clock run forward, handling each event at the
    /// instant it is sent. Returns the kinds that were accepted.
    async fn run_for(
        session: &mut AlarmSession,
        receiver: &mut EventReceiver,
        total: Duration,
    ) -> Vec<TimerKind> {
        let end = Instant::now() + total;
        let mut seen = Vec::new();
        while let Ok(Some(event)) = time::timeout_at(end, receiver.recv()).await {
            if session.timers.slot(event.kind).accepts(&event) {
                seen.push(event.kind);
            }
            session.handle_event(event);
        }
        seen
    }

    async fn ring(session: &mut AlarmSession, receiver: &mut EventReceiver) {
        session.arm(AlarmConfig::new(0, 1)).unwrap();
        run_for(session, receiver, Duration::from_millis(60_020)).await;
        assert_eq!(session.phase(), AlarmPhase::Ringing);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_is_rejected_without_timers() {
        let (mut session, _receiver, _graph) = session();
        let result = session.arm(AlarmConfig::new(0, 0));
        assert_eq!(result, Err(AlarmError::NonPositiveDuration));
        assert_eq!(session.phase(), AlarmPhase::Idle);
        assert_eq!(session.view(), ViewState::Settings);
        assert_eq!(session.status(), "Set a duration longer than 0 minutes.");
        assert_eq!(session.active_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn arming_creates_one_deadline_and_one_countdown() {
        let (mut session, _receiver, _graph) = session();
        session.arm(AlarmConfig::new(0, 1)).unwrap();
        assert!(session.is_timer_active(TimerKind::Deadline));
        assert!(session.is_timer_active(TimerKind::Countdown));
        assert_eq!(session.active_timers(), 2);
        assert_eq!(session.view(), ViewState::Countdown);
        assert_eq!(session.countdown_text(), "00:01:00");
        assert_eq!(session.status(), STATUS_ARMED);
    }

    #[tokio::test(start_paused = true)]
    async fn arming_the_largest_duration_succeeds() {
        let (mut session, _receiver, _graph) = session();
        assert_eq!(session.arm(AlarmConfig::new(u32::MAX, 0)), Ok(()));
        assert!(matches!(session.phase(), AlarmPhase::Armed { .. }));
        assert_eq!(session.view(), ViewState::Countdown);
        assert_eq!(session.scheduled_text(), "");
        assert_eq!(session.countdown_text(), format!("{}:00:00", u32::MAX));
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_while_ringing_stops_the_game() {
        let (mut session, mut receiver, _graph) = session();
        ring(&mut session, &mut receiver).await;
        session.tap();
        assert_eq!(session.tap_count(), 1);

        session.arm(AlarmConfig::new(0, 5)).unwrap();
        assert!(!session.is_timer_active(TimerKind::Tone));
        assert!(!session.is_timer_active(TimerKind::Relocation));
        assert_eq!(session.active_timers(), 2);
        assert_eq!(session.tap_count(), 0);
        assert_eq!(session.view(), ViewState::Countdown);
        session.tap();
        assert_eq!(session.tap_count(), 0);

        let seen = run_for(&mut session, &mut receiver, Duration::from_millis(2_020)).await;
        assert!(seen.iter().all(|kind| *kind == TimerKind::Countdown), "{seen:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_does_not_duplicate_countdown_ticks() {
        let (mut session, mut receiver, _graph) = session();
        session.arm(AlarmConfig::new(0, 1)).unwrap();
        session.arm(AlarmConfig::new(0, 2)).unwrap();
        assert_eq!(session.active_timers(), 2);

        let seen = run_for(&mut session, &mut receiver, Duration::from_millis(3_020)).await;
        let ticks = seen.iter().filter(|kind| **kind == TimerKind::Countdown).count();
        assert_eq!(ticks, 3);
        assert_eq!(session.countdown_text(), "00:01:57");
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_deadline() {
        let (mut session, mut receiver, _graph) = session();
        session.arm(AlarmConfig::new(0, 1)).unwrap();
        session.arm(AlarmConfig::new(0, 2)).unwrap();
        run_for(&mut session, &mut receiver, Duration::from_secs(90)).await;
        assert!(matches!(session.phase(), AlarmPhase::Armed { .. }));
        run_for(&mut session, &mut receiver, Duration::from_secs(31)).await;
        assert_eq!(session.phase(), AlarmPhase::Ringing);
    }

    #[tokio::test(start_paused = true)]
    async fn firing_starts_the_tap_game() {
        let (mut session, mut receiver, graph) = session();
        ring(&mut session, &mut receiver).await;

        assert_eq!(session.view(), ViewState::Alarming);
        assert!(session.screen().alarm_background());
        assert_eq!(session.tap_count(), 0);
        assert_eq!(session.tap_indicator(), "0 / 4");
        assert!(!session.is_timer_active(TimerKind::Countdown));
        assert!(!session.is_timer_active(TimerKind::Deadline));
        assert!(session.is_timer_active(TimerKind::Tone));
        assert!(session.is_timer_active(TimerKind::Relocation));
        assert_eq!(session.countdown_text(), COUNTDOWN_FLOOR);
        assert_eq!(graph.lock().unwrap().state(), AudioState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn tone_and_relocation_run_on_their_own_cadence() {
        let (mut session, mut receiver, graph) = session();
        ring(&mut session, &mut receiver).await;

        let seen = run_for(&mut session, &mut receiver, Duration::from_millis(1_820)).await;
        let tones = seen.iter().filter(|kind| **kind == TimerKind::Tone).count();
        let moves = seen.iter().filter(|kind| **kind == TimerKind::Relocation).count();
        assert_eq!(tones, 2);
        assert_eq!(moves, 3);

        let frequencies: Vec<f32> = graph
            .lock()
            .unwrap()
            .scheduled()
            .map(|burst| burst.frequency)
            .collect();
        assert_eq!(frequencies.len(), 8);
        assert_eq!(&frequencies[..4], &MELODY_BANK[0]);
    }

    #[tokio::test(start_paused = true)]
    async fn taps_escalate_the_melody_tier() {
        let (mut session, mut receiver, graph) = session();
        ring(&mut session, &mut receiver).await;

        session.tap();
        session.tap();
        assert_eq!(session.tap_count(), 2);
        assert_eq!(session.tap_indicator(), "2 / 4");

        run_for(&mut session, &mut receiver, Duration::from_millis(920)).await;
        let first: Vec<f32> = graph
            .lock()
            .unwrap()
            .scheduled()
            .take(4)
            .map(|burst| burst.frequency)
            .collect();
        assert_eq!(first, MELODY_BANK[2]);
    }

    #[tokio::test(start_paused = true)]
    async fn button_stays_on_screen_while_ringing() {
        let (mut session, mut receiver, _graph) = session();
        ring(&mut session, &mut receiver).await;
        let size = session.button_size();
        for _ in 0..3 {
            session.tap();
            for _ in 0..4 {
                run_for(&mut session, &mut receiver, Duration::from_millis(500)).await;
                let position = session.button_position();
                assert!(position.x >= EDGE_MARGIN && position.y >= EDGE_MARGIN);
                assert!(position.x <= 1280.0 - size - EDGE_MARGIN);
                assert!(position.y <= 720.0 - size - EDGE_MARGIN);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reaching_max_taps_dismisses_everything() {
        let (mut session, mut receiver, _graph) = session();
        ring(&mut session, &mut receiver).await;

        for _ in 0..MAX_TAPS {
            session.tap();
        }
        assert_eq!(session.view(), ViewState::Settings);
        assert_eq!(session.phase(), AlarmPhase::Idle);
        assert_eq!(session.tap_count(), 0);
        assert_eq!(session.active_timers(), 0);
        assert_eq!(session.status(), STATUS_DISMISSED);
        assert_eq!(session.notice(), Some(COMPLETION_NOTICE));
        assert!(!session.screen().alarm_background());

        let seen = run_for(&mut session, &mut receiver, Duration::from_secs(5)).await;
        assert!(seen.is_empty(), "timers outlived dismissal: {seen:?}");

        session.dismiss_notice();
        assert_eq!(session.notice(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn next_ring_starts_from_zero_taps() {
        let (mut session, mut receiver, _graph) = session();
        ring(&mut session, &mut receiver).await;
        for _ in 0..MAX_TAPS {
            session.tap();
        }
        session.tap();
        assert_eq!(session.tap_count(), 0);

        ring(&mut session, &mut receiver).await;
        assert_eq!(session.tap_indicator(), "0 / 4");
    }

    #[tokio::test(start_paused = true)]
    async fn taps_outside_ringing_are_ignored() {
        let (mut session, _receiver, _graph) = session();
        session.tap();
        session.arm(AlarmConfig::new(0, 1)).unwrap();
        session.tap();
        assert_eq!(session.tap_count(), 0);
        assert_eq!(session.view(), ViewState::Countdown);
    }

    #[tokio::test(start_paused = true)]
    async fn first_gesture_resumes_audio_once() {
        let (mut session, _receiver, graph) = session();
        assert_eq!(graph.lock().unwrap().state(), AudioState::Suspended);
        session.user_gesture();
        assert_eq!(graph.lock().unwrap().state(), AudioState::Running);
        session.user_gesture();
        assert_eq!(graph.lock().unwrap().state(), AudioState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn tiny_viewport_leaves_button_in_place() {
        let (mut session, mut receiver, _graph) = session();
        ring(&mut session, &mut receiver).await;
        session.set_viewport(100.0, 100.0);
        let before = session.button_position();
        run_for(&mut session, &mut receiver, Duration::from_secs(2)).await;
        session.tap();
        assert_eq!(session.button_position(), before);
        assert_eq!(session.tap_count(), 1);
    }
}
