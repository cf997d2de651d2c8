use std::time::Duration;

use crate::output::ToneGraph;

/// Seconds between notes of a melody.
pub const STEP_DELAY: f64 = 0.2;
/// Silence between two repetitions of a melody.
pub const PATTERN_GAP: f64 = 0.1;
/// Part of each step a note actually sounds for.
pub const NOTE_LENGTH: f64 = 0.95;
pub const MAX_VOLUME: f32 = 0.5;
pub const VOLUME_STEP_PER_TAP: f32 = 0.2;

/// One melody per escalation tier, lowest and calmest first.
pub const MELODY_BANK: [[f32; 4]; 4] = [
    [220.0, 262.0, 330.0, 220.0],
    [440.0, 554.0, 659.0, 440.0],
    [659.0, 784.0, 880.0, 659.0],
    [880.0, 988.0, 1109.0, 988.0],
];

pub fn tier(tap_count: u32) -> &'static [f32; 4] {
    let index = (tap_count as usize).min(MELODY_BANK.len() - 1);
    &MELODY_BANK[index]
}

pub fn volume_for(base_volume: f32, tap_count: u32) -> f32 {
    let factor = 1.0 + tap_count as f32 * VOLUME_STEP_PER_TAP;
    (base_volume * factor).min(MAX_VOLUME)
}

#[derive(Clone, Copy, Debug)]
pub struct PatternPlayer {
    base_volume: f32,
    step_delay: f64,
}

impl PatternPlayer {
    pub fn new(base_volume: f32) -> Self {
        Self {
            base_volume: base_volume.clamp(0.0, MAX_VOLUME),
            step_delay: STEP_DELAY,
        }
    }

    pub fn base_volume(&self) -> f32 {
        self.base_volume
    }

    /// Period of the repeating tone timer: one whole melody plus a gap.
    pub fn tick_period(&self) -> Duration {
        let notes = MELODY_BANK[0].len() as f64;
        let millis = (notes * self.step_delay + PATTERN_GAP) * 1000.0;
        Duration::from_millis(millis.round() as u64)
    }

    /// Plays the melody for the current tier.
    pub fn play_tier(&self, graph: &mut ToneGraph, tap_count: u32) {
        self.play_pattern(graph, tier(tap_count), self.step_delay, tap_count);
    }

    pub fn play_pattern(
        &self,
        graph: &mut ToneGraph,
        pattern: &[f32],
        step_delay: f64,
        tap_count: u32,
    ) {
        let now = graph.current_time();
        let volume = volume_for(self.base_volume, tap_count);
        for (index, frequency) in pattern.iter().enumerate() {
            let start = now + index as f64 * step_delay;
            graph.set_master_at(volume, start);
            graph.play_tone_at(*frequency, start, step_delay * NOTE_LENGTH);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::Waveform;

    #[test]
    fn tier_follows_tap_count_and_saturates() {
        for taps in 0..4 {
            assert_eq!(tier(taps), &MELODY_BANK[taps as usize]);
        }
        assert_eq!(tier(4), &MELODY_BANK[3]);
        assert_eq!(tier(40), &MELODY_BANK[3]);
    }

    #[test]
    fn volume_rises_per_tap_and_caps() {
        assert!((volume_for(0.2, 0) - 0.2).abs() < 1e-6);
        assert!((volume_for(0.2, 3) - 0.32).abs() < 1e-6);
        assert_eq!(volume_for(0.4, 4), MAX_VOLUME);
        assert_eq!(volume_for(0.5, 100), MAX_VOLUME);
    }

    #[test]
    fn tick_period_is_melody_plus_gap() {
        let player = PatternPlayer::new(0.2);
        assert_eq!(player.tick_period(), Duration::from_millis(900));
    }

    #[test]
    fn pattern_steps_are_spaced_by_step_delay() {
        let mut graph = ToneGraph::new(Waveform::Saw, 0.2);
        let player = PatternPlayer::new(0.2);
        player.play_tier(&mut graph, 2);

        let bursts: Vec<_> = graph.scheduled().copied().collect();
        assert_eq!(bursts.len(), 4);
        for (index, burst) in bursts.iter().enumerate() {
            assert_eq!(burst.frequency, MELODY_BANK[2][index]);
            assert!((burst.start - index as f64 * STEP_DELAY).abs() < 1e-9);
            assert!((burst.duration - STEP_DELAY * NOTE_LENGTH).abs() < 1e-9);
        }
        let volumes: Vec<f32> = graph.master_gain().pending().iter().map(|(_, v)| *v).collect();
        assert_eq!(volumes.len(), 4);
        assert!(volumes.iter().all(|v| (v - 0.28).abs() < 1e-6));
    }
}
