use macroquad::math::{Rect, Vec2, vec2};
use rand::Rng;

pub const MAX_TAPS: u32 = 4;
/// Minimum gap between the dismiss button and any window edge.
pub const EDGE_MARGIN: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapOutcome {
    Ignored,
    Counted(u32),
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TapState {
    count: u32,
    threshold: u32,
}

impl TapState {
    pub fn new() -> Self {
        Self {
            count: 0,
            threshold: MAX_TAPS,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn is_complete(&self) -> bool {
        self.count >= self.threshold
    }

    pub fn tap(&mut self) -> TapOutcome {
        if self.is_complete() {
            return TapOutcome::Ignored;
        }
        self.count += 1;
        if self.is_complete() {
            TapOutcome::Completed
        } else {
            TapOutcome::Counted(self.count)
        }
    }

    pub fn indicator(&self) -> String {
        format!("{} / {}", self.count, self.threshold)
    }
}

impl Default for TapState {
    fn default() -> Self {
        Self::new()
    }
}

/// Region the button's top-left corner may land in, or `None` when the
/// viewport cannot fit the button plus margins.
pub fn placement_range(viewport: Vec2, size: f32) -> Option<Rect> {
    let max_x = viewport.x - size - EDGE_MARGIN;
    let max_y = viewport.y - size - EDGE_MARGIN;
    if max_x < EDGE_MARGIN || max_y < EDGE_MARGIN {
        return None;
    }
    Some(Rect::new(
        EDGE_MARGIN,
        EDGE_MARGIN,
        max_x - EDGE_MARGIN,
        max_y - EDGE_MARGIN,
    ))
}

/// Picks a uniformly random whole-pixel position for the dismiss button.
pub fn relocate<R: Rng + ?Sized>(viewport: Vec2, size: f32, rng: &mut R) -> Option<Vec2> {
    let range = placement_range(viewport, size)?;
    let x = rng.gen_range(range.x..=range.x + range.w).floor();
    let y = rng.gen_range(range.y..=range.y + range.h).floor();
    Some(vec2(x, y))
}
