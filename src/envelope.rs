/// Exponential gain ramp between two strictly positive values.
///
/// Follows `v(t) = v0 * (v1 / v0) ^ ((t - t0) / (t1 - t0))`, holding `v0`
/// before the ramp starts and `v1` after it ends. A non-positive endpoint
/// cannot be reached exponentially, so such a ramp is silent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExponentialRamp {
    from: f32,
    to: f32,
    start: f64,
    end: f64,
}

impl ExponentialRamp {
    pub fn new(from: f32, to: f32, start: f64, end: f64) -> Self {
        Self {
            from,
            to,
            start,
            end,
        }
    }

    pub fn value_at(&self, time: f64) -> f32 {
        if self.from <= 0.0 || self.to <= 0.0 {
            return 0.0;
        }
        if time <= self.start {
            return self.from;
        }
        if time >= self.end || self.end <= self.start {
            return self.to;
        }
        let progress = ((time - self.start) / (self.end - self.start)) as f32;
        self.from * (self.to / self.from).powf(progress)
    }
}
