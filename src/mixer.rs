/// The master volume node every burst passes through.
///
/// Writes are scheduled against the audio clock; the latest write at or
/// before a given time wins.
pub struct MasterGain {
    value: f32,
    events: Vec<(f64, f32)>,
}

impl MasterGain {
    pub fn new(value: f32) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            events: Vec::new(),
        }
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        let value = value.clamp(0.0, 1.0);
        let index = self.events.partition_point(|(at, _)| *at <= time);
        self.events.insert(index, (time, value));
    }

    pub fn cancel_after(&mut self, time: f64) {
        self.events.retain(|(at, _)| *at <= time);
    }

    pub fn value_at(&mut self, time: f64) -> f32 {
        let due = self.events.partition_point(|(at, _)| *at <= time);
        if due > 0 {
            self.value = self.events[due - 1].1;
            self.events.drain(..due);
        }
        self.value
    }

    pub fn current(&self) -> f32 {
        self.value
    }

    pub fn pending(&self) -> &[(f64, f32)] {
        &self.events
    }

    pub fn mix(&mut self, voices: f32, time: f64) -> f32 {
        voices * self.value_at(time)
    }
}
