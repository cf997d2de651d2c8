use crate::{envelope::ExponentialRamp, tone::ToneBurst};

pub struct ToneVoice {
    burst: ToneBurst,
    ramp: ExponentialRamp,
    phase: f32,
}

impl ToneVoice {
    fn new(burst: ToneBurst) -> Self {
        Self {
            ramp: burst.envelope(),
            burst,
            phase: 0.0,
        }
    }

    fn sample(&mut self, time: f64, sample_rate: f32) -> f32 {
        if !self.burst.is_started(time) || self.burst.is_finished(time) {
            return 0.0;
        }
        let phase_delta = self.burst.frequency / sample_rate;
        let value = self.burst.waveform.sample(self.phase);
        self.phase = (self.phase + phase_delta).fract();
        value * self.ramp.value_at(time)
    }
}

/// Every burst that is scheduled or still sounding.
pub struct OscillatorBank {
    voices: Vec<ToneVoice>,
}

impl OscillatorBank {
    pub fn new() -> Self {
        Self { voices: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn schedule(&mut self, burst: ToneBurst) {
        self.voices.push(ToneVoice::new(burst));
    }

    pub fn bursts(&self) -> impl Iterator<Item = &ToneBurst> {
        self.voices.iter().map(|voice| &voice.burst)
    }

    /// Drops bursts that have not started by `time`. Returns how many went.
    pub fn cancel_pending(&mut self, time: f64) -> usize {
        let before = self.voices.len();
        self.voices.retain(|voice| voice.burst.is_started(time));
        before - self.voices.len()
    }

    pub fn fill_sample(&mut self, time: f64, sample_rate: f32) -> f32 {
        let mut mixed = 0.0;
        let mut finished = false;
        for voice in self.voices.iter_mut() {
            mixed += voice.sample(time, sample_rate);
            finished |= voice.burst.is_finished(time);
        }
        if finished {
            self.voices.retain(|voice| !voice.burst.is_finished(time));
        }
        mixed
    }
}

impl Default for OscillatorBank {
    fn default() -> Self {
        Self::new()
    }
}
