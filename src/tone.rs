use clap::ValueEnum;

use crate::envelope::ExponentialRamp;

/// Gain an exponential decay lands on at the end of a burst.
pub const TONE_FLOOR_GAIN: f32 = 0.0001;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Waveform {
    Saw,
    Square,
    Triangle,
    Sine,
}

impl Waveform {
    pub fn label(&self) -> &'static str {
        match self {
            Waveform::Saw => "SAW",
            Waveform::Square => "SQUARE",
            Waveform::Triangle => "TRI",
            Waveform::Sine => "SINE",
        }
    }

    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Saw => 2.0 * (phase - 0.5),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 4.0 * (phase - 0.5).abs() - 1.0,
            Waveform::Sine => (phase * std::f32::consts::TAU).sin(),
        }
    }
}

/// One oscillator burst placed on the audio clock.
///
/// Times are seconds on the graph's clock, which only advances while the
/// output is running.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneBurst {
    pub frequency: f32,
    pub start: f64,
    pub duration: f64,
    pub gain: f32,
    pub waveform: Waveform,
}

impl ToneBurst {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn envelope(&self) -> ExponentialRamp {
        ExponentialRamp::new(self.gain, TONE_FLOOR_GAIN, self.start, self.end())
    }

    pub fn is_started(&self, time: f64) -> bool {
        time >= self.start
    }

    pub fn is_finished(&self, time: f64) -> bool {
        time >= self.end()
    }
}
