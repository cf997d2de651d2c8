//! Command-line options.

use clap::Parser;
use macroquad::math::vec2;

use crate::{alarm::AlarmConfig, pattern::MAX_VOLUME, session::SessionSettings, tone::Waveform};

#[derive(Parser, Debug, Clone)]
#[command(name = "game-alarm-clock")]
#[command(about = "Alarm clock you can only silence by catching a moving button", long_about = None)]
pub struct Args {
    /// Hours pre-filled in the settings screen
    #[arg(long, value_name = "HOURS", default_value_t = 0)]
    pub hours: u32,

    /// Minutes pre-filled in the settings screen
    #[arg(long, value_name = "MINUTES", default_value_t = 1)]
    pub minutes: u32,

    /// Starting alarm volume before tap escalation (0.0 - 0.5)
    #[arg(long, value_name = "GAIN", default_value_t = 0.2)]
    pub base_volume: f32,

    /// Oscillator shape of the alarm tones
    #[arg(long, value_enum, default_value_t = Waveform::Saw)]
    pub waveform: Waveform,

    /// Edge length of the dismiss button in pixels
    #[arg(long, value_name = "PX", default_value_t = 120.0)]
    pub button_size: f32,

    /// Window width in pixels
    #[arg(long, value_name = "PX", default_value_t = 1280)]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, value_name = "PX", default_value_t = 720)]
    pub height: u32,
}

impl Args {
    pub fn base_volume(&self) -> f32 {
        if self.base_volume.is_finite() {
            self.base_volume.clamp(0.0, MAX_VOLUME)
        } else {
            0.2
        }
    }

    pub fn preset(&self) -> AlarmConfig {
        AlarmConfig::new(self.hours, self.minutes)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            base_volume: self.base_volume(),
            button_size: self.button_size.max(1.0),
            viewport: vec2(self.width as f32, self.height as f32),
        }
    }
}
