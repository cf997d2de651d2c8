use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use cpal::{
    SampleFormat, Stream,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use tracing::{debug, warn};

use crate::{
    mixer::MasterGain,
    oscillatorbank::OscillatorBank,
    tone::{ToneBurst, Waveform},
};

pub type SharedGraph = Arc<Mutex<ToneGraph>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioState {
    Suspended,
    Running,
    Closed,
}

/// The single audio graph: tone bursts feeding one master gain node.
///
/// The clock counts rendered frames, so it stands still while the graph is
/// suspended and bursts scheduled in the meantime wait for it.
pub struct ToneGraph {
    bank: OscillatorBank,
    master: MasterGain,
    state: AudioState,
    sample_rate: f32,
    frames: u64,
    tone_gain: f32,
    waveform: Waveform,
    warned_closed: bool,
}

impl ToneGraph {
    pub fn new(waveform: Waveform, tone_gain: f32) -> Self {
        Self {
            bank: OscillatorBank::new(),
            master: MasterGain::new(tone_gain),
            state: AudioState::Suspended,
            sample_rate: 44_100.0,
            frames: 0,
            tone_gain,
            waveform,
            warned_closed: false,
        }
    }

    pub fn shared(self) -> SharedGraph {
        Arc::new(Mutex::new(self))
    }

    pub fn set_sample_rate(&mut self, rate: f32) {
        self.sample_rate = rate.max(1.0);
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    /// Returns true when the graph went from suspended to running.
    pub fn resume(&mut self) -> bool {
        if self.state == AudioState::Suspended {
            self.state = AudioState::Running;
            debug!("audio graph resumed");
            true
        } else {
            false
        }
    }

    pub fn close(&mut self) {
        self.state = AudioState::Closed;
        self.bank = OscillatorBank::new();
        self.master.cancel_after(f64::NEG_INFINITY);
    }

    pub fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    pub fn master_gain(&self) -> &MasterGain {
        &self.master
    }

    pub fn set_master_at(&mut self, value: f32, time: f64) {
        if self.state == AudioState::Closed {
            return;
        }
        self.master.set_value_at_time(value, time);
    }

    pub fn play_tone(&mut self, frequency: f32, duration: f64) {
        let now = self.current_time();
        self.play_tone_at(frequency, now, duration);
    }

    pub fn play_tone_at(&mut self, frequency: f32, start: f64, duration: f64) {
        if self.state == AudioState::Closed {
            if !self.warned_closed {
                warn!("no audio output; alarm tones are muted");
                self.warned_closed = true;
            }
            return;
        }
        self.bank.schedule(ToneBurst {
            frequency,
            start,
            duration,
            gain: self.tone_gain,
            waveform: self.waveform,
        });
    }

    pub fn scheduled(&self) -> impl Iterator<Item = &ToneBurst> {
        self.bank.bursts()
    }

    /// Drops bursts and gain writes that have not taken effect yet.
    pub fn cancel_scheduled(&mut self) -> usize {
        let now = self.current_time();
        self.master.cancel_after(now);
        self.bank.cancel_pending(now)
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.state != AudioState::Running {
            return 0.0;
        }
        let time = self.current_time();
        let voices = self.bank.fill_sample(time, self.sample_rate);
        self.frames += 1;
        self.master.mix(voices, time)
    }
}

pub struct AudioEngine {
    _stream: Stream,
}

impl AudioEngine {
    pub fn start(graph: SharedGraph) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No default audio output"))?;
        let supported = device.default_output_config()?;
        let config = supported.config();
        let sample_rate = config.sample_rate.0 as f32;
        if let Ok(mut guard) = graph.lock() {
            guard.set_sample_rate(sample_rate);
        }
        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream_f32(&device, &config, graph)?,
            SampleFormat::I16 => build_stream_i16(&device, &config, graph)?,
            SampleFormat::U16 => build_stream_u16(&device, &config, graph)?,
            _ => build_stream_f32(&device, &config, graph)?,
        };
        stream.play()?;
        Ok(Self { _stream: stream })
    }
}

fn build_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    graph: SharedGraph,
) -> Result<Stream> {
    let channels = config.channels as usize;
    let stream = device.build_output_stream(
        config,
        move |output: &mut [f32], _| {
            fill_output_buffer(output, channels, &graph, 0.0, |sample| sample);
        },
        move |err| warn!("audio stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

fn build_stream_i16(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    graph: SharedGraph,
) -> Result<Stream> {
    let channels = config.channels as usize;
    let stream = device.build_output_stream(
        config,
        move |output: &mut [i16], _| {
            fill_output_buffer(output, channels, &graph, 0, |sample| {
                (sample * i16::MAX as f32) as i16
            });
        },
        move |err| warn!("audio stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

fn build_stream_u16(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    graph: SharedGraph,
) -> Result<Stream> {
    let channels = config.channels as usize;
    let stream = device.build_output_stream(
        config,
        move |output: &mut [u16], _| {
            fill_output_buffer(output, channels, &graph, u16::MAX / 2, |sample| {
                let scaled = (sample * 0.5 + 0.5).clamp(0.0, 1.0);
                (scaled * u16::MAX as f32) as u16
            });
        },
        move |err| warn!("audio stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

fn fill_output_buffer<T, F>(
    output: &mut [T],
    channels: usize,
    graph: &SharedGraph,
    silence: T,
    mut convert: F,
) where
    F: FnMut(f32) -> T,
    T: Copy,
{
    let Ok(mut graph) = graph.lock() else {
        output.fill(silence);
        return;
    };
    for frame in output.chunks_mut(channels.max(1)) {
        let sample = graph.next_sample().clamp(-0.98, 0.98);
        let value = convert(sample);
        for channel in frame {
            *channel = value;
        }
    }
}
