//! Voice Engine: a fixed pool of voices sharing one parameter set.
//!
//! Audio is produced in fixed-size render chunks. Each chunk is computed only
//! when the read cursor wraps to zero, so envelope and modulation updates
//! happen at a constant rate regardless of the host's block size, and the
//! output does not depend on how the host splits its `process` calls.

use crossbeam_channel::{Receiver, Sender, bounded};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use super::mixer::Mixer;
use super::voice::{Voice, VoiceState};
use crate::command::{EngineCommand, EngineHandle};
use crate::error::EngineError;
use crate::params::{self, ParameterId, ParameterKey, ParameterSet};

/// Engine construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of voices in the pool.
    pub voice_count: usize,
    /// Frames per render chunk (the modulation update interval).
    pub chunk_size: usize,
    /// Seed for the per-note random seeds.
    pub seed: u64,
    /// Capacity of the control-handle command queue.
    pub command_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            voice_count: 6,
            chunk_size: 32,
            seed: 0x5eed_cafe,
            command_capacity: 1024,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.voice_count == 0 {
            return Err(EngineError::InvalidConfig("voice_count must be > 0".into()));
        }
        if self.chunk_size == 0 {
            return Err(EngineError::InvalidConfig("chunk_size must be > 0".into()));
        }
        if self.command_capacity == 0 {
            return Err(EngineError::InvalidConfig("command_capacity must be > 0".into()));
        }
        Ok(())
    }
}

/// Pick the voice for a new note: the voice released longest ago, or if every
/// voice is held, the one held longest. Ties go to the lowest index.
pub fn select_voice<'a>(states: impl IntoIterator<Item = &'a VoiceState>) -> Option<usize> {
    let mut released: Option<(usize, f64)> = None;
    let mut held: Option<(usize, f64)> = None;
    for (index, state) in states.into_iter().enumerate() {
        if state.gate_on {
            if held.is_none_or(|(_, uptime)| state.gate_on_uptime > uptime) {
                held = Some((index, state.gate_on_uptime));
            }
        } else if released.is_none_or(|(_, uptime)| state.gate_off_uptime > uptime) {
            released = Some((index, state.gate_off_uptime));
        }
    }
    released.or(held).map(|(index, _)| index)
}

/// The polyphonic synthesizer core.
pub struct VoiceEngine {
    config: EngineConfig,
    params: ParameterSet,
    voices: Vec<Voice>,
    mixer: Mixer,
    cursor: usize,
    sample_rate: f64,
    max_block_frames: usize,
    rng: StdRng,
    command_tx: Sender<EngineCommand>,
    command_rx: Receiver<EngineCommand>,
}

impl VoiceEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        debug!(
            "voice engine: {} voices, {}-frame chunks",
            config.voice_count, config.chunk_size
        );
        let (command_tx, command_rx) = bounded(config.command_capacity);
        Ok(VoiceEngine {
            voices: (0..config.voice_count).map(|_| Voice::new()).collect(),
            params: ParameterSet::default(),
            mixer: Mixer::new(),
            cursor: 0,
            sample_rate: 0.0,
            max_block_frames: 0,
            rng: StdRng::seed_from_u64(config.seed),
            command_tx,
            command_rx,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Set the sample rate and allocate all render buffers. Must be called
    /// before `process` produces sound; may be called again on any rate or
    /// block-size change.
    pub fn prepare(
        &mut self,
        sample_rate: f64,
        max_block_frames: usize,
    ) -> Result<(), EngineError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }
        self.sample_rate = sample_rate;
        self.max_block_frames = max_block_frames;
        for voice in self.voices.iter_mut() {
            voice.prepare(sample_rate, self.config.chunk_size);
        }
        self.mixer.resize(self.config.chunk_size);
        self.cursor = 0;
        info!(
            "prepared: {sample_rate} Hz, host blocks up to {max_block_frames} frames, {} voices",
            self.voices.len()
        );
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.sample_rate > 0.0
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn max_block_frames(&self) -> usize {
        self.max_block_frames
    }

    /// Key for a parameter identifier. Pure and constant for the process lifetime.
    pub fn map_parameter_key(identifier: &str) -> ParameterKey {
        params::map_parameter_key(identifier)
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    /// Assign a parameter. Values are clamped per field; unknown keys are ignored.
    pub fn set_parameter(&mut self, key: ParameterKey, value: f64) {
        if !self.params.set(key, value) {
            trace!("ignoring unknown parameter key {:#010x}", key.0);
        }
    }

    pub fn set_parameter_by_id(&mut self, id: ParameterId, value: f64) {
        self.params.apply(id, value);
    }

    /// Bulk load from an identifier → value dictionary (preset recall).
    pub fn load_parameters<'a>(&mut self, entries: impl IntoIterator<Item = (&'a str, f64)>) {
        for (identifier, value) in entries {
            self.set_parameter(Self::map_parameter_key(identifier), value);
        }
    }

    /// Start `note` on the voice chosen by the stealing policy. Velocity is
    /// accepted for interface compatibility and does not change the sound.
    /// Ignored before `prepare`.
    pub fn note_on(&mut self, note: u8, velocity: f64) {
        if !self.is_prepared() || note > 127 {
            trace!("ignoring note on {note}");
            return;
        }
        let Some(index) = select_voice(self.voices.iter().map(Voice::state)) else {
            return;
        };
        let seed = self.rng.next_u64();
        let voice = &mut self.voices[index];
        if voice.state().gate_on {
            debug!(
                "note on {note} (velocity {velocity:.2}) steals voice {index} from note {}",
                voice.state().note
            );
        } else {
            debug!("note on {note} (velocity {velocity:.2}) -> voice {index}");
        }
        voice.note_on(note, seed);
    }

    /// Release every voice whose current note is `note`.
    ///
    /// If the same note was retriggered while still held, all of its voices
    /// are released together, not only the most recent one. Voices already
    /// releasing are unaffected.
    pub fn note_off(&mut self, note: u8) {
        for voice in self.voices.iter_mut() {
            if voice.state().note == note {
                voice.note_off();
            }
        }
    }

    /// Handle for sending commands from another thread. Commands are applied
    /// at the start of the next render chunk.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle::new(self.command_tx.clone())
    }

    pub fn apply_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::SetParameter { key, value } => self.set_parameter(key, value),
            EngineCommand::NoteOn { note, velocity } => self.note_on(note, velocity),
            EngineCommand::NoteOff { note } => self.note_off(note),
        }
    }

    pub fn voice_states(&self) -> impl Iterator<Item = &VoiceState> {
        self.voices.iter().map(Voice::state)
    }

    /// Fill `frame_count` frames of `left` and `right` (clamped to the slice
    /// lengths). Synthesis is mono; the right channel copies the left.
    /// Writes silence before `prepare`.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], frame_count: usize) {
        let frames = frame_count.min(left.len()).min(right.len());
        if !self.is_prepared() || self.mixer.is_empty() {
            left[..frames].fill(0.0);
            right[..frames].fill(0.0);
            return;
        }
        for (l, r) in left[..frames].iter_mut().zip(right[..frames].iter_mut()) {
            if self.cursor == 0 {
                self.render_chunk();
            }
            let sample = self.mixer.get(self.cursor) as f32;
            *l = sample;
            *r = sample;
            self.cursor = (self.cursor + 1) % self.mixer.len();
        }
    }

    fn render_chunk(&mut self) {
        while let Ok(command) = self.command_rx.try_recv() {
            self.apply_command(command);
        }
        self.mixer.clear();
        self.mixer.master_gain = self.params.master_volume;
        for voice in self.voices.iter_mut() {
            voice.render(&self.params, self.mixer.buffer_mut());
        }
        self.mixer.finish(self.voices.len());
    }
}
