//! The engine's render chunk: voices sum into it, then it is leveled,
//! soft clipped and scaled by the master volume.

use super::math::soft_clip;

/// Summing buffer for one render chunk. Sized once in [`resize`](Self::resize);
/// every other method is allocation-free.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
    buffer: Vec<f64>,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        Mixer {
            master_gain: 1.0,
            buffer: Vec::new(),
        }
    }

    /// Allocate room for `num_samples`.
    pub fn resize(&mut self, num_samples: usize) {
        self.buffer.clear();
        self.buffer.resize(num_samples, 0.0);
    }

    /// Zero the buffer.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
    }

    /// Buffer voices render (add) into.
    pub fn buffer_mut(&mut self) -> &mut [f64] {
        &mut self.buffer
    }

    /// Level the summed `sources` by `1/√sources`, soft clip, then apply the
    /// master gain.
    pub fn finish(&mut self, sources: usize) {
        let rms_gain = 1.0 / (sources.max(1) as f64).sqrt();
        for s in self.buffer.iter_mut() {
            *s = soft_clip(*s * rms_gain) * self.master_gain;
        }
    }

    pub fn get(&self, index: usize) -> f64 {
        self.buffer.get(index).copied().unwrap_or(0.0)
    }

    /// Access the raw buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Is the buffer empty?
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
