//! Per-sample linear ramps across a render chunk.
//!
//! Control values are recomputed once per chunk; a ramp spreads the jump from
//! the previous chunk's value over the samples of the next one so that
//! modulation does not produce zipper steps.

/// Linear ramp over `N` lanes.
#[derive(Debug, Clone)]
pub struct Interpolator<const N: usize> {
    current: Option<[f64; N]>,
    deltas: [f64; N],
}

impl<const N: usize> Default for Interpolator<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Interpolator<N> {
    pub fn new() -> Self {
        Interpolator {
            current: None,
            deltas: [0.0; N],
        }
    }

    /// Aim the ramp at `target`, reaching it after `steps` calls to
    /// [`advance`](Self::advance). The first feed after a reset jumps straight
    /// to `target`.
    pub fn feed(&mut self, target: [f64; N], steps: usize) {
        let current = *self.current.get_or_insert(target);
        let steps = steps.max(1) as f64;
        for lane in 0..N {
            self.deltas[lane] = (target[lane] - current[lane]) / steps;
        }
    }

    /// Return the current values, then step toward the target.
    pub fn advance(&mut self) -> [f64; N] {
        match self.current.as_mut() {
            Some(values) => {
                let out = *values;
                for lane in 0..N {
                    values[lane] += self.deltas[lane];
                }
                out
            }
            None => [0.0; N],
        }
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.deltas = [0.0; N];
    }
}
