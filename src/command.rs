//! Control-rate commands and the handle other threads use to send them.
//!
//! The engine owns its [`ParameterSet`](crate::params::ParameterSet)
//! exclusively. A UI or automation thread holds an [`EngineHandle`] and
//! enqueues commands on a bounded lock-free channel; the render thread drains
//! the queue at the start of each render chunk, so voices never see a
//! half-applied update.

use crossbeam_channel::{Sender, TrySendError};
use log::warn;

use crate::error::EngineError;
use crate::params::{ParameterId, ParameterKey};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCommand {
    SetParameter { key: ParameterKey, value: f64 },
    NoteOn { note: u8, velocity: f64 },
    NoteOff { note: u8 },
}

/// Cloneable, `Send` sender of [`EngineCommand`]s.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: Sender<EngineCommand>,
}

impl EngineHandle {
    pub(crate) fn new(tx: Sender<EngineCommand>) -> Self {
        EngineHandle { tx }
    }

    /// Enqueue without blocking.
    pub fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(cmd) => {
                warn!("engine command queue full, dropping {cmd:?}");
                EngineError::QueueFull
            }
            TrySendError::Disconnected(cmd) => {
                warn!("engine dropped, discarding {cmd:?}");
                EngineError::Disconnected
            }
        })
    }

    pub fn set_parameter(&self, key: ParameterKey, value: f64) -> Result<(), EngineError> {
        self.send(EngineCommand::SetParameter { key, value })
    }

    pub fn set_parameter_by_id(&self, id: ParameterId, value: f64) -> Result<(), EngineError> {
        self.set_parameter(id.key(), value)
    }

    pub fn note_on(&self, note: u8, velocity: f64) -> Result<(), EngineError> {
        self.send(EngineCommand::NoteOn { note, velocity })
    }

    pub fn note_off(&self, note: u8) -> Result<(), EngineError> {
        self.send(EngineCommand::NoteOff { note })
    }

    /// Commands waiting to be drained.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn full_queue_reports_error() {
        let (tx, _rx) = bounded(1);
        let handle = EngineHandle::new(tx);
        assert_eq!(handle.note_on(60, 1.0), Ok(()));
        assert_eq!(handle.pending(), 1);
        assert_eq!(handle.note_off(60), Err(EngineError::QueueFull));
    }

    #[test]
    fn dropped_receiver_reports_disconnect() {
        let (tx, rx) = bounded(4);
        let handle = EngineHandle::new(tx);
        drop(rx);
        assert_eq!(
            handle.set_parameter_by_id(ParameterId::FilterCutoff, 0.5),
            Err(EngineError::Disconnected)
        );
    }

    #[test]
    fn commands_arrive_in_order() {
        let (tx, rx) = bounded(8);
        let handle = EngineHandle::new(tx);
        handle.note_on(60, 0.8).unwrap();
        handle.set_parameter(ParameterId::Osc1Wave.key(), 3.0).unwrap();
        handle.note_off(60).unwrap();
        let received: Vec<EngineCommand> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                EngineCommand::NoteOn { note: 60, velocity: 0.8 },
                EngineCommand::SetParameter { key: ParameterId::Osc1Wave.key(), value: 3.0 },
                EngineCommand::NoteOff { note: 60 },
            ]
        );
    }
}
