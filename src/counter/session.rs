use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use super::{CounterConfig, RepCounter, RepState, Tick};
use crate::pose::Pose;

/// Per-session counter cell that can be shared across threads.
///
/// Frame capture and inference may run anywhere; every state update goes
/// through the mutex, so a session sees one serialized sequence of ticks.
#[derive(Clone, Debug)]
pub struct SharedCounter {
    inner: Arc<Mutex<RepCounter>>,
}

impl SharedCounter {
    pub fn new(config: CounterConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RepCounter::new(config))),
        }
    }

    pub fn update(&self, pose: &Pose, frame_height: f32) -> Result<Tick> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("rep counter lock poisoned"))?;
        Ok(guard.update(pose, frame_height))
    }

    pub fn snapshot(&self) -> Result<RepState> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("rep counter lock poisoned"))?;
        Ok(guard.state())
    }

    /// Start a new counting session.
    pub fn reset(&self) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("rep counter lock poisoned"))?;
        guard.reset();
        Ok(())
    }
}

impl Default for SharedCounter {
    fn default() -> Self {
        Self::new(CounterConfig::default())
    }
}
