// Togglable named performance timer; disabled timers record nothing.
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct DebugTimer {
    enabled: bool,
    timings: HashMap<String, Instant>,
}

impl DebugTimer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling discards any pending timings.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.timings.clear();
        }
    }

    pub fn start(&mut self, name: &str) {
        if !self.enabled {
            return;
        }
        self.timings.insert(name.to_string(), Instant::now());
    }

    /// Stops `name`, reports the elapsed time through the logging sink, and
    /// returns it. `None` when disabled or when no matching start exists.
    pub fn stop(&mut self, name: &str) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        let start = self.timings.remove(name)?;
        let elapsed = start.elapsed();
        tracing::debug!(name, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "timing");
        Some(elapsed)
    }
}
