use std::{collections::HashMap, sync::Arc};

use log::{debug, info};
use structures::{PersistedState, WriteEvent, ADMIN_CALLER, BUFFER_LEN};

use crate::{
    audit::{AuditLog, MemoryAuditLog},
    clock::Clock,
    config::{CanvasConfig, RETALIATION_LIMIT_SECONDS, TOLERANCE_SECONDS},
    errors::CanvasError,
    stats::CanvasStats,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WriteOutcome {
    Accepted,
    /// The caller has to wait `remaining` more seconds.
    RateLimited { remaining: f64 },
}

impl WriteOutcome {
    /// Seconds left to wait; negative when the write went through.
    pub fn remaining_seconds(&self) -> f64 {
        match self {
            WriteOutcome::Accepted => -1.0,
            WriteOutcome::RateLimited { remaining } => *remaining,
        }
    }
}

/// Owner of the canvas body and everything that decides who may change it.
///
/// A caller's cooldown timestamp means "last accepted write" while it lies in
/// the past and "blocked until" once it lies in the future. Cooldown
/// retaliation and bans both push it forward; any future timestamp is treated
/// as a ban, however it got there.
pub struct CanvasStore {
    buffer: Vec<u8>,
    cooldowns: HashMap<String, f64>,
    history: Box<dyn AuditLog>,
    dirty: bool,
    config: CanvasConfig,
    clock: Arc<dyn Clock>,
}

impl CanvasStore {
    pub fn new(config: CanvasConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            buffer: vec![0; BUFFER_LEN],
            cooldowns: HashMap::new(),
            history: Box::<MemoryAuditLog>::default(),
            dirty: false,
            config,
            clock,
        }
    }

    pub fn from_state(
        state: PersistedState,
        config: CanvasConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CanvasError> {
        if state.buffer.len() != BUFFER_LEN {
            return Err(CanvasError::BufferLength {
                expected: BUFFER_LEN,
                actual: state.buffer.len(),
            });
        }

        Ok(Self {
            buffer: state.buffer,
            cooldowns: state.cooldowns,
            history: Box::new(MemoryAuditLog::from(state.history)),
            dirty: false,
            config,
            clock,
        })
    }

    pub fn with_audit_log(mut self, history: Box<dyn AuditLog>) -> Self {
        self.history = history;
        self
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn body(&self) -> &[u8] {
        &self.buffer
    }

    pub fn history(&self) -> &[WriteEvent] {
        self.history.events()
    }

    pub fn cooldown_of(&self, caller: &str) -> Option<f64> {
        self.cooldowns.get(caller).copied()
    }

    fn check_offset(&self, offset: usize) -> Result<(), CanvasError> {
        if offset >= self.buffer.len() {
            return Err(CanvasError::InvalidOffset {
                offset,
                len: self.buffer.len(),
            });
        }
        Ok(())
    }

    fn apply(&mut self, caller: &str, now: f64, offset: usize, value: u8) {
        self.history.append(WriteEvent {
            caller: caller.to_string(),
            at: now,
            offset: offset as u32,
            value,
        });
        self.buffer[offset] = value;
        self.dirty = true;
    }

    /// Sets one byte on behalf of `caller`, subject to their cooldown.
    ///
    /// An early retry while the remaining wait is short re-arms the full
    /// cooldown. Longer waits are bans and stay untouched.
    pub fn write(
        &mut self,
        offset: usize,
        value: u8,
        caller: &str,
    ) -> Result<WriteOutcome, CanvasError> {
        self.check_offset(offset)?;
        let now = self.clock.now();

        if let Some(last) = self.cooldowns.get_mut(caller) {
            let remaining = *last + self.config.cooldown_seconds - now;
            if remaining > TOLERANCE_SECONDS {
                if remaining < RETALIATION_LIMIT_SECONDS {
                    *last = now;
                    debug!("{caller} retried {remaining:.2}s early, cooldown reset");
                } else {
                    debug!("{caller} is blocked for {remaining:.0}s");
                }
                return Ok(WriteOutcome::RateLimited { remaining });
            }
        }

        self.cooldowns.insert(caller.to_string(), now);
        self.apply(caller, now, offset, value);
        debug!("{caller} set byte {offset} to {value}");

        Ok(WriteOutcome::Accepted)
    }

    /// Blocks `caller` for `seconds`. Negative durations count as zero.
    pub fn ban(&mut self, caller: &str, seconds: f64) {
        let until = self.clock.now() + seconds.max(0.0);
        self.cooldowns.insert(caller.to_string(), until);
        info!("Banned {caller} for {:.0}s", seconds.max(0.0));
    }

    /// Lets `caller` write again right away, lifting cooldowns and bans.
    pub fn pardon(&mut self, caller: &str) {
        self.cooldowns.insert(caller.to_string(), 0.0);
        info!("Reset cooldown of {caller}");
    }

    /// Zeroes a byte, bypassing every cooldown.
    pub fn force_clear(&mut self, offset: usize) -> Result<(), CanvasError> {
        self.check_offset(offset)?;
        let now = self.clock.now();

        self.cooldowns.insert(ADMIN_CALLER.to_string(), now);
        self.apply(ADMIN_CALLER, now, offset, 0);
        info!("Force-cleared byte {offset}");

        Ok(())
    }

    pub fn stats(&self) -> CanvasStats {
        let now = self.clock.now();
        let stale_before = now - self.config.stale_after_seconds;
        let mut stats = CanvasStats {
            bytes_written: self.history.len(),
            ..CanvasStats::default()
        };

        for last in self.cooldowns.values() {
            if *last < stale_before {
                stats.old += 1;
            } else if *last > now {
                stats.banned += 1;
            } else {
                stats.current += 1;
            }
        }

        stats
    }

    /// Returns whether anything changed since the last call, and forgets it.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Re-arms the dirty flag after a publish cycle failed to complete.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn to_state(&self) -> PersistedState {
        let mut state = PersistedState::default();
        self.sync_state(&mut state);
        state
    }

    /// Brings a copy of the state up to date. The history is append-only, so
    /// only events past the end of `state.history` are copied.
    pub fn sync_state(&self, state: &mut PersistedState) {
        state.buffer.clone_from(&self.buffer);
        state.cooldowns.clone_from(&self.cooldowns);
        if let Some(new_events) = self.history.events().get(state.history.len()..) {
            state.history.extend_from_slice(new_events);
        }
    }
}
