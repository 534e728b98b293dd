use std::{
    sync::{mpsc, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};

use archive::StateStore;
use canvas::{CanvasStats, CanvasStore, SharedCanvas};
use chrono::Local;
use decoder::Decoder;
use log::{debug, error, info, warn};
use structures::PersistedState;

use crate::{
    errors::SnapshotError,
    publisher::{Frame, Publisher},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Unchanged,
    Published,
}

/// Persists and publishes the canvas whenever it changed since the last tick.
///
/// Any number of writes between two ticks end up in a single frame. The canvas
/// lock is only held while refreshing a private copy of the state, which takes
/// the buffer, the cooldowns and the history events added since the last tick.
/// Persisting and publishing work from that copy.
pub struct SnapshotCoordinator {
    canvas: SharedCanvas,
    store: Box<dyn StateStore>,
    publisher: Box<dyn Publisher>,
    decoder: Decoder,
    copy: PersistedState,
}

fn lock(canvas: &SharedCanvas) -> MutexGuard<'_, CanvasStore> {
    canvas.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SnapshotCoordinator {
    pub fn new(
        canvas: SharedCanvas,
        store: Box<dyn StateStore>,
        publisher: Box<dyn Publisher>,
    ) -> Self {
        Self {
            canvas,
            store,
            publisher,
            decoder: Decoder::default(),
            copy: PersistedState::default(),
        }
    }

    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Runs one cycle. A failed cycle leaves the canvas dirty so the next tick
    /// tries again.
    pub fn tick(&mut self) -> Result<TickOutcome, SnapshotError> {
        let stats = {
            let mut canvas = lock(&self.canvas);
            if !canvas.consume_dirty() {
                return Ok(TickOutcome::Unchanged);
            }
            canvas.sync_state(&mut self.copy);
            canvas.stats()
        };

        if let Err(err) = self.publish(stats) {
            lock(&self.canvas).mark_dirty();
            return Err(err);
        }

        Ok(TickOutcome::Published)
    }

    fn publish(&mut self, stats: CanvasStats) -> Result<(), SnapshotError> {
        let state = &self.copy;
        self.store.commit(state)?;

        let (image, _) = self.decoder.render(&state.buffer);
        let frame = Frame {
            body: &state.buffer,
            image: &image,
            stats,
            taken_at: Local::now(),
        };
        self.publisher.publish(&frame)?;

        Ok(())
    }

    fn tick_logged(&mut self) {
        match self.tick() {
            Ok(TickOutcome::Published) => info!("Published new frame"),
            Ok(TickOutcome::Unchanged) => debug!("Nothing changed, skipping frame"),
            Err(err) => warn!("Snapshot cycle failed, retrying next tick: {err}"),
        }
    }

    /// Ticks on a background thread, first after `first`, then every
    /// `interval`, until the handle is stopped. Stopping runs one last tick.
    pub fn spawn(mut self, first: Duration, interval: Duration) -> CoordinatorHandle {
        let (stop, stopped) = mpsc::channel::<()>();

        let thread = thread::spawn(move || {
            let mut wait = first;
            loop {
                match stopped.recv_timeout(wait) {
                    Err(mpsc::RecvTimeoutError::Timeout) => self.tick_logged(),
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                        self.tick_logged();
                        break;
                    }
                }
                wait = interval;
            }
        });

        CoordinatorHandle { stop, thread }
    }
}

pub struct CoordinatorHandle {
    stop: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

impl CoordinatorHandle {
    /// Stops the loop after a final flush and waits for it.
    pub fn stop(self) {
        // the loop also ends when the sender is dropped, so a failed send is fine
        self.stop.send(()).ok();
        if self.thread.join().is_err() {
            error!("Snapshot thread panicked");
        }
    }
}
