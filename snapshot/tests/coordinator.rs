use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use archive::{ArchiveError, FileStateStore, StateStore};
use canvas::{CanvasConfig, CanvasStore, ManualClock, SharedCanvas};
use snapshot::{
    FilePublisher, Frame, PublishError, Publisher, SnapshotCoordinator, SnapshotError, TickOutcome,
};
use structures::PersistedState;

#[derive(Default)]
struct Recorded {
    frames: Vec<(Vec<u8>, [u8; 3], usize)>,
    commits: usize,
    history_lengths: Vec<usize>,
}

struct RecordingPublisher(Arc<Mutex<Recorded>>);

impl Publisher for RecordingPublisher {
    fn publish(&mut self, frame: &Frame) -> Result<(), PublishError> {
        let first = frame.image.get_pixel(0, 0).0;
        self.0.lock().unwrap().frames.push((
            frame.body[..8].to_vec(),
            first,
            frame.stats.bytes_written,
        ));
        Ok(())
    }
}

/// Fails the first `failures` commits.
struct FlakyStore {
    failures: usize,
    recorded: Arc<Mutex<Recorded>>,
}

impl StateStore for FlakyStore {
    fn load(&mut self) -> Result<PersistedState, ArchiveError> {
        Ok(PersistedState::default())
    }

    fn commit(&mut self, state: &PersistedState) -> Result<(), ArchiveError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
        }
        let mut recorded = self.recorded.lock().unwrap();
        recorded.commits += 1;
        recorded.history_lengths.push(state.history.len());
        Ok(())
    }
}

fn setup(failures: usize) -> (SharedCanvas, SnapshotCoordinator, Arc<Mutex<Recorded>>) {
    env_logger::try_init().ok();
    let clock = Arc::new(ManualClock::new(1_700_000_000.0));
    let canvas: SharedCanvas = Arc::new(Mutex::new(CanvasStore::new(
        CanvasConfig::default(),
        clock,
    )));
    let recorded = Arc::new(Mutex::new(Recorded::default()));

    let coordinator = SnapshotCoordinator::new(
        canvas.clone(),
        Box::new(FlakyStore {
            failures,
            recorded: recorded.clone(),
        }),
        Box::new(RecordingPublisher(recorded.clone())),
    );

    (canvas, coordinator, recorded)
}

#[test]
fn clean_canvas_is_not_published() {
    let (_canvas, mut coordinator, recorded) = setup(0);

    assert_eq!(coordinator.tick().unwrap(), TickOutcome::Unchanged);
    assert!(recorded.lock().unwrap().frames.is_empty());
}

#[test]
fn many_writes_coalesce_into_one_frame() {
    let (canvas, mut coordinator, recorded) = setup(0);

    {
        let mut canvas = canvas.lock().unwrap();
        for (i, value) in [0xfe, 10, 20, 30].into_iter().enumerate() {
            canvas.write(i, value, &format!("caller{i}")).unwrap();
        }
    }

    assert_eq!(coordinator.tick().unwrap(), TickOutcome::Published);
    assert_eq!(coordinator.tick().unwrap(), TickOutcome::Unchanged);

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.commits, 1);
    assert_eq!(recorded.frames.len(), 1);
    let (body, first_pixel, bytes_written) = &recorded.frames[0];
    assert_eq!(&body[..4], &[0xfe, 10, 20, 30]);
    assert_eq!(first_pixel, &[10, 20, 30]);
    assert_eq!(*bytes_written, 4);
}

#[test]
fn failed_commit_is_retried_next_tick() {
    let (canvas, mut coordinator, recorded) = setup(1);

    canvas.lock().unwrap().force_clear(3).unwrap();

    assert!(matches!(coordinator.tick(), Err(SnapshotError::Persist(_))));
    assert!(canvas.lock().unwrap().is_dirty());
    assert!(recorded.lock().unwrap().frames.is_empty());

    assert_eq!(coordinator.tick().unwrap(), TickOutcome::Published);
    assert!(!canvas.lock().unwrap().is_dirty());
    assert_eq!(recorded.lock().unwrap().frames.len(), 1);
}

#[test]
fn stopping_flushes_pending_writes() {
    let (canvas, coordinator, recorded) = setup(0);

    let handle = coordinator.spawn(Duration::from_secs(3600), Duration::from_secs(3600));
    canvas.lock().unwrap().write(0, 0xfe, "alice").unwrap();
    handle.stop();

    assert_eq!(recorded.lock().unwrap().frames.len(), 1);
}

#[test]
fn file_backed_cycle_persists_and_publishes() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.bin");
    let frames = dir.path().join("frames");

    let clock = Arc::new(ManualClock::new(1_700_000_000.0));
    let canvas: SharedCanvas = Arc::new(Mutex::new(CanvasStore::new(
        CanvasConfig::default(),
        clock,
    )));
    let mut coordinator = SnapshotCoordinator::new(
        canvas.clone(),
        Box::new(FileStateStore::new(&state_path)),
        Box::new(FilePublisher::new(&frames)),
    );

    canvas.lock().unwrap().write(100, 42, "alice").unwrap();
    coordinator.tick().unwrap();

    let state = FileStateStore::new(&state_path).load().unwrap();
    assert_eq!(state.buffer[100], 42);
    assert_eq!(state.history.len(), 1);

    let published: Vec<_> = std::fs::read_dir(&frames)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(published.len(), 2);
    assert!(published.iter().any(|p| p.extension().unwrap() == "qoi"));
    assert!(published.iter().any(|p| p.extension().unwrap() == "png"));
}

#[test]
fn commits_carry_the_full_history_across_ticks() {
    let (canvas, mut coordinator, recorded) = setup(1);

    canvas.lock().unwrap().write(0, 1, "alice").unwrap();
    assert!(coordinator.tick().is_err());
    canvas.lock().unwrap().write(1, 2, "bob").unwrap();
    assert_eq!(coordinator.tick().unwrap(), TickOutcome::Published);
    canvas.lock().unwrap().force_clear(0).unwrap();
    assert_eq!(coordinator.tick().unwrap(), TickOutcome::Published);

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.history_lengths, vec![2, 3]);
    assert_eq!(recorded.frames.last().unwrap().0[..2], [0, 2]);
}
