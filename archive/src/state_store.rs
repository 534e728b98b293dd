use std::{
    fs::File,
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};
use structures::{PersistedState, BUFFER_LEN};
use tempfile::NamedTempFile;

use crate::{constants::bincode_config, errors::ArchiveError};

/// Transactional home of the canvas state.
///
/// `commit` either replaces the stored state completely or leaves the previous
/// one in place.
pub trait StateStore: Send {
    fn load(&mut self) -> Result<PersistedState, ArchiveError>;
    fn commit(&mut self, state: &PersistedState) -> Result<(), ArchiveError>;
}

/// Keeps the state in a single file, replaced atomically on every commit.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl StateStore for FileStateStore {
    fn load(&mut self) -> Result<PersistedState, ArchiveError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("No state at {}, starting empty", self.path.display());
                return Ok(PersistedState::default());
            }
            Err(err) => return Err(err.into()),
        };

        let mut reader = BufReader::new(file);
        let state: PersistedState = bincode::decode_from_std_read(&mut reader, bincode_config())?;

        if state.buffer.len() != BUFFER_LEN {
            return Err(ArchiveError::BufferLength {
                expected: BUFFER_LEN,
                actual: state.buffer.len(),
            });
        }

        debug!(
            "Loaded state from {}: {} callers, {} events",
            self.path.display(),
            state.cooldowns.len(),
            state.history.len()
        );

        Ok(state)
    }

    fn commit(&mut self, state: &PersistedState) -> Result<(), ArchiveError> {
        let mut temp = NamedTempFile::new_in(self.directory())?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            bincode::encode_into_std_write(state, &mut writer, bincode_config())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path)?;

        debug!("Committed state to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use structures::WriteEvent;

    #[test]
    fn missing_file_loads_default_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStateStore::new(dir.path().join("state.bin"));

        assert_eq!(store.load().unwrap(), PersistedState::default());
    }

    #[test]
    fn committed_state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");

        let mut state = PersistedState::default();
        rand::thread_rng().fill(&mut state.buffer[..4096]);
        state.cooldowns.insert("42".to_string(), 1_700_000_000.25);
        state.history.push(WriteEvent {
            caller: "42".to_string(),
            at: 1_700_000_000.25,
            offset: 17,
            value: 0xfe,
        });

        FileStateStore::new(&path).commit(&state).unwrap();
        let loaded = FileStateStore::new(&path).load().unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn commit_replaces_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStateStore::new(dir.path().join("state.bin"));

        let mut state = PersistedState::default();
        store.commit(&state).unwrap();
        state.buffer[0] = 7;
        store.commit(&state).unwrap();

        assert_eq!(store.load().unwrap().buffer[0], 7);
        // only the state file remains, no leftover temp files
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStateStore::new(dir.path().join("state.bin"));

        let mut state = PersistedState::default();
        state.buffer.truncate(10);
        store.commit(&state).unwrap();

        assert!(matches!(
            store.load(),
            Err(ArchiveError::BufferLength { actual: 10, .. })
        ));
    }

    #[test]
    fn garbage_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");
        std::fs::write(&path, [0xff; 3]).unwrap();

        assert!(matches!(
            FileStateStore::new(&path).load(),
            Err(ArchiveError::Decode(_))
        ));
    }
}
