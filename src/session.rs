//! Session context: the all-time streak record and where it is kept.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Key the record is stored under.
pub const RECORD_KEY: &str = "best_combo";
const FILENAME: &str = "records";
const APP_DIR: &str = "emoji-smash";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad record line {line:?}")]
    Parse { line: String },
    #[error("record slot poisoned by a panicked writer")]
    Poisoned,
}

/// Load/save hooks for the all-time record.
pub trait RecordStore {
    fn load(&self) -> Result<u32, RecordError>;
    fn save(&self, best_combo: u32) -> Result<(), RecordError>;
}

/// `<config dir>/emoji-smash`, honouring XDG_CONFIG_HOME then HOME.
pub fn config_dir() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join(APP_DIR)
}

/// `key=value` file on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the default config location.
    pub fn in_config_dir() -> Self {
        Self::new(config_dir().join(FILENAME))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl RecordStore for FileStore {
    /// Missing file reads as 0.
    fn load(&self) -> Result<u32, RecordError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if key.trim() == RECORD_KEY {
                return value.trim().parse().map_err(|_| RecordError::Parse {
                    line: line.to_string(),
                });
            }
        }
        Ok(0)
    }

    fn save(&self, best_combo: u32) -> Result<(), RecordError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = fs::File::create(&self.path)?;
        writeln!(f, "{}={}", RECORD_KEY, best_combo)?;
        Ok(())
    }
}

/// In-memory store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<u32>>,
}

impl MemoryStore {
    pub fn new(initial: u32) -> Self {
        Self {
            slot: Arc::new(Mutex::new(initial)),
        }
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<u32, RecordError> {
        self.slot
            .lock()
            .map(|v| *v)
            .map_err(|_| RecordError::Poisoned)
    }

    fn save(&self, best_combo: u32) -> Result<(), RecordError> {
        let mut v = self.slot.lock().map_err(|_| RecordError::Poisoned)?;
        *v = best_combo;
        Ok(())
    }
}

/// Values that outlive a round: the all-time streak and rounds played.
pub struct Session {
    all_time_combo: u32,
    rounds_played: u32,
    store: Box<dyn RecordStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("all_time_combo", &self.all_time_combo)
            .field("rounds_played", &self.rounds_played)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open a session, loading the record. Load failures start from 0.
    pub fn open(store: Box<dyn RecordStore>) -> Self {
        let all_time_combo = match store.load() {
            Ok(v) => {
                log::info!("loaded all-time combo record {}", v);
                v
            }
            Err(e) => {
                log::warn!("could not load combo record, starting at 0: {}", e);
                0
            }
        };
        Self {
            all_time_combo,
            rounds_played: 0,
            store,
        }
    }

    pub fn all_time_combo(&self) -> u32 {
        self.all_time_combo
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    /// Fold a finished round's record in. Saves only when the record improved.
    /// Returns true if it did.
    pub fn finish_round(&mut self, all_time_combo: u32) -> bool {
        self.rounds_played += 1;
        self.fold_record(all_time_combo)
    }

    /// Fold in the record of a round that did not run to the end (abandoned
    /// or exited). Saves on improvement without counting a finished round.
    pub fn fold_record(&mut self, all_time_combo: u32) -> bool {
        if all_time_combo <= self.all_time_combo {
            return false;
        }
        self.all_time_combo = all_time_combo;
        match self.store.save(all_time_combo) {
            Ok(()) => log::info!("saved all-time combo record {}", all_time_combo),
            Err(e) => log::error!("could not save combo record: {}", e),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("emoji-smash-test-{}-{}", std::process::id(), name))
            .join(FILENAME)
    }

    #[test]
    fn file_store_round_trips_under_single_key() {
        let store = FileStore::new(temp_path("roundtrip"));
        assert_eq!(store.load().unwrap(), 0);
        store.save(17).unwrap();
        assert_eq!(store.load().unwrap(), 17);
        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.trim(), "best_combo=17");
        let _ = fs::remove_dir_all(store.path().parent().unwrap());
    }

    #[test]
    fn file_store_rejects_garbage() {
        let store = FileStore::new(temp_path("garbage"));
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "best_combo=lots\n").unwrap();
        assert!(matches!(store.load(), Err(RecordError::Parse { .. })));
        let _ = fs::remove_dir_all(store.path().parent().unwrap());
    }

    #[test]
    fn session_only_saves_improvements() {
        let store = MemoryStore::new(5);
        let mut session = Session::open(Box::new(store.clone()));
        assert_eq!(session.all_time_combo(), 5);
        assert!(!session.finish_round(3));
        assert_eq!(store.load().unwrap(), 5);
        assert!(session.finish_round(9));
        assert_eq!(store.load().unwrap(), 9);
        assert_eq!(session.all_time_combo(), 9);
        assert_eq!(session.rounds_played(), 2);
    }

    #[test]
    fn folding_an_unfinished_round_keeps_the_count() {
        let store = MemoryStore::new(2);
        let mut session = Session::open(Box::new(store.clone()));
        assert!(session.fold_record(6));
        assert!(!session.fold_record(4));
        assert_eq!(session.all_time_combo(), 6);
        assert_eq!(store.load().unwrap(), 6);
        assert_eq!(session.rounds_played(), 0);
    }

    #[test]
    fn poisoned_memory_store_reports_an_error() {
        let store = MemoryStore::new(3);
        let writer = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = writer.slot.lock().unwrap();
            panic!("writer died holding the slot");
        })
        .join();
        assert!(matches!(store.load(), Err(RecordError::Poisoned)));
        assert!(matches!(store.save(4), Err(RecordError::Poisoned)));
        let session = Session::open(Box::new(store));
        assert_eq!(session.all_time_combo(), 0);
    }
}
