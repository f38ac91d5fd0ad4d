//! Local persistence: a minimal key-value capability and the history store
//! built on top of it.
//!
//! The log lives under a single fixed key as `{"problems": [...]}` with the
//! newest record first, and every write replaces the whole log. Access is
//! single-client and single-threaded; a second process on the same data
//! directory is out of scope.
//!
//! Read failures degrade to an empty log so a corrupt or missing store
//! never blocks the app; write failures surface as storage errors because
//! an append must not be dropped silently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::domain::{NewProblem, ProblemRecord};
use crate::error::Error;
use crate::util::now_millis;

/// Storage key holding the serialized history log.
pub const PROBLEM_HISTORY_KEY: &str = "math_problem_history";

/// Minimal get/set/delete-by-key persistence capability. One file-backed
/// implementation for the real app, one in-memory for tests.
pub trait KvStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>, Error>;
  fn set(&self, key: &str, value: &str) -> Result<(), Error>;
  fn delete(&self, key: &str) -> Result<(), Error>;
}

/// One file per key under a data directory.
pub struct FileKvStore {
  dir: PathBuf,
}

impl FileKvStore {
  pub fn open(dir: impl AsRef<Path>) -> Result<Self, Error> {
    let dir = dir.as_ref().to_path_buf();
    std::fs::create_dir_all(&dir)
      .map_err(|e| Error::Storage(format!("cannot create data dir {}: {}", dir.display(), e)))?;
    Ok(Self { dir })
  }

  fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{}.json", key))
  }
}

impl KvStore for FileKvStore {
  fn get(&self, key: &str) -> Result<Option<String>, Error> {
    let path = self.path_for(key);
    match std::fs::read_to_string(&path) {
      Ok(s) => Ok(Some(s)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(Error::Storage(format!("read {}: {}", path.display(), e))),
    }
  }

  fn set(&self, key: &str, value: &str) -> Result<(), Error> {
    let path = self.path_for(key);
    std::fs::write(&path, value)
      .map_err(|e| Error::Storage(format!("write {}: {}", path.display(), e)))
  }

  fn delete(&self, key: &str) -> Result<(), Error> {
    let path = self.path_for(key);
    match std::fs::remove_file(&path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(Error::Storage(format!("delete {}: {}", path.display(), e))),
    }
  }
}

/// In-memory store for tests and as a fallback when the data directory is
/// unusable.
#[derive(Default)]
pub struct MemoryKvStore {
  inner: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KvStore for MemoryKvStore {
  fn get(&self, key: &str) -> Result<Option<String>, Error> {
    Ok(self.inner.lock().unwrap().get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), Error> {
    self.inner.lock().unwrap().insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn delete(&self, key: &str) -> Result<(), Error> {
    self.inner.lock().unwrap().remove(key);
    Ok(())
  }
}

/// Serialization envelope, kept identical to the original storage format.
#[derive(Serialize, Deserialize, Default)]
struct ProblemHistory {
  problems: Vec<ProblemRecord>,
}

/// Append-only (prepend) history of solved problems over a `KvStore`.
pub struct HistoryStore {
  kv: Box<dyn KvStore>,
  key: String,
}

impl HistoryStore {
  pub fn new(kv: Box<dyn KvStore>) -> Self {
    Self::with_key(kv, PROBLEM_HISTORY_KEY)
  }

  /// Injected key name, mostly for tests running against a shared store.
  pub fn with_key(kv: Box<dyn KvStore>, key: &str) -> Self {
    Self { kv, key: key.to_string() }
  }

  /// Assign id + timestamp, prepend, persist the whole log, return the
  /// stored record. Persistence failures propagate; the append is never
  /// silently dropped.
  #[instrument(level = "debug", skip(self, input), fields(topic = %input.topic))]
  pub fn append(&self, input: NewProblem) -> Result<ProblemRecord, Error> {
    let mut history = self.load_or_empty();

    let now = now_millis();
    // Ids are time-derived; two appends in the same millisecond bump past
    // the newest stored id to keep ids unique and ordered.
    let id_num = match history.problems.first().and_then(|r| r.id.parse::<i64>().ok()) {
      Some(newest) if newest >= now => newest + 1,
      _ => now,
    };

    let record = ProblemRecord {
      id: id_num.to_string(),
      topic: input.topic,
      problem: input.problem,
      solution: input.solution,
      is_correct: input.is_correct,
      timestamp: now,
    };

    history.problems.insert(0, record.clone());
    let serialized = serde_json::to_string(&history)
      .map_err(|e| Error::Storage(format!("serialize history: {}", e)))?;
    self.kv.set(&self.key, &serialized)?;

    info!(target: "history", id = %record.id, topic = %record.topic, correct = record.is_correct, total = history.problems.len(), "Recorded solved problem");
    Ok(record)
  }

  /// Full log, newest first. Never fails: an unreadable or corrupt store is
  /// reported as empty.
  #[instrument(level = "debug", skip(self))]
  pub fn read_all(&self) -> Vec<ProblemRecord> {
    self.load_or_empty().problems
  }

  /// Remove the log entirely. Idempotent.
  #[instrument(level = "debug", skip(self))]
  pub fn clear(&self) -> Result<(), Error> {
    self.kv.delete(&self.key)?;
    info!(target: "history", "History cleared");
    Ok(())
  }

  fn load_or_empty(&self) -> ProblemHistory {
    match self.kv.get(&self.key) {
      Ok(Some(raw)) => match serde_json::from_str::<ProblemHistory>(&raw) {
        Ok(h) => h,
        Err(e) => {
          warn!(target: "history", error = %e, "Corrupt history payload; starting from an empty log");
          ProblemHistory::default()
        }
      },
      Ok(None) => ProblemHistory::default(),
      Err(e) => {
        warn!(target: "history", error = %e, "History read failed; starting from an empty log");
        ProblemHistory::default()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_problem(topic: &str, correct: bool) -> NewProblem {
    NewProblem {
      topic: topic.into(),
      problem: "문제 본문".into(),
      solution: "해답 본문".into(),
      is_correct: correct,
    }
  }

  fn memory_store() -> HistoryStore {
    HistoryStore::new(Box::new(MemoryKvStore::new()))
  }

  #[test]
  fn append_prepends_and_grows_by_one() {
    let store = memory_store();
    store.append(new_problem("algebra", true)).unwrap();
    let latest = store.append(new_problem("geometry", false)).unwrap();

    let log = store.read_all();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0], latest);
    assert_eq!(log[0].topic, "geometry");
    assert_eq!(log[1].topic, "algebra");
  }

  #[test]
  fn ids_stay_unique_under_rapid_appends() {
    let store = memory_store();
    for _ in 0..20 {
      store.append(new_problem("algebra", true)).unwrap();
    }
    let log = store.read_all();
    let mut ids: Vec<&str> = log.iter().map(|r| r.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 20);
  }

  #[test]
  fn read_all_on_fresh_store_is_empty() {
    assert!(memory_store().read_all().is_empty());
  }

  #[test]
  fn corrupt_payload_degrades_to_empty() {
    let kv = MemoryKvStore::new();
    kv.set(PROBLEM_HISTORY_KEY, "not json at all").unwrap();
    let store = HistoryStore::new(Box::new(kv));
    assert!(store.read_all().is_empty());
  }

  #[test]
  fn clear_is_idempotent() {
    let store = memory_store();
    store.append(new_problem("algebra", true)).unwrap();
    store.clear().unwrap();
    assert!(store.read_all().is_empty());
    // Clearing an already-empty log is not an error.
    store.clear().unwrap();
  }

  #[test]
  fn history_round_trips_through_the_file_store() {
    let dir = tempfile::tempdir().unwrap();

    let written = {
      let store = HistoryStore::new(Box::new(FileKvStore::open(dir.path()).unwrap()));
      store.append(new_problem("calculus", true)).unwrap();
      store.append(new_problem("probability", false)).unwrap();
      store.read_all()
    };

    // A fresh store over the same directory sees the identical log.
    let reopened = HistoryStore::new(Box::new(FileKvStore::open(dir.path()).unwrap()));
    assert_eq!(reopened.read_all(), written);
  }

  #[test]
  fn file_store_delete_of_missing_key_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let kv = FileKvStore::open(dir.path()).unwrap();
    kv.delete("never_written").unwrap();
    assert_eq!(kv.get("never_written").unwrap(), None);
  }
}
