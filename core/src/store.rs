use crate::error::{MatchError, Result};
use crate::index::{JobId, JobPosting};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// The three operations the index needs from a backing store.
pub trait PostingStore: Send + Sync {
    fn count(&self) -> Result<usize>;
    /// Insert all postings or none. Ids already stored, or repeated in the batch, are rejected.
    fn insert_many(&self, postings: &[JobPosting]) -> Result<()>;
    fn fetch_all(&self) -> Result<Vec<JobPosting>>;
}

/// Placeholder postings inserted into an empty store.
pub fn default_seed() -> Vec<JobPosting> {
    vec![
        JobPosting::new(1, "Software Engineer", "Develop web applications using Python and React"),
        JobPosting::new(2, "Data Scientist", "Analyze data and build ML models"),
    ]
}

/// Open a store from a connection string: `sled:<path>`, `json:<path>`, `memory:`,
/// or a bare path (sled).
pub fn open_store(uri: &str) -> Result<Box<dyn PostingStore>> {
    match uri.split_once(':') {
        Some(("sled", path)) => Ok(Box::new(SledStore::open(path)?)),
        Some(("json", path)) => Ok(Box::new(JsonFileStore::open(path)?)),
        Some(("memory", _)) => Ok(Box::new(MemoryStore::default())),
        Some((scheme, _)) if !scheme.contains(|c: char| matches!(c, '/' | '\\' | '.')) && scheme.len() > 1 => {
            Err(MatchError::InvalidArgument(format!("unknown store scheme '{scheme}'")))
        }
        _ => Ok(Box::new(SledStore::open(uri)?)),
    }
}

fn check_new_ids(postings: &[JobPosting], exists: impl Fn(JobId) -> Result<bool>) -> Result<()> {
    let mut batch = HashSet::with_capacity(postings.len());
    for p in postings {
        if !batch.insert(p.id) {
            return Err(MatchError::InvalidArgument(format!("posting id {} repeated in batch", p.id)));
        }
        if exists(p.id)? {
            return Err(MatchError::InvalidArgument(format!("posting id {} already stored", p.id)));
        }
    }
    Ok(())
}

// --- sled ---

/// Embedded sled tree keyed by big-endian id, values bincode-encoded.
pub struct SledStore {
    _db: sled::Db,
    tree: sled::Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let target = path.display().to_string();
        let db = sled::open(path).map_err(|e| MatchError::connection(&target, e))?;
        let tree = db.open_tree("postings").map_err(|e| MatchError::connection(&target, e))?;
        tracing::debug!(path = %target, "opened sled posting store");
        Ok(Self { _db: db, tree })
    }
}

fn sled_err(e: sled::Error) -> MatchError { MatchError::Store(e.to_string()) }

impl PostingStore for SledStore {
    fn count(&self) -> Result<usize> { Ok(self.tree.len()) }

    fn insert_many(&self, postings: &[JobPosting]) -> Result<()> {
        check_new_ids(postings, |id| self.tree.contains_key(id.to_be_bytes()).map_err(sled_err))?;
        let mut batch = sled::Batch::default();
        for p in postings {
            let bytes = bincode::serialize(p).map_err(|e| MatchError::Store(e.to_string()))?;
            batch.insert(p.id.to_be_bytes().to_vec(), bytes);
        }
        self.tree.apply_batch(batch).map_err(sled_err)?;
        self.tree.flush().map_err(sled_err)?;
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<JobPosting>> {
        let mut out = Vec::with_capacity(self.tree.len());
        for item in self.tree.iter() {
            let (_key, value) = item.map_err(sled_err)?;
            let posting = bincode::deserialize(&value).map_err(|e| MatchError::Store(format!("corrupt posting record: {e}")))?;
            out.push(posting);
        }
        // big-endian keys order negative ids after positive ones
        out.sort_by_key(|p: &JobPosting| p.id);
        Ok(out)
    }
}

// --- static file ---

/// A JSON array file, or one posting per line when the extension is `.jsonl`.
/// A missing file is an empty store.
pub struct JsonFileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => Err(MatchError::connection(path.display().to_string(), "path is a directory")),
            Ok(_) => Ok(Self { path, lock: RwLock::new(()) }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self { path, lock: RwLock::new(()) }),
            Err(e) => Err(MatchError::connection(path.display().to_string(), e)),
        }
    }

    fn is_jsonl(&self) -> bool { self.path.extension().and_then(|s| s.to_str()) == Some("jsonl") }

    fn io_err(&self, e: std::io::Error) -> MatchError { MatchError::connection(self.path.display().to_string(), e) }

    fn read(&self) -> Result<Vec<JobPosting>> {
        let f = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        let reader = BufReader::new(f);
        let corrupt = |e: serde_json::Error| MatchError::Store(format!("corrupt posting file: {e}"));
        if self.is_jsonl() {
            let mut out = Vec::new();
            for line in reader.lines() {
                let line = line.map_err(|e| self.io_err(e))?;
                if line.trim().is_empty() { continue; }
                out.push(serde_json::from_str(&line).map_err(corrupt)?);
            }
            Ok(out)
        } else {
            let text = std::io::read_to_string(reader).map_err(|e| self.io_err(e))?;
            if text.trim().is_empty() { return Ok(Vec::new()); }
            serde_json::from_str(&text).map_err(corrupt)
        }
    }

    /// Replace the file through a sibling temp file so a failed write never truncates it.
    fn write(&self, postings: &[JobPosting]) -> Result<()> {
        let dir = match self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            Some(d) => d.to_path_buf(),
            None => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.io_err(e))?;
        let bytes = if self.is_jsonl() {
            let mut buf = Vec::new();
            for p in postings {
                serde_json::to_writer(&mut buf, p).map_err(|e| MatchError::Store(e.to_string()))?;
                buf.push(b'\n');
            }
            buf
        } else {
            serde_json::to_vec_pretty(postings).map_err(|e| MatchError::Store(e.to_string()))?
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.io_err(e))?;
        tmp.write_all(&bytes).map_err(|e| self.io_err(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_err(e.error))?;
        Ok(())
    }
}

impl PostingStore for JsonFileStore {
    fn count(&self) -> Result<usize> {
        let _guard = self.lock.read();
        Ok(self.read()?.len())
    }

    fn insert_many(&self, postings: &[JobPosting]) -> Result<()> {
        let _guard = self.lock.write();
        let mut all = self.read()?;
        let stored: HashSet<JobId> = all.iter().map(|p| p.id).collect();
        check_new_ids(postings, |id| Ok(stored.contains(&id)))?;
        all.extend_from_slice(postings);
        self.write(&all)
    }

    fn fetch_all(&self) -> Result<Vec<JobPosting>> {
        let _guard = self.lock.read();
        self.read()
    }
}

// --- in-process ---

#[derive(Default)]
pub struct MemoryStore {
    postings: RwLock<Vec<JobPosting>>,
}

impl PostingStore for MemoryStore {
    fn count(&self) -> Result<usize> { Ok(self.postings.read().len()) }
    fn insert_many(&self, postings: &[JobPosting]) -> Result<()> {
        let mut all = self.postings.write();
        check_new_ids(postings, |id| Ok(all.iter().any(|p| p.id == id)))?;
        all.extend_from_slice(postings);
        Ok(())
    }
    fn fetch_all(&self) -> Result<Vec<JobPosting>> { Ok(self.postings.read().clone()) }
}
