//! # Chunk Store
//!
//! Durable chunk storage with debounced writes.
//!
//! ## Write Path
//!
//! ```text
//!   save(chunk) ──> [pending: one entry per chunk, due = first save + interval]
//!                          │
//!              flusher thread wakes, writes every entry that is due
//!                          │
//!                          v
//!        <save_path>/<world>/ch#x#y#z   (temp file + rename)
//! ```
//!
//! Saving a chunk that is already pending replaces the queued copy but keeps
//! the original due time, so a burst of edits costs one disk write and the
//! last value wins. `shutdown` writes everything still pending and blocks
//! until it is on disk.
//!
//! ## File Format
//!
//! ```text
//! [4 bytes: uncompressed length, big-endian]
//! [N bytes: lz4 block of the serialized record]
//! ```
//!
//! A missing, truncated or undecodable file is reported as absent, never as
//! an error; the caller regenerates the chunk.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

use lithos_core::{Chunk, ChunkExtent};
use lithos_shared::{ChunkPosition, WorldConfig};

use crate::clock::Clock;
use crate::error::{StoreError, StoreResult};

/// Name of the world-info file inside the world directory.
pub const WORLD_INFO_FILE: &str = "world.info";

/// Largest uncompressed record accepted when reading.
const MAX_RECORD_LEN: usize = 64 * 1024 * 1024;

const WORLD_INFO_MAGIC: &[u8; 4] = b"LWLD";
const WORLD_INFO_VERSION: u8 = 1;

/// Store tuning.
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// Delay between the first save of a chunk and its disk write.
    pub min_save_interval: Duration,
    /// Spawn a background thread that writes due chunks.
    pub background_flush: bool,
    /// How often the background thread checks for due chunks.
    pub poll_interval: Duration,
    /// Edge length every loaded chunk must have; `None` accepts any extent.
    pub chunk_size: Option<u32>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            min_save_interval: lithos_shared::constants::DEFAULT_MIN_SAVE_INTERVAL,
            background_flush: true,
            poll_interval: Duration::from_millis(250),
            chunk_size: None,
        }
    }
}

impl StoreOptions {
    /// Options for a configured world.
    #[must_use]
    pub fn from_config(config: &WorldConfig) -> Self {
        let interval = config.min_save_interval();
        Self {
            min_save_interval: interval,
            poll_interval: interval.min(Self::default().poll_interval),
            chunk_size: Some(config.chunk_size),
            ..Self::default()
        }
    }

    /// Options with no background thread; the owner calls
    /// [`ChunkStore::flush_due`] itself.
    #[must_use]
    pub fn manual(min_save_interval: Duration) -> Self {
        Self {
            min_save_interval,
            background_flush: false,
            ..Self::default()
        }
    }

    /// Rejects loaded chunks whose extent is not a cube of `size` tiles.
    #[must_use]
    pub const fn with_chunk_size(mut self, size: u32) -> Self {
        self.chunk_size = Some(size);
        self
    }
}

/// Persisted world metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldInfo {
    /// World name.
    pub name: String,
    /// World seed.
    pub seed: u64,
}

impl WorldInfo {
    /// Serializes to the world-info record.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let name = self.name.as_bytes();
        let mut buf = Vec::with_capacity(17 + name.len());
        buf.extend_from_slice(WORLD_INFO_MAGIC);
        buf.push(WORLD_INFO_VERSION);
        buf.extend_from_slice(&self.seed.to_le_bytes());
        buf.extend_from_slice(&u32::try_from(name.len()).unwrap_or(u32::MAX).to_le_bytes());
        buf.extend_from_slice(name);
        buf
    }

    /// Decodes a world-info record; `None` if malformed.
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 17 || &data[..4] != WORLD_INFO_MAGIC || data[4] != WORLD_INFO_VERSION {
            return None;
        }
        let seed = u64::from_le_bytes(data[5..13].try_into().ok()?);
        let len = u32::from_le_bytes(data[13..17].try_into().ok()?) as usize;
        let name = data.get(17..17 + len)?;
        if data.len() != 17 + len {
            return None;
        }
        Some(Self {
            name: String::from_utf8(name.to_vec()).ok()?,
            seed,
        })
    }
}

/// Store counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Calls to `save`.
    pub saves_requested: u64,
    /// Chunk files written.
    pub chunks_written: u64,
    /// Chunk writes that failed.
    pub write_failures: u64,
    /// Files that existed but could not be decoded.
    pub corrupt_records: u64,
}

/// Why a record on disk could not be read back.
#[derive(Error, Debug)]
enum RecordError {
    #[error("record shorter than its length header")]
    MissingHeader,

    #[error("declared length {0} exceeds the record limit")]
    TooLarge(usize),

    #[error("decompression failed: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),

    #[error("decompressed {actual} bytes, header declared {declared}")]
    LengthMismatch { declared: usize, actual: usize },
}

struct PendingWrite {
    chunk: Chunk,
    due: Duration,
}

struct StoreInner {
    root: PathBuf,
    min_save_interval: Duration,
    extent: Option<ChunkExtent>,
    clock: Arc<dyn Clock>,
    pending: Mutex<HashMap<ChunkPosition, PendingWrite>>,
    wake: Condvar,
    /// Serializes disk writes against reads of the same files.
    write_lock: Mutex<()>,
    shutdown: AtomicBool,
    stats: Mutex<StoreStats>,
}

/// Debounced, compressed chunk storage for one world.
pub struct ChunkStore {
    inner: Arc<StoreInner>,
    flusher: Mutex<Option<JoinHandle<()>>>,
}

impl ChunkStore {
    /// Opens (creating if needed) the store rooted at a world directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>, options: StoreOptions, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;

        let inner = Arc::new(StoreInner {
            root,
            min_save_interval: options.min_save_interval,
            extent: options.chunk_size.map(ChunkExtent::cube),
            clock,
            pending: Mutex::new(HashMap::new()),
            wake: Condvar::new(),
            write_lock: Mutex::new(()),
            shutdown: AtomicBool::new(false),
            stats: Mutex::new(StoreStats::default()),
        });

        let flusher = if options.background_flush {
            let flusher_inner = Arc::clone(&inner);
            let poll = options.poll_interval;
            let handle = thread::Builder::new()
                .name("lithos-store-flush".to_string())
                .spawn(move || Self::flusher_loop(&flusher_inner, poll))
                .map_err(|source| StoreError::Io {
                    path: inner.root.clone(),
                    source,
                })?;
            Some(handle)
        } else {
            None
        };

        debug!(root = %inner.root.display(), "chunk store opened");
        Ok(Self {
            inner,
            flusher: Mutex::new(flusher),
        })
    }

    /// Flusher thread main loop.
    fn flusher_loop(inner: &StoreInner, poll: Duration) {
        loop {
            {
                let mut pending = inner.pending.lock();
                if inner.shutdown.load(Ordering::Acquire) {
                    break;
                }
                inner.wake.wait_for(&mut pending, poll);
            }
            if inner.shutdown.load(Ordering::Acquire) {
                break;
            }
            inner.flush_due();
        }
    }

    /// World directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// File a chunk is stored in.
    #[must_use]
    pub fn chunk_path(&self, position: ChunkPosition) -> PathBuf {
        self.inner.chunk_path(position)
    }

    /// Queues a chunk for writing.
    ///
    /// The write happens once the minimum save interval has passed since the
    /// chunk was first queued; later saves before then replace the queued copy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutDown`] after [`ChunkStore::shutdown`].
    pub fn save(&self, chunk: Chunk) -> StoreResult<()> {
        let now = self.inner.clock.now();
        let position = chunk.position();
        {
            let mut pending = self.inner.pending.lock();
            if self.inner.shutdown.load(Ordering::Acquire) {
                return Err(StoreError::ShutDown);
            }
            match pending.entry(position) {
                Entry::Occupied(mut slot) => slot.get_mut().chunk = chunk,
                Entry::Vacant(slot) => {
                    slot.insert(PendingWrite {
                        chunk,
                        due: now + self.inner.min_save_interval,
                    });
                }
            }
        }
        self.inner.stats.lock().saves_requested += 1;
        Ok(())
    }

    /// Returns the newest copy of a chunk, pending or on disk.
    ///
    /// `None` if the chunk was never saved or its file cannot be decoded.
    #[must_use]
    pub fn load_if_present(&self, position: ChunkPosition) -> Option<Chunk> {
        let _guard = self.inner.write_lock.lock();
        if let Some(write) = self.inner.pending.lock().get(&position) {
            return Some(write.chunk.clone());
        }

        let path = self.inner.chunk_path(position);
        let payload = self.inner.read_record(&path)?;
        match Chunk::from_bytes(&payload) {
            Ok(chunk) if self.inner.extent.is_some_and(|extent| chunk.extent() != extent) => {
                warn!(
                    path = %path.display(),
                    found = ?chunk.extent(),
                    "chunk file has the wrong dimensions, treating as absent"
                );
                self.inner.stats.lock().corrupt_records += 1;
                None
            }
            Ok(chunk) if chunk.position() == position => Some(chunk),
            Ok(chunk) => {
                warn!(
                    path = %path.display(),
                    found = %chunk.position(),
                    "chunk file holds another position, treating as absent"
                );
                self.inner.stats.lock().corrupt_records += 1;
                None
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "undecodable chunk, treating as absent");
                self.inner.stats.lock().corrupt_records += 1;
                None
            }
        }
    }

    /// Writes the world-info record immediately.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutDown`] after shutdown, or [`StoreError::Io`]
    /// if the file cannot be written.
    pub fn save_world_info(&self, info: &WorldInfo) -> StoreResult<()> {
        if self.inner.shutdown.load(Ordering::Acquire) {
            return Err(StoreError::ShutDown);
        }
        let path = self.inner.root.join(WORLD_INFO_FILE);
        let _guard = self.inner.write_lock.lock();
        write_record(&path, &info.to_bytes()).map_err(|source| StoreError::Io { path, source })
    }

    /// Reads the world-info record; `None` if absent or unreadable.
    #[must_use]
    pub fn load_world_info(&self) -> Option<WorldInfo> {
        let path = self.inner.root.join(WORLD_INFO_FILE);
        let payload = {
            let _guard = self.inner.write_lock.lock();
            self.inner.read_record(&path)?
        };
        let info = WorldInfo::from_bytes(&payload);
        if info.is_none() {
            warn!(path = %path.display(), "malformed world info, treating as absent");
        }
        info
    }

    /// Writes every pending chunk whose due time has passed.
    ///
    /// Returns the number of chunks written. Failed writes are logged and
    /// requeued.
    pub fn flush_due(&self) -> usize {
        self.inner.flush_due()
    }

    /// Writes every pending chunk regardless of due time.
    ///
    /// # Errors
    ///
    /// Returns the first write failure; the other chunks are still attempted.
    pub fn flush_all(&self) -> StoreResult<usize> {
        self.inner.flush_all()
    }

    /// Number of chunks waiting to be written.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// True if a chunk is waiting to be written.
    #[must_use]
    pub fn is_pending(&self, position: ChunkPosition) -> bool {
        self.inner.pending.lock().contains_key(&position)
    }

    /// Snapshot of the store counters.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        self.inner.stats.lock().clone()
    }

    /// True once [`ChunkStore::shutdown`] has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.load(Ordering::Acquire)
    }

    /// Stops the flusher and writes everything still pending.
    ///
    /// Blocks until all writes complete. Returns the number of chunks written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutDown`] if called a second time, or the first
    /// write failure of the final flush.
    pub fn shutdown(&self) -> StoreResult<usize> {
        if self.inner.shutdown.swap(true, Ordering::AcqRel) {
            return Err(StoreError::ShutDown);
        }
        {
            let _pending = self.inner.pending.lock();
            self.inner.wake.notify_all();
        }
        if let Some(handle) = self.flusher.lock().take() {
            if handle.join().is_err() {
                warn!("chunk store flusher panicked");
            }
        }

        let written = self.inner.flush_all()?;
        info!(written, root = %self.inner.root.display(), "chunk store shut down");
        Ok(written)
    }
}

impl Drop for ChunkStore {
    fn drop(&mut self) {
        if !self.is_shut_down() {
            if let Err(error) = self.shutdown() {
                warn!(%error, "final chunk flush failed");
            }
        }
    }
}

impl StoreInner {
    fn chunk_path(&self, position: ChunkPosition) -> PathBuf {
        self.root
            .join(format!("ch#{}#{}#{}", position.x, position.y, position.z))
    }

    fn flush_due(&self) -> usize {
        let _guard = self.write_lock.lock();
        let now = self.clock.now();
        let due = {
            let mut pending = self.pending.lock();
            let ready: Vec<ChunkPosition> = pending
                .iter()
                .filter(|(_, write)| write.due <= now)
                .map(|(position, _)| *position)
                .collect();
            ready
                .into_iter()
                .filter_map(|position| pending.remove(&position))
                .map(|write| write.chunk)
                .collect::<Vec<_>>()
        };
        let (written, _) = self.write_batch(due);
        written
    }

    fn flush_all(&self) -> StoreResult<usize> {
        let _guard = self.write_lock.lock();
        let all = self
            .pending
            .lock()
            .drain()
            .map(|(_, write)| write.chunk)
            .collect::<Vec<_>>();
        match self.write_batch(all) {
            (written, None) => Ok(written),
            (_, Some(error)) => Err(error),
        }
    }

    /// Writes chunks in position order. Caller holds `write_lock`.
    fn write_batch(&self, mut chunks: Vec<Chunk>) -> (usize, Option<StoreError>) {
        if chunks.is_empty() {
            return (0, None);
        }
        chunks.sort_by_key(Chunk::position);

        let mut written = 0;
        let mut first_error = None;
        for chunk in chunks {
            let path = self.chunk_path(chunk.position());
            match write_record(&path, &chunk.to_bytes()) {
                Ok(()) => written += 1,
                Err(source) => {
                    warn!(path = %path.display(), error = %source, "chunk write failed, requeued");
                    self.stats.lock().write_failures += 1;
                    self.requeue(chunk);
                    if first_error.is_none() {
                        first_error = Some(StoreError::Io { path, source });
                    }
                }
            }
        }

        self.stats.lock().chunks_written += written as u64;
        debug!(written, root = %self.root.display(), "flushed chunks");
        (written, first_error)
    }

    /// Puts a failed write back unless a newer copy was queued meanwhile.
    fn requeue(&self, chunk: Chunk) {
        let due = self.clock.now() + self.min_save_interval;
        self.pending
            .lock()
            .entry(chunk.position())
            .or_insert(PendingWrite { chunk, due });
    }

    /// Reads and decompresses a record; `None` if absent or unreadable.
    fn read_record(&self, path: &Path) -> Option<Vec<u8>> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return None,
            Err(error) => {
                warn!(path = %path.display(), %error, "unreadable record, treating as absent");
                return None;
            }
        };
        match decode_record(&data) {
            Ok(payload) => Some(payload),
            Err(error) => {
                warn!(path = %path.display(), %error, "corrupt record, treating as absent");
                self.stats.lock().corrupt_records += 1;
                None
            }
        }
    }
}

/// Frames and compresses a payload.
fn encode_record(payload: &[u8]) -> io::Result<Vec<u8>> {
    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "record too large"))?;
    let compressed = lz4_flex::block::compress(payload);
    let mut framed = Vec::with_capacity(4 + compressed.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(&compressed);
    Ok(framed)
}

fn decode_record(data: &[u8]) -> Result<Vec<u8>, RecordError> {
    let header: [u8; 4] = data
        .get(..4)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(RecordError::MissingHeader)?;
    let declared = u32::from_be_bytes(header) as usize;
    if declared > MAX_RECORD_LEN {
        return Err(RecordError::TooLarge(declared));
    }
    let payload = lz4_flex::block::decompress(&data[4..], declared)?;
    if payload.len() != declared {
        return Err(RecordError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }
    Ok(payload)
}

/// Writes a framed record via a sibling temp file and an atomic rename.
fn write_record(path: &Path, payload: &[u8]) -> io::Result<()> {
    let framed = encode_record(payload)?;
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    {
        let mut file = File::create(&temp)?;
        file.write_all(&framed)?;
        file.sync_all()?;
    }
    fs::rename(&temp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use lithos_core::{Tile, VoxelGrid};
    use lithos_shared::LocalTilePosition;
    use std::time::SystemTime;

    const INTERVAL: Duration = Duration::from_secs(30);

    fn temp_world(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("lithos_store_{name}_{nanos}"))
    }

    fn manual_store(root: &Path) -> (ChunkStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let store = ChunkStore::open(root, StoreOptions::manual(INTERVAL), clock.clone()).unwrap();
        (store, clock)
    }

    fn terrain_chunk(position: ChunkPosition, marker: Tile) -> Chunk {
        let mut grid = VoxelGrid::new(8, 8, 8);
        for x in 0..8 {
            for z in 0..8 {
                grid.set(x, 0, z, Tile::Ground);
                grid.set_color(x, 0, z, 90);
            }
        }
        grid.set(4, 1, 4, marker);
        Chunk::from_grid(position, 7, grid)
    }

    #[test]
    fn test_save_is_debounced() {
        let root = temp_world("debounce");
        let (store, clock) = manual_store(&root);
        let position = ChunkPosition::new(1, 0, -1);

        store.save(terrain_chunk(position, Tile::Brick)).unwrap();
        assert!(store.is_pending(position));
        assert_eq!(store.flush_due(), 0);
        assert!(!store.chunk_path(position).exists());

        clock.advance(INTERVAL);
        assert_eq!(store.flush_due(), 1);
        assert!(store.chunk_path(position).exists());
        assert_eq!(store.pending_count(), 0);

        store.shutdown().unwrap();
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_last_value_wins_without_extending_deadline() {
        let root = temp_world("last_wins");
        let (store, clock) = manual_store(&root);
        let position = ChunkPosition::ORIGIN;

        store.save(terrain_chunk(position, Tile::Brick)).unwrap();
        clock.advance(INTERVAL / 2);
        store.save(terrain_chunk(position, Tile::Wood)).unwrap();
        assert_eq!(store.pending_count(), 1);

        clock.advance(INTERVAL / 2);
        assert_eq!(store.flush_due(), 1);
        store.shutdown().unwrap();

        let (reopened, _) = manual_store(&root);
        let loaded = reopened.load_if_present(position).unwrap();
        assert_eq!(loaded.tile(LocalTilePosition::new(4, 1, 4)), Tile::Wood);
        reopened.shutdown().unwrap();
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_load_sees_pending_copy() {
        let root = temp_world("pending_read");
        let (store, _clock) = manual_store(&root);
        let chunk = terrain_chunk(ChunkPosition::new(0, 2, 0), Tile::Rock);

        store.save(chunk.clone()).unwrap();
        assert_eq!(store.load_if_present(chunk.position()), Some(chunk));

        store.shutdown().unwrap();
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_roundtrip_through_disk() {
        let root = temp_world("roundtrip");
        let (store, _clock) = manual_store(&root);
        let dense = terrain_chunk(ChunkPosition::new(-3, 0, 5), Tile::Lamp);
        let uniform = Chunk::uniform(ChunkPosition::new(0, 9, 0), 1, ChunkExtent::cube(8), Tile::Air);

        store.save(dense.clone()).unwrap();
        store.save(uniform.clone()).unwrap();
        assert_eq!(store.flush_all().unwrap(), 2);

        let (reopened, _) = manual_store(&root);
        let loaded = reopened.load_if_present(dense.position()).unwrap();
        assert!(loaded.tiles_equal(&dense));
        assert_eq!(loaded, dense);
        assert_eq!(reopened.load_if_present(uniform.position()), Some(uniform));

        store.shutdown().unwrap();
        reopened.shutdown().unwrap();
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_chunk_is_absent() {
        let root = temp_world("missing");
        let (store, _clock) = manual_store(&root);
        assert!(store.load_if_present(ChunkPosition::new(100, 100, 100)).is_none());
        assert!(store.load_world_info().is_none());
        store.shutdown().unwrap();
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_corrupt_files_are_absent() {
        let root = temp_world("corrupt");
        let (store, _clock) = manual_store(&root);

        let short = ChunkPosition::new(0, 0, 0);
        fs::write(store.chunk_path(short), [0u8, 1]).unwrap();
        assert!(store.load_if_present(short).is_none());

        let garbage = ChunkPosition::new(1, 0, 0);
        fs::write(store.chunk_path(garbage), [0, 0, 0, 40, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap();
        assert!(store.load_if_present(garbage).is_none());

        let huge = ChunkPosition::new(2, 0, 0);
        fs::write(store.chunk_path(huge), [0xFF, 0xFF, 0xFF, 0xFF, 0]).unwrap();
        assert!(store.load_if_present(huge).is_none());

        let not_a_chunk = ChunkPosition::new(3, 0, 0);
        write_record(&store.chunk_path(not_a_chunk), b"hello world").unwrap();
        assert!(store.load_if_present(not_a_chunk).is_none());

        assert!(store.stats().corrupt_records >= 3);
        store.shutdown().unwrap();
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_overflowing_dimensions_are_absent() {
        let root = temp_world("overflow");
        let (store, _clock) = manual_store(&root);

        let mut record = Chunk::uniform(ChunkPosition::ORIGIN, 0, ChunkExtent::cube(8), Tile::Air).to_bytes();
        record[25..37].fill(0xFF);
        record[37] = 1;
        write_record(&store.chunk_path(ChunkPosition::ORIGIN), &record).unwrap();

        assert!(store.load_if_present(ChunkPosition::ORIGIN).is_none());
        assert_eq!(store.stats().corrupt_records, 1);
        store.shutdown().unwrap();
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_wrongly_sized_chunk_is_absent() {
        let root = temp_world("wrong_size");
        let clock = Arc::new(ManualClock::new());
        let options = StoreOptions::manual(INTERVAL).with_chunk_size(16);
        let store = ChunkStore::open(&root, options, clock).unwrap();

        let small = terrain_chunk(ChunkPosition::ORIGIN, Tile::Rock);
        write_record(&store.chunk_path(ChunkPosition::ORIGIN), &small.to_bytes()).unwrap();
        assert!(store.load_if_present(ChunkPosition::ORIGIN).is_none());

        let fitting = Chunk::uniform(ChunkPosition::new(0, 1, 0), 0, ChunkExtent::cube(16), Tile::Rock);
        write_record(&store.chunk_path(fitting.position()), &fitting.to_bytes()).unwrap();
        assert_eq!(store.load_if_present(fitting.position()), Some(fitting));

        store.shutdown().unwrap();
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_record_header_is_big_endian_length() {
        let payload = vec![7u8; 1000];
        let framed = encode_record(&payload).unwrap();
        assert_eq!(&framed[..4], &1000u32.to_be_bytes());
        assert_eq!(decode_record(&framed).unwrap(), payload);
    }

    #[test]
    fn test_shutdown_flushes_and_runs_once() {
        let root = temp_world("shutdown");
        let (store, _clock) = manual_store(&root);
        let position = ChunkPosition::new(4, 0, 4);

        store.save(terrain_chunk(position, Tile::Sand)).unwrap();
        assert_eq!(store.shutdown().unwrap(), 1);
        assert!(store.chunk_path(position).exists());

        assert!(matches!(store.shutdown(), Err(StoreError::ShutDown)));
        assert!(matches!(
            store.save(terrain_chunk(position, Tile::Sand)),
            Err(StoreError::ShutDown)
        ));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_background_flusher_writes_due_chunks() {
        let root = temp_world("background");
        let clock = Arc::new(ManualClock::new());
        let options = StoreOptions {
            min_save_interval: INTERVAL,
            background_flush: true,
            poll_interval: Duration::from_millis(5),
            chunk_size: None,
        };
        let store = ChunkStore::open(&root, options, clock.clone()).unwrap();
        let position = ChunkPosition::new(0, 0, 1);

        store.save(terrain_chunk(position, Tile::Brick)).unwrap();
        clock.advance(INTERVAL);

        let mut waited = 0;
        while store.is_pending(position) && waited < 400 {
            thread::sleep(Duration::from_millis(5));
            waited += 1;
        }
        assert!(!store.is_pending(position));
        assert!(store.chunk_path(position).exists());

        store.shutdown().unwrap();
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_world_info_roundtrip() {
        let root = temp_world("info");
        let (store, _clock) = manual_store(&root);
        let info = WorldInfo {
            name: "overworld".to_string(),
            seed: 42,
        };
        store.save_world_info(&info).unwrap();
        assert_eq!(store.load_world_info(), Some(info));
        assert!(root.join(WORLD_INFO_FILE).exists());

        store.shutdown().unwrap();
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_world_info_rejects_garbage() {
        assert!(WorldInfo::from_bytes(b"LWLD").is_none());
        let mut bytes = WorldInfo {
            name: "a".to_string(),
            seed: 1,
        }
        .to_bytes();
        bytes.push(0);
        assert!(WorldInfo::from_bytes(&bytes).is_none());
    }
}
