//! # Chunk Streaming
//!
//! Sits between the consumer (the renderer) and the authoritative chunk
//! source.
//!
//! ## Architecture
//!
//! ```text
//!   get_chunks ──┐
//!   worker tick ─┼──> [ChunkCache] ──miss──> [ChunkSource] ──> store / generator
//!   apply_edit ──┘    (one fetch per position, concurrent callers wait)
//!
//!   worker tick ──> [Materializer] ──> built outputs, keyed by position
//! ```
//!
//! ## Worker
//!
//! Each tick looks for the first chunk near the centre that has no current
//! output (centre, then the 3x3x3 ring, then the 5x5x5 ring), builds exactly
//! that one, then evicts everything farther than the eviction distance.
//! A chunk whose fetch or build fails is skipped for a number of ticks that
//! doubles with each consecutive failure (capped at
//! [`MAX_RETRY_BACKOFF_TICKS`]), so the rest of the area keeps streaming.
//!
//! ## Rebuilds
//!
//! Every position carries a version. An edit bumps the versions of every
//! chunk it affects; a build records the version it started from and is
//! dropped if that version moved while it ran, and the materializer is told
//! through [`Materializer::discarded`]. Chunks are immutable behind
//! `Arc`, so a build always sees one consistent snapshot.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, info, warn};

use lithos_core::Chunk;
use lithos_shared::constants::{DEFAULT_RENDER_DISTANCE, DEFAULT_STREAM_TICK, STREAM_SEARCH_RADIUS};
use lithos_shared::{ChunkPosition, WorldConfig, SMOOTHING_BORDER};

use crate::edit::{affected_chunks, TileEdit};
use crate::error::{FetchError, FetchResult};
use crate::generator::WorldGenerator;
use crate::store::ChunkStore;

/// Longest a failing chunk is skipped before the worker retries it.
pub const MAX_RETRY_BACKOFF_TICKS: u64 = 64;

// =============================================================================
// SOURCES
// =============================================================================

/// Authoritative provider of chunks.
pub trait ChunkSource: Send + Sync {
    /// Produces the chunk at a position.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Unavailable`] if the chunk cannot be provided.
    fn fetch(&self, position: ChunkPosition) -> FetchResult<Chunk>;

    /// Records an edited chunk.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Unavailable`] if the chunk cannot be recorded.
    fn persist(&self, chunk: &Chunk) -> FetchResult<()> {
        let _ = chunk;
        Ok(())
    }
}

impl ChunkSource for WorldGenerator {
    fn fetch(&self, position: ChunkPosition) -> FetchResult<Chunk> {
        Ok(self.generate_chunk(position))
    }
}

/// Loads chunks from the store, generating the ones it does not have.
///
/// Freshly generated chunks are not written back; they are reproducible from
/// the seed. Only edited chunks reach the disk.
pub struct StoreBackedSource {
    store: Arc<ChunkStore>,
    generator: WorldGenerator,
}

impl StoreBackedSource {
    /// Creates a source over a store and a generator.
    #[must_use]
    pub const fn new(store: Arc<ChunkStore>, generator: WorldGenerator) -> Self {
        Self { store, generator }
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.store
    }
}

impl ChunkSource for StoreBackedSource {
    fn fetch(&self, position: ChunkPosition) -> FetchResult<Chunk> {
        if let Some(chunk) = self.store.load_if_present(position) {
            return Ok(chunk);
        }
        if self.store.is_shut_down() {
            return Err(FetchError::Unavailable {
                position,
                reason: "chunk store is shut down".to_string(),
            });
        }
        Ok(self.generator.generate_chunk(position))
    }

    fn persist(&self, chunk: &Chunk) -> FetchResult<()> {
        self.store
            .save(chunk.clone())
            .map_err(|error| FetchError::Unavailable {
                position: chunk.position(),
                reason: error.to_string(),
            })
    }
}

// =============================================================================
// CACHE
// =============================================================================

/// Read access to already-fetched chunks.
pub trait ChunkLookup {
    /// Chunk at a position, if available.
    fn chunk(&self, position: ChunkPosition) -> Option<Arc<Chunk>>;
}

impl ChunkLookup for HashMap<ChunkPosition, Arc<Chunk>> {
    fn chunk(&self, position: ChunkPosition) -> Option<Arc<Chunk>> {
        self.get(&position).cloned()
    }
}

/// A fetch in progress that other callers can wait on.
struct InFlight {
    result: Mutex<Option<FetchResult<Arc<Chunk>>>>,
    done: Condvar,
}

impl InFlight {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn complete(&self, result: FetchResult<Arc<Chunk>>) {
        *self.result.lock() = Some(result);
        self.done.notify_all();
    }

    fn wait(&self) -> FetchResult<Arc<Chunk>> {
        let mut result = self.result.lock();
        loop {
            if let Some(result) = result.as_ref() {
                return result.clone();
            }
            self.done.wait(&mut result);
        }
    }
}

enum Slot {
    Ready(Arc<Chunk>),
    Pending(Arc<InFlight>),
}

/// Deduplicating chunk cache.
///
/// Concurrent requests for the same position share one fetch. Failed fetches
/// are not cached, so the next request retries.
pub struct ChunkCache {
    source: Arc<dyn ChunkSource>,
    slots: Mutex<HashMap<ChunkPosition, Slot>>,
    fetches: AtomicU64,
}

impl ChunkCache {
    /// Creates an empty cache over a source.
    #[must_use]
    pub fn new(source: Arc<dyn ChunkSource>) -> Self {
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
            fetches: AtomicU64::new(0),
        }
    }

    /// Authoritative source behind the cache.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn ChunkSource> {
        &self.source
    }

    /// Returns the chunk, fetching it at most once across concurrent callers.
    ///
    /// # Errors
    ///
    /// Propagates the source's failure to every waiting caller.
    pub fn get(&self, position: ChunkPosition) -> FetchResult<Arc<Chunk>> {
        let claim = {
            let mut slots = self.slots.lock();
            match slots.get(&position) {
                Some(Slot::Ready(chunk)) => return Ok(Arc::clone(chunk)),
                Some(Slot::Pending(flight)) => Err(Arc::clone(flight)),
                None => {
                    let flight = Arc::new(InFlight::new());
                    slots.insert(position, Slot::Pending(Arc::clone(&flight)));
                    Ok(flight)
                }
            }
        };
        let flight = match claim {
            Ok(owned) => owned,
            Err(shared) => return shared.wait(),
        };

        let result = self.source.fetch(position).map(Arc::new);
        self.fetches.fetch_add(1, Ordering::Relaxed);
        {
            let mut slots = self.slots.lock();
            let still_ours = matches!(
                slots.get(&position),
                Some(Slot::Pending(current)) if Arc::ptr_eq(current, &flight)
            );
            if still_ours {
                match &result {
                    Ok(chunk) => {
                        slots.insert(position, Slot::Ready(Arc::clone(chunk)));
                    }
                    Err(_) => {
                        slots.remove(&position);
                    }
                }
            }
        }
        flight.complete(result.clone());
        result
    }

    /// Fetches several chunks, in request order.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub fn get_many(&self, positions: &[ChunkPosition]) -> FetchResult<Vec<Arc<Chunk>>> {
        positions.iter().map(|&position| self.get(position)).collect()
    }

    /// Chunk at a position if it is already resolved; never fetches.
    #[must_use]
    pub fn cached(&self, position: ChunkPosition) -> Option<Arc<Chunk>> {
        match self.slots.lock().get(&position) {
            Some(Slot::Ready(chunk)) => Some(Arc::clone(chunk)),
            _ => None,
        }
    }

    /// Installs a newer copy of a chunk.
    pub fn replace(&self, chunk: Arc<Chunk>) {
        self.slots.lock().insert(chunk.position(), Slot::Ready(chunk));
    }

    /// Drops resolved chunks matching a predicate. Returns how many.
    pub fn evict_where(&self, mut predicate: impl FnMut(ChunkPosition) -> bool) -> usize {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|&position, slot| matches!(slot, Slot::Pending(_)) || !predicate(position));
        before - slots.len()
    }

    /// Number of resolved or in-flight positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// True if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Number of fetches that reached the source.
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl ChunkLookup for ChunkCache {
    fn chunk(&self, position: ChunkPosition) -> Option<Arc<Chunk>> {
        self.cached(position)
    }
}

// =============================================================================
// SERVICE
// =============================================================================

/// Turns fetched chunks into the consumer's form (e.g. a mesh).
pub trait Materializer: Send + Sync + 'static {
    /// Built form of a chunk.
    type Output: Send + Sync + 'static;

    /// Chunks that must be fetched before `position` can be built.
    fn dependencies(&self, position: ChunkPosition) -> Vec<ChunkPosition> {
        vec![position]
    }

    /// Builds one chunk. Every dependency is available through `chunks`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Materialize`] if the chunk cannot be built.
    fn materialize(&self, position: ChunkPosition, chunks: &dyn ChunkLookup) -> FetchResult<Self::Output>;

    /// Called after a finished build of `position` was dropped because an
    /// edit outdated it. Anything the build cached on the side must go.
    fn discarded(&self, _position: ChunkPosition) {}
}

/// Streaming tuning.
#[derive(Clone, Debug)]
pub struct StreamingOptions {
    /// Chunk edge length in tiles.
    pub chunk_size: i32,
    /// Tiles of neighbour data a build reads past each chunk face.
    pub border: i32,
    /// Chebyshev distance beyond which built chunks are evicted.
    pub eviction_distance: u32,
    /// Radius of the outermost search ring.
    pub search_radius: i32,
    /// Worker interval.
    pub tick_interval: Duration,
}

impl Default for StreamingOptions {
    fn default() -> Self {
        Self {
            chunk_size: i32::try_from(lithos_shared::DEFAULT_CHUNK_SIZE).unwrap_or(32),
            border: SMOOTHING_BORDER,
            eviction_distance: DEFAULT_RENDER_DISTANCE,
            search_radius: STREAM_SEARCH_RADIUS,
            tick_interval: DEFAULT_STREAM_TICK,
        }
    }
}

impl StreamingOptions {
    /// Options for a configured world.
    #[must_use]
    pub fn from_config(config: &WorldConfig) -> Self {
        Self {
            chunk_size: config.chunk_size_i32(),
            eviction_distance: config.render_distance,
            tick_interval: config.stream_tick(),
            ..Self::default()
        }
    }
}

/// Worker state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    /// No worker thread.
    Idle,
    /// Worker thread ticking.
    Running,
}

/// What one tick did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Chunk built and published this tick.
    pub built: Option<ChunkPosition>,
    /// Chunk built against an outdated version and dropped.
    pub discarded: Option<ChunkPosition>,
    /// Chunk whose fetch or build failed.
    pub failed: Option<ChunkPosition>,
    /// Built chunks evicted this tick.
    pub evicted: usize,
}

/// Service counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    /// Ticks run.
    pub ticks: u64,
    /// Chunks built and published.
    pub built: u64,
    /// Builds dropped as stale.
    pub discarded: u64,
    /// Failed ticks.
    pub failed: u64,
    /// Built chunks evicted.
    pub evicted: u64,
    /// Edits applied.
    pub edits: u64,
}

/// Consecutive failures of one chunk and the tick it may be retried at.
struct Backoff {
    failures: u32,
    retry_at: u64,
}

impl Backoff {
    fn delay(failures: u32) -> u64 {
        1u64.checked_shl(failures)
            .map_or(MAX_RETRY_BACKOFF_TICKS, |delay| delay.min(MAX_RETRY_BACKOFF_TICKS))
    }
}

struct Built<T> {
    output: Arc<T>,
    version: u64,
}

struct Shared<M: Materializer> {
    cache: ChunkCache,
    materializer: M,
    options: StreamingOptions,
    center: Mutex<ChunkPosition>,
    /// Lock order: `built` before `versions`.
    built: RwLock<HashMap<ChunkPosition, Built<M::Output>>>,
    versions: Mutex<HashMap<ChunkPosition, u64>>,
    edit_lock: Mutex<()>,
    /// Never held together with `built` or `versions`.
    backoff: Mutex<HashMap<ChunkPosition, Backoff>>,
    ticks: AtomicU64,
    stats: Mutex<StreamingStats>,
}

struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Streams chunks around a moving centre.
pub struct ChunkStreamingService<M: Materializer> {
    shared: Arc<Shared<M>>,
    worker: Mutex<Option<Worker>>,
}

impl<M: Materializer> ChunkStreamingService<M> {
    /// Creates an idle service.
    #[must_use]
    pub fn new(source: Arc<dyn ChunkSource>, materializer: M, options: StreamingOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                cache: ChunkCache::new(source),
                materializer,
                options,
                center: Mutex::new(ChunkPosition::ORIGIN),
                built: RwLock::new(HashMap::new()),
                versions: Mutex::new(HashMap::new()),
                edit_lock: Mutex::new(()),
                backoff: Mutex::new(HashMap::new()),
                ticks: AtomicU64::new(0),
                stats: Mutex::new(StreamingStats::default()),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Fetches chunks in request order, deduplicating concurrent requests.
    ///
    /// # Errors
    ///
    /// Returns the first fetch failure; "not built yet" is never an error.
    pub fn get_chunks(&self, positions: &[ChunkPosition]) -> FetchResult<Vec<Arc<Chunk>>> {
        self.shared.cache.get_many(positions)
    }

    /// Moves the streaming centre.
    pub fn set_position(&self, center: ChunkPosition) {
        *self.shared.center.lock() = center;
    }

    /// Current streaming centre.
    #[must_use]
    pub fn position(&self) -> ChunkPosition {
        *self.shared.center.lock()
    }

    /// Built output for a chunk; `None` while it is not available yet.
    #[must_use]
    pub fn materialized(&self, position: ChunkPosition) -> Option<Arc<M::Output>> {
        self.shared
            .built
            .read()
            .get(&position)
            .map(|built| Arc::clone(&built.output))
    }

    /// Positions with a built output, sorted.
    #[must_use]
    pub fn materialized_positions(&self) -> Vec<ChunkPosition> {
        let mut positions: Vec<_> = self.shared.built.read().keys().copied().collect();
        positions.sort_unstable();
        positions
    }

    /// True if the built output reflects every edit applied so far.
    #[must_use]
    pub fn is_current(&self, position: ChunkPosition) -> bool {
        let built = self.shared.built.read();
        built
            .get(&position)
            .is_some_and(|b| b.version == self.shared.version_of(position))
    }

    /// The chunk cache.
    #[must_use]
    pub fn cache(&self) -> &ChunkCache {
        &self.shared.cache
    }

    /// Snapshot of the service counters.
    #[must_use]
    pub fn stats(&self) -> StreamingStats {
        self.shared.stats.lock().clone()
    }

    /// Runs one worker iteration on the calling thread.
    pub fn tick(&self) -> TickReport {
        self.shared.tick()
    }

    /// Applies an edit and schedules rebuilds of every affected chunk.
    ///
    /// Returns the affected chunks; empty if the tile already held the new
    /// value.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the owning chunk cannot be fetched or the
    /// edited chunk cannot be persisted.
    pub fn apply_edit(&self, edit: TileEdit) -> FetchResult<Vec<ChunkPosition>> {
        self.shared.apply_edit(edit)
    }

    /// Current worker state.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        if self.worker.lock().is_some() {
            ServiceState::Running
        } else {
            ServiceState::Idle
        }
    }

    /// Starts the worker thread. Returns false if it was already running.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn start(&self) -> io::Result<bool> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(false);
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let shared = Arc::clone(&self.shared);
        let interval = shared.options.tick_interval;
        let handle = thread::Builder::new()
            .name("lithos-streaming".to_string())
            .spawn(move || {
                let ticker = tick(interval);
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            shared.tick();
                        }
                    }
                }
            })?;

        *worker = Some(Worker {
            stop: stop_tx,
            handle,
        });
        info!(interval_ms = interval.as_millis(), "streaming service started");
        Ok(true)
    }

    /// Stops the worker thread and waits for it. Returns false if it was idle.
    pub fn stop(&self) -> bool {
        let Some(worker) = self.worker.lock().take() else {
            return false;
        };
        let _ = worker.stop.send(());
        if worker.handle.join().is_err() {
            warn!("streaming worker panicked");
        }
        info!("streaming service stopped");
        true
    }
}

impl<M: Materializer> Drop for ChunkStreamingService<M> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<M: Materializer> Shared<M> {
    fn version_of(&self, position: ChunkPosition) -> u64 {
        self.versions.lock().get(&position).copied().unwrap_or(0)
    }

    fn tick(&self) -> TickReport {
        let center = *self.center.lock();
        let now = self.ticks.fetch_add(1, Ordering::Relaxed);
        let mut report = TickReport::default();

        let skipped: Vec<ChunkPosition> = self
            .backoff
            .lock()
            .iter()
            .filter(|(_, backoff)| backoff.retry_at > now)
            .map(|(position, _)| *position)
            .collect();

        if let Some(target) = self.next_target(center, &skipped) {
            match self.build(target) {
                Ok(true) => {
                    self.backoff.lock().remove(&target);
                    report.built = Some(target);
                }
                Ok(false) => report.discarded = Some(target),
                Err(error) => {
                    let mut backoff = self.backoff.lock();
                    let entry = backoff.entry(target).or_insert(Backoff {
                        failures: 0,
                        retry_at: now,
                    });
                    entry.failures = entry.failures.saturating_add(1);
                    entry.retry_at = now + Backoff::delay(entry.failures);
                    warn!(
                        position = %target,
                        %error,
                        failures = entry.failures,
                        retry_at = entry.retry_at,
                        "streaming tick failed"
                    );
                    report.failed = Some(target);
                }
            }
        }
        report.evicted = self.evict(center);

        let mut stats = self.stats.lock();
        stats.ticks += 1;
        stats.built += u64::from(report.built.is_some());
        stats.discarded += u64::from(report.discarded.is_some());
        stats.failed += u64::from(report.failed.is_some());
        stats.evicted += report.evicted as u64;
        report
    }

    /// First chunk near `center` without a current build, ignoring `skipped`.
    fn next_target(&self, center: ChunkPosition, skipped: &[ChunkPosition]) -> Option<ChunkPosition> {
        let built = self.built.read();
        let versions = self.versions.lock();
        let current = |position: &ChunkPosition| versions.get(position).copied().unwrap_or(0);
        let needs_build = |position: &ChunkPosition| {
            !skipped.contains(position)
                && built
                    .get(position)
                    .map_or(true, |b| b.version != current(position))
        };

        for radius in 0..=self.options.search_radius {
            if let Some(position) = ring(center, radius).find(|p| needs_build(p)) {
                return Some(position);
            }
        }

        // Stale builds outside the search rings but still in range.
        built
            .iter()
            .filter(|(position, b)| {
                b.version != current(position)
                    && !skipped.contains(position)
                    && position.chebyshev_distance(center) <= self.options.eviction_distance
            })
            .map(|(position, _)| *position)
            .min_by_key(|position| (position.chebyshev_distance(center), *position))
    }

    /// Builds one chunk. `Ok(false)` if an edit outdated it meanwhile.
    fn build(&self, position: ChunkPosition) -> FetchResult<bool> {
        let version = self.version_of(position);
        let dependencies = self.materializer.dependencies(position);
        let chunks = self.cache.get_many(&dependencies)?;
        let lookup: HashMap<ChunkPosition, Arc<Chunk>> = dependencies.into_iter().zip(chunks).collect();
        let output = self.materializer.materialize(position, &lookup)?;

        let mut built = self.built.write();
        if self.version_of(position) != version {
            drop(built);
            debug!(%position, version, "stale rebuild discarded");
            self.materializer.discarded(position);
            return Ok(false);
        }
        built.insert(
            position,
            Built {
                output: Arc::new(output),
                version,
            },
        );
        debug!(%position, version, "chunk materialized");
        Ok(true)
    }

    fn evict(&self, center: ChunkPosition) -> usize {
        let limit = self.options.eviction_distance;
        let evicted = {
            let mut built = self.built.write();
            let before = built.len();
            built.retain(|position, _| position.chebyshev_distance(center) <= limit);
            before - built.len()
        };

        // Raw chunks one ring further out stay cached for their neighbours' borders.
        let dropped = self
            .cache
            .evict_where(|position| position.chebyshev_distance(center) > limit + 1);
        self.versions
            .lock()
            .retain(|position, _| position.chebyshev_distance(center) <= limit + 1);
        self.backoff
            .lock()
            .retain(|position, _| position.chebyshev_distance(center) <= limit);

        if evicted > 0 || dropped > 0 {
            debug!(%center, evicted, dropped, "evicted distant chunks");
        }
        evicted
    }

    fn apply_edit(&self, edit: TileEdit) -> FetchResult<Vec<ChunkPosition>> {
        let _edit = self.edit_lock.lock();
        let size = self.options.chunk_size;
        let (owner, local) = edit.position.split(size);

        let current = self.cache.get(owner)?;
        if current.tile(local) == edit.tile {
            return Ok(Vec::new());
        }
        let mut updated = Chunk::clone(&current);
        updated.set_tile(local, edit.tile);
        updated.compact();

        self.cache.source().persist(&updated)?;
        // Publish the chunk before bumping versions so no build can pair the
        // old chunk with the new version.
        self.cache.replace(Arc::new(updated));

        let affected = affected_chunks(edit.position, size, self.options.border);
        {
            let mut versions = self.versions.lock();
            for position in &affected {
                *versions.entry(*position).or_insert(0) += 1;
            }
        }
        {
            let mut backoff = self.backoff.lock();
            for position in &affected {
                backoff.remove(position);
            }
        }
        self.stats.lock().edits += 1;
        debug!(
            position = ?edit.position,
            tile = ?edit.tile,
            affected = affected.len(),
            "edit applied"
        );
        Ok(affected)
    }
}

/// Positions at exactly Chebyshev distance `radius` from `center`.
fn ring(center: ChunkPosition, radius: i32) -> impl Iterator<Item = ChunkPosition> {
    (-radius..=radius).flat_map(move |dz| {
        (-radius..=radius).flat_map(move |dy| {
            (-radius..=radius).filter_map(move |dx| {
                let on_shell = dx.abs() == radius || dy.abs() == radius || dz.abs() == radius;
                on_shell.then(|| center.offset(dx, dy, dz))
            })
        })
    })
}
