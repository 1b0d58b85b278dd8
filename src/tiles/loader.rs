//! Background tile loading on a bounded worker pool.
//!
//! Workers pull decode tasks from two channels: a primary FIFO for the
//! current level and a preload channel consulted only when the primary is
//! empty, so preloads can never delay current-level tiles. A shared pending
//! set guarantees at most one in-flight load per tile key.

use crate::prelude::HashSet;
use crate::pyramid::PyramidLevel;
use crate::tiles::cache::TileCache;
use crate::tiles::source::{TilePixels, TileSource};
use crate::tiles::types::Tile;
use crate::tiles::TileKey;
use crate::{core::config::LoaderConfig, Result};
use crossbeam_channel::{select, unbounded, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

struct TileTask {
    key: TileKey,
    tile: Tile,
    level: PyramidLevel,
}

struct TileOutcome {
    key: TileKey,
    pixels: Result<TilePixels>,
}

/// Handle to the decode worker pool
pub struct TileLoader {
    task_tx: Option<Sender<TileTask>>,
    preload_tx: Option<Sender<TileTask>>,
    result_rx: Receiver<TileOutcome>,
    pending: Arc<Mutex<HashSet<TileKey>>>,
    workers: Vec<JoinHandle<()>>,
}

impl TileLoader {
    pub fn new(source: Arc<dyn TileSource>, config: &LoaderConfig) -> Self {
        let (task_tx, task_rx) = unbounded::<TileTask>();
        let (preload_tx, preload_rx) = unbounded::<TileTask>();
        let (result_tx, result_rx) = unbounded::<TileOutcome>();

        let workers = (0..config.max_concurrent.max(1))
            .map(|_| {
                let task_rx = task_rx.clone();
                let preload_rx = preload_rx.clone();
                let result_tx = result_tx.clone();
                let source = source.clone();
                std::thread::spawn(move || worker_loop(task_rx, preload_rx, result_tx, source))
            })
            .collect();

        Self {
            task_tx: Some(task_tx),
            preload_tx: Some(preload_tx),
            result_rx,
            pending: Arc::new(Mutex::new(HashSet::default())),
            workers,
        }
    }

    /// Enqueue every planned tile that is neither cached nor already in
    /// flight.
    pub fn ensure_loaded(&self, tiles: &[Tile], level: &PyramidLevel, cache: &TileCache) {
        if let Some(tx) = self.task_tx.as_ref() {
            self.enqueue(tx, tiles, level, cache);
        }
    }

    /// Same filtering as [`Self::ensure_loaded`], at preload priority.
    pub fn enqueue_preload(&self, tiles: &[Tile], level: &PyramidLevel, cache: &TileCache) {
        if let Some(tx) = self.preload_tx.as_ref() {
            self.enqueue(tx, tiles, level, cache);
        }
    }

    /// Backstop pass: re-enqueue any planned tile that is neither cached
    /// nor in flight. Idempotent, so running it on a timer is harmless.
    pub fn reconcile(&self, plan: &[Tile], level: &PyramidLevel, cache: &TileCache) {
        self.ensure_loaded(plan, level, cache);
    }

    fn enqueue(&self, tx: &Sender<TileTask>, tiles: &[Tile], level: &PyramidLevel, cache: &TileCache) {
        let Ok(mut pending) = self.pending.lock() else {
            return;
        };
        for tile in tiles {
            let key = (level.id, tile.id);
            if cache.contains(&key) || pending.contains(&key) {
                continue;
            }
            pending.insert(key);
            let task = TileTask {
                key,
                tile: tile.clone(),
                level: level.clone(),
            };
            if tx.send(task).is_err() {
                pending.remove(&key);
                return;
            }
        }
    }

    /// Move finished decodes into the cache. Failed decodes are logged and
    /// dropped from the pending set; the next reconcile sweep retries them.
    pub fn drain_completed(&self, cache: &mut TileCache) -> usize {
        let mut completed = 0;
        while let Ok(outcome) = self.result_rx.try_recv() {
            if let Ok(mut pending) = self.pending.lock() {
                pending.remove(&outcome.key);
            }
            match outcome.pixels {
                Ok(pixels) => {
                    cache.insert(outcome.key, pixels);
                    completed += 1;
                }
                Err(err) => {
                    let (level, tile) = outcome.key;
                    log::warn!("tile {tile} at {level} failed to decode: {err}");
                }
            }
        }
        completed
    }

    pub fn in_flight(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    /// Tear down the pool: close the channels, join the workers, clear the
    /// pending set. No background work survives this call.
    pub fn dispose(&mut self) {
        self.task_tx = None;
        self.preload_tx = None;
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        if let Ok(mut pending) = self.pending.lock() {
            pending.clear();
        }
    }
}

impl Drop for TileLoader {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn worker_loop(
    task_rx: Receiver<TileTask>,
    preload_rx: Receiver<TileTask>,
    result_tx: Sender<TileOutcome>,
    source: Arc<dyn TileSource>,
) {
    loop {
        // Primary queue first; preloads only when it is empty. Both
        // channels close together on dispose.
        let task = match task_rx.try_recv() {
            Ok(task) => task,
            Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {
                let received = select! {
                    recv(task_rx) -> task => task.ok(),
                    recv(preload_rx) -> task => task.ok(),
                };
                match received {
                    Some(task) => task,
                    None => break,
                }
            }
        };

        let pixels = source.decode_tile(&task.level, &task.tile);
        if result_tx
            .send(TileOutcome {
                key: task.key,
                pixels,
            })
            .is_err()
        {
            break;
        }
    }
}
