/*!
 * Drivers that fold a set of Level-2 files into one Level-3 composite.
 *
 * The drivers own the per-file policy, a file that cannot be loaded or does not cover the
 * grid is logged and skipped, one bad download must not kill a run over a month of data. Only
 * when nothing at all contributed does a run fail.
 */

use crate::{
    composite::{Composite, Compositor},
    error::SatGridResult,
    loader::{LoadRequest, ProductLoader},
};
use log::{info, warn};
use std::path::{Path, PathBuf};

const CHANNEL_SIZE: usize = 128;

/*-------------------------------------------------------------------------------------------------
 *                                          Drivers
 *-----------------------------------------------------------------------------------------------*/

/**
 * Build a composite by loading the files one after another.
 *
 * #Arguments
 * * files - the Level-2 files to composite, in any order.
 * * loader - loads one file at a time, see [ProductLoader].
 * * request - what to load from every file, also names the grid.
 *
 * #Returns
 * The composite, or an error when not a single file contributed any valid data.
 */
pub fn build_level3<L>(
    files: &[PathBuf],
    loader: &L,
    request: &LoadRequest,
) -> SatGridResult<Composite>
where
    L: ProductLoader + ?Sized,
{
    let mut compositor = Compositor::new(request.grid().clone());

    let total = files.len();
    for (idx, path) in files.iter().enumerate() {
        info!(target: "level3", "{} / {}", idx + 1, total);
        fold_file(&mut compositor, loader, path, request);
    }

    Ok(compositor.finish()?)
}

/**
 * Build a composite with a pool of worker threads loading files.
 *
 * Loading dominates the runtime of a composite, every file is decompressed, filtered, and
 * binned, so the files are spread over workers that each fold into their own partial
 * accumulator. The partials are merged once the channel drains, which gives the same composite
 * as [build_level3] no matter how the files land on workers.
 *
 * #Arguments
 * * files - the Level-2 files to composite, in any order.
 * * loader - shared by all workers, see [ProductLoader].
 * * request - what to load from every file, also names the grid.
 * * jobs - number of worker threads, 0 selects one per available CPU.
 *
 * #Returns
 * The composite, or an error when not a single file contributed any valid data.
 */
pub fn build_level3_parallel<L>(
    files: &[PathBuf],
    loader: &L,
    request: &LoadRequest,
    jobs: usize,
) -> SatGridResult<Composite>
where
    L: ProductLoader + Sync + ?Sized,
{
    let jobs = if jobs == 0 { num_cpus::get() } else { jobs };

    let (path_tx, path_rx) = crossbeam_channel::bounded::<PathBuf>(CHANNEL_SIZE);

    let compositor = std::thread::scope(|scope| -> SatGridResult<Compositor> {
        let mut workers = Vec::with_capacity(jobs);
        let mut spawn_error = None;

        for _ in 0..jobs {
            let path_rx = path_rx.clone();

            let res = std::thread::Builder::new()
                .name("level3-worker".to_owned())
                .spawn_scoped(scope, move || {
                    let mut partial = Compositor::new(request.grid().clone());

                    for path in path_rx {
                        fold_file(&mut partial, loader, &path, request);
                    }

                    partial
                });

            match res {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    spawn_error = Some(err);
                    break;
                }
            }
        }

        drop(path_rx);

        if let Some(err) = spawn_error {
            // Closing the channel lets the workers that did start drain and exit.
            drop(path_tx);
            return Err(err.into());
        }

        let total = files.len();
        for (idx, path) in files.iter().enumerate() {
            info!(target: "level3", "{} / {}", idx + 1, total);
            path_tx
                .send(path.clone())
                .expect("Error sending to level3 workers");
        }
        drop(path_tx);

        let mut compositor = Compositor::new(request.grid().clone());
        for worker in workers {
            let partial = worker.join().expect("Error joining level3 worker thread");
            compositor.merge(partial);
        }

        Ok(compositor)
    })?;

    Ok(compositor.finish()?)
}

/*-------------------------------------------------------------------------------------------------
 *                                     Per-file handling
 *-----------------------------------------------------------------------------------------------*/

/// Load one file and fold the outcome into an accumulator, skipping anything defective.
fn fold_file<L>(compositor: &mut Compositor, loader: &L, path: &Path, request: &LoadRequest)
where
    L: ProductLoader + ?Sized,
{
    let data = match loader.load(path, request) {
        Ok(data) => data,
        Err(err) => {
            warn!(target: "level3", "skipping {}: {}", path.display(), err);
            compositor.skip();
            return;
        }
    };

    match compositor.add(&data) {
        Ok(0) => {
            info!(target: "level3", "no valid overlapping data in file {}", path.display())
        }
        Ok(valid) => info!(target: "level3", "available pixels: {}", valid),
        Err(err) => warn!(target: "level3", "skipping {}: {}", path.display(), err),
    }
}
