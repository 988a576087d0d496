/*!
 * Compositing per-file rasters into one Level-3 grid.
 *
 * Each Level-2 file the harmonization step bins onto the shared grid covers only a swath of
 * it, the rest of the cells are NaN. The compositor folds any number of those partial rasters
 * into a single per-cell mean, ignoring the missing cells, the way `nanmean` would across a
 * stack of them. It never keeps the stack, only a running sum and count per cell, so memory
 * use does not grow with the number of files and partial results from different workers can
 * be merged cheaply.
 */

use crate::{
    error::{NoValidDataError, RasterShapeError, SatGridResult},
    grid::GridDescriptor,
    loader::ProductData,
    raster::Raster,
};
use log::debug;

/**
 * Accumulates per-file rasters into a running per-cell mean.
 *
 * Feed it rasters with [add](Compositor::add) or whole iterators with
 * [fold](Compositor::fold), combine partial accumulators from worker threads with
 * [merge](Compositor::merge), then turn the whole thing into a [Composite] with
 * [finish](Compositor::finish).
 */
#[derive(Debug, Clone)]
pub struct Compositor {
    /// The grid every accumulated raster must match.
    grid: GridDescriptor,
    /// Per cell sum of the valid values seen so far.
    sum: Vec<f64>,
    /// Per cell count of the valid values seen so far.
    count: Vec<u32>,
    /// Files processed, including ones that were skipped.
    files_seen: usize,
    /// Files that contributed at least one valid value.
    files_used: usize,
}

impl Compositor {
    /// Create an empty accumulator for the given grid.
    pub fn new(grid: GridDescriptor) -> Self {
        let cells = grid.cells();

        Compositor {
            grid,
            sum: vec![0.0; cells],
            count: vec![0; cells],
            files_seen: 0,
            files_used: 0,
        }
    }

    /// The grid this compositor accumulates onto.
    pub fn grid(&self) -> &GridDescriptor {
        &self.grid
    }

    /// Files processed so far, including skipped ones.
    pub fn files_seen(&self) -> usize {
        self.files_seen
    }

    /// Files that contributed at least one valid value so far.
    pub fn files_used(&self) -> usize {
        self.files_used
    }

    /// Record a file that was processed but contributed nothing, defective or empty.
    pub fn skip(&mut self) {
        self.files_seen += 1;
    }

    /**
     * Accumulate the outcome of loading one file.
     *
     * A [ProductData::NoData] counts as a processed file and contributes nothing.
     *
     * #Returns
     * The number of valid cells the file contributed, or a [RasterShapeError] when a binned
     * raster does not have the shape of the grid. A mis-shaped raster contributes nothing but
     * still counts as processed.
     */
    pub fn add(&mut self, data: &ProductData) -> Result<usize, RasterShapeError> {
        match data {
            ProductData::NoData => {
                self.skip();
                Ok(0)
            }
            ProductData::Binned(raster) => self.add_raster(raster),
        }
    }

    /**
     * Accumulate one raster of binned values.
     *
     * NaN cells are ignored, every other cell adds to that cell's running sum and count.
     *
     * #Returns
     * The number of valid cells the raster contributed, or a [RasterShapeError] when it does
     * not have the shape of the grid.
     */
    pub fn add_raster(&mut self, raster: &Raster) -> Result<usize, RasterShapeError> {
        if raster.shape() != self.grid.shape() {
            self.skip();
            return Err(RasterShapeError {
                expected: self.grid.shape(),
                actual: raster.shape(),
            });
        }

        let mut valid = 0;
        for (i, &value) in raster.values().iter().enumerate() {
            if !value.is_nan() {
                self.sum[i] += value;
                self.count[i] += 1;
                valid += 1;
            }
        }

        self.files_seen += 1;
        if valid > 0 {
            self.files_used += 1;
        }

        Ok(valid)
    }

    /**
     * Fold another accumulator into this one.
     *
     * This is how partial results from worker threads are combined, cell sums and counts just
     * add, so the result is the same as if every raster had gone through a single accumulator.
     * Both accumulators must have been created for the same grid, merging accumulators for
     * different grids is a programming error and panics.
     */
    pub fn merge(&mut self, other: Compositor) {
        assert!(
            self.grid == other.grid,
            "merged compositors must share a grid"
        );

        for (s, o) in self.sum.iter_mut().zip(&other.sum) {
            *s += o;
        }
        for (c, o) in self.count.iter_mut().zip(&other.count) {
            *c += o;
        }

        self.files_seen += other.files_seen;
        self.files_used += other.files_used;
    }

    /**
     * Accumulate a whole sequence of per-file outcomes and finish.
     *
     * #Arguments
     * * grid - the grid all the rasters were binned onto.
     * * products - the per-file loader outcomes, in any order.
     *
     * #Returns
     * The finished composite, or an error when a raster does not match the grid or no file
     * contributed any valid data.
     */
    pub fn fold<I>(grid: GridDescriptor, products: I) -> SatGridResult<Composite>
    where
        I: IntoIterator<Item = ProductData>,
    {
        let mut compositor = Compositor::new(grid);

        for (idx, data) in products.into_iter().enumerate() {
            let valid = compositor.add(&data)?;
            debug!(target: "compositor", "input {}: {} valid cells", idx + 1, valid);
        }

        Ok(compositor.finish()?)
    }

    /**
     * Divide the accumulated sums by their counts and return the composite.
     *
     * Cells no file ever covered come out NaN.
     *
     * #Returns
     * The composite, or a [NoValidDataError] when not a single file contributed a valid value.
     */
    pub fn finish(self) -> Result<Composite, NoValidDataError> {
        if self.files_used == 0 {
            return Err(NoValidDataError {
                files: self.files_seen,
            });
        }

        let values: Vec<f64> = self
            .sum
            .iter()
            .zip(&self.count)
            .map(|(&sum, &count)| {
                if count > 0 {
                    sum / f64::from(count)
                } else {
                    f64::NAN
                }
            })
            .collect();

        let (rows, cols) = self.grid.shape();

        Ok(Composite {
            values: Raster::from_values(rows, cols, values),
            grid: self.grid,
            files_used: self.files_used,
        })
    }
}

/**
 * A finished Level-3 composite, the per-cell mean of every raster that went in.
 */
#[derive(Debug, Clone)]
pub struct Composite {
    /// The grid the composite is on.
    grid: GridDescriptor,
    /// The per cell means, NaN where no file had data.
    values: Raster,
    /// How many files contributed at least one valid value.
    files_used: usize,
}

impl Composite {
    /// The grid the composite is on.
    pub fn grid(&self) -> &GridDescriptor {
        &self.grid
    }

    /// The per-cell mean values.
    pub fn raster(&self) -> &Raster {
        &self.values
    }

    /// The mean at a cell, NaN when no file covered it.
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values.get(row, col)
    }

    /// How many files contributed at least one valid value.
    pub fn files_used(&self) -> usize {
        self.files_used
    }

    /// Unwrap the mean raster.
    pub fn into_raster(self) -> Raster {
        self.values
    }
}
