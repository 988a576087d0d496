/*!
 * A rectangular block of gridded measurements.
 *
 * Values are stored row major in a flat buffer, one `f64` per grid cell. Cells without a
 * measurement hold NaN, the same sentinel the harmonization toolchain writes for cells no
 * Level-2 pixel overlapped.
 */

/// Gridded values for one product, row major with NaN marking missing cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// Number of rows, the latitude direction.
    rows: usize,
    /// Number of columns, the longitude direction.
    cols: usize,
    /// The cell values, `rows * cols` of them.
    values: Vec<f64>,
}

impl Raster {
    /**
     * Create a raster with every cell missing.
     *
     * #Arguments
     * * rows - number of rows (latitude steps).
     * * cols - number of columns (longitude steps).
     */
    pub fn missing(rows: usize, cols: usize) -> Self {
        Raster {
            rows,
            cols,
            values: vec![f64::NAN; rows * cols],
        }
    }

    /**
     * Wrap an existing buffer of cell values.
     *
     * The buffer must be row major and hold exactly `rows * cols` values. Panics when the
     * length does not match.
     */
    pub fn from_values(rows: usize, cols: usize, values: Vec<f64>) -> Self {
        assert_eq!(
            values.len(),
            rows * cols,
            "raster buffer does not match its dimensions"
        );

        Raster { rows, cols, values }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The shape as (rows, columns).
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// The value at a cell, NaN if the cell is missing.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[col + row * self.cols]
    }

    /// Overwrite the value at a cell.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[col + row * self.cols] = value;
    }

    /// All cell values in row major order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Unwrap the underlying buffer.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Count the cells that hold an actual measurement.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }
}
