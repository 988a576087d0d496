/*!
 * Regular latitude-longitude binning grids.
 *
 * A grid is the one piece of geometry every stage shares. The harmonization step bins each
 * Level-2 swath onto it, the compositor folds those rasters together on it, and map drawing
 * takes its extent and axes from it. Keeping all of that in a single validated descriptor is
 * what lets those stages agree without passing six loose numbers around.
 */

use crate::{
    error::InvalidGridError,
    geo::{BoundingBox, Coord},
};
use std::fmt::{self, Display};

/**
 * The fixed resolution latitude-longitude grid a composite is built on.
 *
 * The step counts are derived from the bounds and resolutions when the descriptor is built and
 * never change afterwards. The span does not have to be a whole number of cells, the count is
 * rounded to the nearest whole cell with ties going to the even count, so a requested maximum
 * that falls inside a cell is absorbed rather than rejected.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct GridDescriptor {
    /// Southern edge of the grid in degrees north.
    lat_min: f64,
    /// Northern edge of the grid in degrees north.
    lat_max: f64,
    /// Cell height in degrees.
    lat_res: f64,
    /// Number of rows.
    lat_steps: usize,
    /// Western edge of the grid in degrees east.
    lon_min: f64,
    /// Eastern edge of the grid in degrees east.
    lon_max: f64,
    /// Cell width in degrees.
    lon_res: f64,
    /// Number of columns.
    lon_steps: usize,
}

impl GridDescriptor {
    /**
     * Build a descriptor from bounds and resolutions.
     *
     * #Arguments
     * * lat_min, lat_max - latitude bounds in degrees north, minimum strictly less than maximum.
     * * lat_res - latitude cell size in degrees, strictly positive.
     * * lon_min, lon_max - longitude bounds in degrees east, minimum strictly less than maximum.
     * * lon_res - longitude cell size in degrees, strictly positive.
     *
     * #Returns
     * The descriptor, or an [InvalidGridError] when a value is not finite, a resolution is not
     * positive, the bounds are reversed or equal, or a span is so much smaller than its
     * resolution that it rounds to zero cells.
     */
    pub fn new(
        lat_min: f64,
        lat_max: f64,
        lat_res: f64,
        lon_min: f64,
        lon_max: f64,
        lon_res: f64,
    ) -> Result<Self, InvalidGridError> {
        let lat_steps = count_steps("latitude", lat_min, lat_max, lat_res)?;
        let lon_steps = count_steps("longitude", lon_min, lon_max, lon_res)?;

        Ok(GridDescriptor {
            lat_min,
            lat_max,
            lat_res,
            lat_steps,
            lon_min,
            lon_max,
            lon_res,
            lon_steps,
        })
    }

    /// Number of rows, the latitude direction.
    pub fn lat_steps(&self) -> usize {
        self.lat_steps
    }

    /// Number of columns, the longitude direction.
    pub fn lon_steps(&self) -> usize {
        self.lon_steps
    }

    /// The shape as (rows, columns), which is (latitude steps, longitude steps).
    pub fn shape(&self) -> (usize, usize) {
        (self.lat_steps, self.lon_steps)
    }

    /// Total number of cells.
    pub fn cells(&self) -> usize {
        self.lat_steps * self.lon_steps
    }

    /// Latitude cell size in degrees.
    pub fn lat_resolution(&self) -> f64 {
        self.lat_res
    }

    /// Longitude cell size in degrees.
    pub fn lon_resolution(&self) -> f64 {
        self.lon_res
    }

    /// The bounds the grid was requested with.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox {
            ll: Coord {
                lat: self.lat_min,
                lon: self.lon_min,
            },
            ur: Coord {
                lat: self.lat_max,
                lon: self.lon_max,
            },
        }
    }

    /**
     * The center latitude of every row, south to north.
     *
     * These are the latitude values the harmonization toolchain reports for binned cells, so
     * they are the natural vertical axis for drawing a composite.
     */
    pub fn lat_centers(&self) -> Vec<f64> {
        (0..self.lat_steps)
            .map(|i| self.lat_min + (i as f64 + 0.5) * self.lat_res)
            .collect()
    }

    /// The center longitude of every column, west to east.
    pub fn lon_centers(&self) -> Vec<f64> {
        (0..self.lon_steps)
            .map(|i| self.lon_min + (i as f64 + 0.5) * self.lon_res)
            .collect()
    }

    /**
     * The latitude of every row boundary, `lat_steps() + 1` values from the southern edge up.
     *
     * When the span is not a whole number of cells the last edge differs from the requested
     * maximum, the grid covers whole cells only.
     */
    pub fn lat_edges(&self) -> Vec<f64> {
        (0..=self.lat_steps)
            .map(|i| self.lat_min + i as f64 * self.lat_res)
            .collect()
    }

    /// The longitude of every column boundary, `lon_steps() + 1` values from the western edge up.
    pub fn lon_edges(&self) -> Vec<f64> {
        (0..=self.lon_steps)
            .map(|i| self.lon_min + i as f64 * self.lon_res)
            .collect()
    }

    /**
     * The grid as the 6 element tuple a `bin_spatial` operation takes.
     *
     * The field order is (latitude steps, latitude minimum, latitude resolution, longitude
     * steps, longitude minimum, longitude resolution). That order is a wire format shared with
     * the harmonization toolchain, do not reorder it.
     */
    pub fn bin_spatial(&self) -> (usize, f64, f64, usize, f64, f64) {
        (
            self.lat_steps,
            self.lat_min,
            self.lat_res,
            self.lon_steps,
            self.lon_min,
            self.lon_res,
        )
    }
}

/// Formats the grid exactly like the `bin_spatial` tuple, e.g. `(900, 51, 0.01, 1300, 5, 0.01)`.
impl Display for GridDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {}, {})",
            self.lat_steps, self.lat_min, self.lat_res, self.lon_steps, self.lon_min, self.lon_res
        )
    }
}

/// Validate one axis and turn its span into a whole number of cells.
fn count_steps(axis: &'static str, min: f64, max: f64, res: f64) -> Result<usize, InvalidGridError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(InvalidGridError {
            msg: format!("{} bounds must be finite, got {}..{}", axis, min, max),
        });
    }

    if !res.is_finite() || res <= 0.0 {
        return Err(InvalidGridError {
            msg: format!("{} resolution must be positive and finite, got {}", axis, res),
        });
    }

    if max <= min {
        return Err(InvalidGridError {
            msg: format!(
                "{} maximum must be greater than the minimum, got {}..{}",
                axis, min, max
            ),
        });
    }

    // Round half to even, matching the step counts the rest of the toolchain derives.
    let steps = ((max - min) / res).round_ties_even();
    if steps < 1.0 {
        return Err(InvalidGridError {
            msg: format!(
                "{} span {}..{} rounds to zero cells at a resolution of {}",
                axis, min, max, res
            ),
        });
    }

    Ok(steps as usize)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_step_counts() {
        let grid = GridDescriptor::new(51.0, 60.0, 0.01, 5.0, 18.0, 0.01).unwrap();

        assert_eq!(grid.lat_steps(), 900);
        assert_eq!(grid.lon_steps(), 1300);
        assert_eq!(grid.shape(), (900, 1300));
        assert_eq!(grid.cells(), 1_170_000);
    }

    #[test]
    fn test_global_grid() {
        let grid = GridDescriptor::new(-90.0, 90.0, 1.0, -180.0, 180.0, 1.0).unwrap();

        assert_eq!(grid.shape(), (180, 360));
    }

    #[test]
    fn test_rounds_ties_to_even() {
        // Spans of 2.5 and 3.5 cells round to the even counts 2 and 4.
        let grid = GridDescriptor::new(0.0, 2.5, 1.0, 0.0, 3.5, 1.0).unwrap();

        assert_eq!(grid.lat_steps(), 2);
        assert_eq!(grid.lon_steps(), 4);
    }

    #[test]
    fn test_fractional_span_rounds_to_nearest() {
        let grid = GridDescriptor::new(0.0, 2.4, 1.0, 0.0, 2.6, 1.0).unwrap();

        assert_eq!(grid.lat_steps(), 2);
        assert_eq!(grid.lon_steps(), 3);
    }

    #[test]
    fn test_rejects_malformed_grids() {
        // Resolution must be strictly positive.
        assert!(GridDescriptor::new(0.0, 1.0, 0.0, 0.0, 1.0, 0.1).is_err());
        assert!(GridDescriptor::new(0.0, 1.0, -0.1, 0.0, 1.0, 0.1).is_err());

        // Bounds must be increasing.
        assert!(GridDescriptor::new(1.0, 1.0, 0.1, 0.0, 1.0, 0.1).is_err());
        assert!(GridDescriptor::new(2.0, 1.0, 0.1, 0.0, 1.0, 0.1).is_err());

        // Everything must be finite.
        assert!(GridDescriptor::new(f64::NAN, 1.0, 0.1, 0.0, 1.0, 0.1).is_err());
        assert!(GridDescriptor::new(0.0, f64::INFINITY, 0.1, 0.0, 1.0, 0.1).is_err());
        assert!(GridDescriptor::new(0.0, 1.0, f64::NAN, 0.0, 1.0, 0.1).is_err());

        // A span much smaller than the resolution has no cells.
        assert!(GridDescriptor::new(0.0, 0.4, 1.0, 0.0, 1.0, 0.1).is_err());
    }

    #[test]
    fn test_centers_and_edges() {
        let grid = GridDescriptor::new(0.0, 1.0, 0.25, 0.0, 0.5, 0.25).unwrap();

        assert_eq!(grid.lat_centers(), vec![0.125, 0.375, 0.625, 0.875]);
        assert_eq!(grid.lon_centers(), vec![0.125, 0.375]);
        assert_eq!(grid.lat_edges(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(grid.lon_edges(), vec![0.0, 0.25, 0.5]);
    }

    #[test]
    fn test_bin_spatial_field_order() {
        let grid = GridDescriptor::new(51.0, 60.0, 0.01, 5.0, 18.0, 0.01).unwrap();

        assert_eq!(grid.bin_spatial(), (900, 51.0, 0.01, 1300, 5.0, 0.01));
    }

    #[test]
    fn test_display_is_the_bin_spatial_tuple() {
        let grid = GridDescriptor::new(51.0, 60.0, 0.01, 5.0, 18.0, 0.01).unwrap();

        assert_eq!(grid.to_string(), "(900, 51, 0.01, 1300, 5, 0.01)");
    }

    #[test]
    fn test_bounds_and_extent() {
        let grid = GridDescriptor::new(51.0, 60.0, 0.01, 5.0, 18.0, 0.01).unwrap();
        let bbox = grid.bounds();

        assert_eq!(bbox.ll.lat, 51.0);
        assert_eq!(bbox.ll.lon, 5.0);
        assert_eq!(bbox.ur.lat, 60.0);
        assert_eq!(bbox.ur.lon, 18.0);
        assert_eq!(bbox.extent(), [5.0, 18.0, 51.0, 60.0]);
    }
}
