/*!
 * The contract with the per-file harmonization loader.
 *
 * Turning one Level-2 swath file into a raster on the shared grid is the job of an external
 * harmonization toolchain, it understands the file format, applies the quality filter, and
 * bins the pixels spatially. This crate only describes what to load and consumes the result,
 * so that seam is a trait. The [LoadRequest] holds the description and can render it as the
 * operations string that toolchain takes.
 */

use crate::{
    error::SatGridResult,
    grid::GridDescriptor,
    product::ProductType,
    raster::Raster,
};
use std::path::Path;

/**
 * The outcome of loading one Level-2 file.
 *
 * A file that holds no valid measurements over the grid at all is a normal occurrence, swaths
 * regularly miss the area of interest entirely, so that case is a value here and not an error.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum ProductData {
    /// The file's measurements binned onto the shared grid, NaN where nothing overlapped.
    Binned(Raster),
    /// The file had no valid measurements over the grid.
    NoData,
}

/**
 * Immutable description of what to load from every Level-2 file of a composite.
 *
 * The same request is handed to the loader for every file so all the rasters land on the same
 * grid with the same quality filter applied.
 */
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// The harmonized name of the variable to load.
    product: String,
    /// Minimum validity for a pixel to be kept.
    min_validity: f64,
    /// The grid to bin onto.
    grid: GridDescriptor,
}

impl LoadRequest {
    /**
     * Build a request from a harmonized variable name.
     *
     * #Arguments
     * * product - the harmonized variable name, e.g. `NO2_column_number_density`.
     * * min_validity - minimum quality for a pixel to be kept. The recommendation for NO2
     *   products is 0.75, a negative value keeps everything.
     * * grid - the grid every file is binned onto.
     */
    pub fn new<S: Into<String>>(product: S, min_validity: f64, grid: GridDescriptor) -> Self {
        LoadRequest {
            product: product.into(),
            min_validity,
            grid,
        }
    }

    /// Build a request for the main measured quantity of a product type.
    pub fn for_product(product: ProductType, min_validity: f64, grid: GridDescriptor) -> Self {
        LoadRequest::new(product.column_variable(), min_validity, grid)
    }

    /// The harmonized name of the variable to load.
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Minimum validity for a pixel to be kept.
    pub fn min_validity(&self) -> f64 {
        self.min_validity
    }

    /// The grid every file is binned onto.
    pub fn grid(&self) -> &GridDescriptor {
        &self.grid
    }

    /**
     * Render the request as a harmonization operations string.
     *
     * The string filters on validity, trims to the grid bounds, bins spatially onto the grid,
     * and keeps only the product and the cell bounds. Order matters to the toolchain, the
     * validity and area filters must run before the binning.
     */
    pub fn harp_operations(&self) -> String {
        let bounds = self.grid.bounds();

        format!(
            "{product}>{validity}; \
             latitude > {lat_min} [degree_north]; \
             latitude < {lat_max} [degree_north]; \
             longitude > {lon_min} [degree_east]; \
             longitude < {lon_max} [degree_east]; \
             bin_spatial{grid}; \
             keep(latitude_bounds,longitude_bounds,{product})",
            product = self.product,
            validity = self.min_validity,
            lat_min = bounds.ll.lat,
            lat_max = bounds.ur.lat,
            lon_min = bounds.ll.lon,
            lon_max = bounds.ur.lon,
            grid = self.grid,
        )
    }
}

/**
 * A source of binned rasters, one per Level-2 file.
 *
 * Implementations wrap whatever actually reads the files. The contract is small:
 *
 * * A returned raster has the shape of the request's grid.
 * * A file with no valid measurements over the grid is [ProductData::NoData], not an error.
 * * Errors are for defective files or a broken toolchain, the drivers log and skip them.
 * * Loading the same file with the same request gives the same answer, the parallel driver
 *   relies on that to make composite results independent of scheduling.
 */
pub trait ProductLoader {
    /// Load one file, binned onto the grid of the request.
    fn load(&self, path: &Path, request: &LoadRequest) -> SatGridResult<ProductData>;
}
