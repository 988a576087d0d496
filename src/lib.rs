pub use composite::{Composite, Compositor};
pub use error::{
    FileNameError, InvalidGridError, NoValidDataError, RasterShapeError, SatGridError,
    SatGridResult,
};
pub use geo::{BoundingBox, Coord};
pub use grid::GridDescriptor;
pub use level3::{build_level3, build_level3_parallel};
pub use loader::{LoadRequest, ProductData, ProductLoader};
pub use product::{
    list_product_files, ProcessingMode, ProductFile, ProductFilter, ProductType,
};
pub use raster::Raster;

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod composite;
mod error;
mod geo;
mod grid;
mod level3;
mod loader;
mod product;
mod raster;
