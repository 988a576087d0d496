use thiserror::Error;

/// The requested grid geometry was malformed.
#[derive(Debug, Clone, Error)]
#[error("invalid grid: {msg}")]
pub struct InvalidGridError {
    pub msg: String,
}

/// Every processed file was empty, defective, or outside the grid.
#[derive(Debug, Clone, Copy, Error)]
#[error("no data points in grid ({files} files processed)")]
pub struct NoValidDataError {
    /// How many files were processed before giving up.
    pub files: usize,
}

/// A raster did not have the shape of the grid it was composited onto.
#[derive(Debug, Clone, Copy, Error)]
#[error("raster shape mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
pub struct RasterShapeError {
    /// (rows, columns) of the target grid.
    pub expected: (usize, usize),
    /// (rows, columns) of the offending raster.
    pub actual: (usize, usize),
}

/// A file name did not follow the Sentinel-5P Level-2 naming convention.
#[derive(Debug, Clone, Error)]
#[error("{msg}: {name}")]
pub struct FileNameError {
    pub name: String,
    pub msg: &'static str,
}

#[derive(Debug, Error)]
pub enum SatGridError {
    #[error(transparent)]
    InvalidGrid(#[from] InvalidGridError),

    #[error(transparent)]
    NoValidData(#[from] NoValidDataError),

    #[error(transparent)]
    RasterShape(#[from] RasterShapeError),

    #[error(transparent)]
    FileName(#[from] FileNameError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SatGridResult<T> = Result<T, SatGridError>;
