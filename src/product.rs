/*!
 * The Sentinel-5P product vocabulary and the local Level-2 file inventory.
 *
 * Level-2 files carry everything worth knowing about them in their names, which follow a fixed
 * width convention like
 *
 * ```text
 * S5P_OFFL_L2__NO2____20210529T020851_20210529T035021_18780_01_010400_20210530T190815.nc
 * ```
 *
 * with the processing mode, product type, sensing period, orbit number, collection, processor
 * version, and processing time at fixed offsets. Parsing the name is enough to select the
 * files for a composite, no file needs to be opened until the harmonization step.
 */

use crate::error::{FileNameError, SatGridResult};
use chrono::NaiveDateTime;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use strum::{EnumIter, IntoEnumIterator};

/// Format of the timestamps embedded in Level-2 file names.
const TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Length of a Level-2 file name without its `.nc` extension.
const STEM_LEN: usize = 83;

/** The processing modes Sentinel-5P products are distributed in. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum ProcessingMode {
    /// Offline processing, the standard products available a few days after sensing.
    OFFL,
    /// Near real time processing, available within hours but with provisional calibration.
    NRTI,
    /// Reprocessed archive data.
    RPRO,
}

impl ProcessingMode {
    /// Get a string representing the name of the processing mode.
    ///
    /// This is also the abbreviation used in the Sentinel-5P file naming scheme.
    pub fn name(&self) -> &'static str {
        use ProcessingMode::*;

        match self {
            OFFL => "OFFL",
            NRTI => "NRTI",
            RPRO => "RPRO",
        }
    }

    /// Match a mode tag from a file name.
    pub fn from_tag(tag: &str) -> Option<ProcessingMode> {
        ProcessingMode::iter().find(|mode| mode.name() == tag)
    }
}

/** The Level-2 product types this library recognizes. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum ProductType {
    /// Nitrogen dioxide tropospheric column.
    NO2,
    /// Methane column averaged dry air mixing ratio.
    CH4,
    /// Carbon monoxide total column.
    CO,
    /// Ozone total column.
    O3,
    /// Sulphur dioxide total column.
    SO2,
    /// Formaldehyde tropospheric column.
    HCHO,
    /// Ultraviolet aerosol index.
    AERAI,
    /// Cloud fraction, albedo, and top pressure.
    CLOUD,
}

impl ProductType {
    /// Get a string representing the name of the product type.
    pub fn name(&self) -> &'static str {
        use ProductType::*;

        match self {
            NO2 => "NO2",
            CH4 => "CH4",
            CO => "CO",
            O3 => "O3",
            SO2 => "SO2",
            HCHO => "HCHO",
            AERAI => "AER_AI",
            CLOUD => "CLOUD",
        }
    }

    /// The 10 character product identifier used in file names and catalog queries.
    pub fn id(&self) -> &'static str {
        use ProductType::*;

        match self {
            NO2 => "L2__NO2___",
            CH4 => "L2__CH4___",
            CO => "L2__CO____",
            O3 => "L2__O3____",
            SO2 => "L2__SO2___",
            HCHO => "L2__HCHO__",
            AERAI => "L2__AER_AI",
            CLOUD => "L2__CLOUD_",
        }
    }

    /// The harmonized name of the main measured quantity in this product type.
    ///
    /// These follow the variable naming convention of the harmonization toolchain, so they are
    /// the natural default for a load request. Quality filtering works on the matching
    /// `_validity` companion variable.
    pub fn column_variable(&self) -> &'static str {
        use ProductType::*;

        match self {
            NO2 => "NO2_column_number_density",
            CH4 => "CH4_column_volume_mixing_ratio_dry_air",
            CO => "CO_column_number_density",
            O3 => "O3_column_number_density",
            SO2 => "SO2_column_number_density",
            HCHO => "HCHO_column_number_density",
            AERAI => "absorbing_aerosol_index",
            CLOUD => "cloud_fraction",
        }
    }

    /// Match a product identifier from a file name.
    pub fn from_id(id: &str) -> Option<ProductType> {
        ProductType::iter().find(|product| product.id() == id)
    }
}

/**
 * Metadata parsed from the name of one Level-2 file.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFile {
    /// Where the file is.
    pub path: PathBuf,
    /// The processing mode the file came out of.
    pub mode: ProcessingMode,
    /// The product type in the file.
    pub product: ProductType,
    /// Start of the sensing period, UTC.
    pub start: NaiveDateTime,
    /// End of the sensing period, UTC.
    pub end: NaiveDateTime,
    /// The orbit the data was sensed on.
    pub orbit: u32,
}

impl ProductFile {
    /**
     * Parse the fixed width Sentinel-5P name of a Level-2 file.
     *
     * #Arguments
     * * path - path to the file, only its final component is inspected.
     *
     * #Returns
     * The parsed metadata, or a [FileNameError] describing the first thing about the name that
     * does not follow the convention.
     */
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self, FileNameError> {
        let path = path.as_ref();

        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| FileNameError {
                name: path.display().to_string(),
                msg: "file name is not valid unicode",
            })?;

        let err = |msg| FileNameError {
            name: name.to_string(),
            msg,
        };

        let stem = name
            .strip_suffix(".nc")
            .ok_or_else(|| err("missing the .nc extension"))?;

        if stem.len() != STEM_LEN || !stem.is_ascii() {
            return Err(err("not the fixed width Sentinel-5P layout"));
        }

        let bytes = stem.as_bytes();
        for sep in [3, 8, 19, 35, 51, 57, 60, 67] {
            if bytes[sep] != b'_' {
                return Err(err("not the fixed width Sentinel-5P layout"));
            }
        }

        if &stem[0..3] != "S5P" {
            return Err(err("does not start with the S5P mission tag"));
        }

        let mode = ProcessingMode::from_tag(&stem[4..8])
            .ok_or_else(|| err("unknown processing mode"))?;

        let product =
            ProductType::from_id(&stem[9..19]).ok_or_else(|| err("unknown product type"))?;

        let start = NaiveDateTime::parse_from_str(&stem[20..35], TIME_FORMAT)
            .map_err(|_| err("malformed sensing start time"))?;

        let end = NaiveDateTime::parse_from_str(&stem[36..51], TIME_FORMAT)
            .map_err(|_| err("malformed sensing end time"))?;

        if end < start {
            return Err(err("sensing period ends before it starts"));
        }

        let orbit: u32 = stem[52..57]
            .parse()
            .map_err(|_| err("malformed orbit number"))?;

        Ok(ProductFile {
            path: path.to_path_buf(),
            mode,
            product,
            start,
            end,
            orbit,
        })
    }
}

/**
 * Selection criteria for walking a local Level-2 archive.
 *
 * Every field is optional, the default filter keeps every file that parses. The time window
 * selects on the start of the sensing period, both ends inclusive.
 */
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductFilter {
    /// Keep only this product type.
    pub product: Option<ProductType>,
    /// Keep only this processing mode.
    pub mode: Option<ProcessingMode>,
    /// Keep only files whose sensing period starts at or after this time.
    pub start: Option<NaiveDateTime>,
    /// Keep only files whose sensing period starts at or before this time.
    pub end: Option<NaiveDateTime>,
}

impl ProductFilter {
    /// Does a file pass this filter?
    pub fn matches(&self, file: &ProductFile) -> bool {
        if let Some(product) = self.product {
            if file.product != product {
                return false;
            }
        }

        if let Some(mode) = self.mode {
            if file.mode != mode {
                return false;
            }
        }

        if let Some(start) = self.start {
            if file.start < start {
                return false;
            }
        }

        if let Some(end) = self.end {
            if file.start > end {
                return false;
            }
        }

        true
    }
}

/**
 * Walk a directory for Level-2 files that pass a filter.
 *
 * Files without a `.nc` extension are ignored outright and `.nc` files whose name does not
 * follow the convention are logged and skipped, download directories tend to collect leftovers
 * and those should not kill a composite run.
 *
 * #Arguments
 * * dir - the directory to walk, subdirectories included.
 * * filter - which of the parsed files to keep.
 *
 * #Returns
 * The matching files sorted by sensing start time, or an error if the directory itself is not
 * usable.
 */
pub fn list_product_files<P: AsRef<Path>>(
    dir: P,
    filter: &ProductFilter,
) -> SatGridResult<Vec<ProductFile>> {
    let dir = dir.as_ref();

    // Report a bad root directly, a walk of a missing directory would just come up empty.
    if !dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", dir.display()),
        )
        .into());
    }

    let mut files = vec![];
    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        // Skip errors silently
        .filter_map(|res| res.ok())
    {
        if !entry.path().is_file() {
            continue;
        }

        let is_nc = entry
            .path()
            .extension()
            .map(|ex| ex == "nc")
            .unwrap_or(false);
        if !is_nc {
            continue;
        }

        let file = match ProductFile::parse(entry.path()) {
            Ok(file) => file,
            Err(err) => {
                warn!(target: "inventory", "skipping {}", err);
                continue;
            }
        };

        if filter.matches(&file) {
            debug!(
                target: "inventory",
                "found {} {} orbit {} sensed {}",
                file.mode.name(),
                file.product.name(),
                file.orbit,
                file.start
            );
            files.push(file);
        }
    }

    files.sort_by_key(|file| file.start);

    Ok(files)
}
