/*!
 * End to end test of the composite pipeline, walking a download directory, selecting files,
 * and folding them into a Level-3 grid with both drivers.
 *
 * The loader is synthetic, it serves canned rasters keyed by orbit number, so the test covers
 * everything except the external harmonization toolchain itself.
 */

use log::LevelFilter;
use satgrid::{
    build_level3, build_level3_parallel, GridDescriptor, LoadRequest, ProcessingMode,
    ProductData, ProductFile, ProductFilter, ProductLoader, ProductType, Raster, SatGridError,
    SatGridResult,
};
use simple_logger::SimpleLogger;
use std::path::{Path, PathBuf};

fn init_logging() {
    // Every test in this file may race to do this, only the first one wins and that is fine.
    SimpleLogger::new().with_level(LevelFilter::Info).init().ok();
}

const NO2_MAY_ORBITS: [&str; 4] = [
    "S5P_OFFL_L2__NO2____20210501T103000_20210501T121130_18386_01_010400_20210502T190815.nc",
    "S5P_OFFL_L2__NO2____20210515T101500_20210515T115630_18584_01_010400_20210516T190815.nc",
    "S5P_OFFL_L2__NO2____20210520T101500_20210520T115630_18655_01_010400_20210521T190815.nc",
    "S5P_OFFL_L2__NO2____20210529T020851_20210529T035021_18780_01_010400_20210530T190815.nc",
];

const OTHER_FILES: [&str; 4] = [
    // Different product and different mode, the filter must drop both.
    "S5P_OFFL_L2__CH4____20210515T103000_20210515T121130_18585_01_010400_20210516T190815.nc",
    "S5P_NRTI_L2__NO2____20210529T050000_20210529T064500_18781_01_010400_20210529T080000.nc",
    // Leftovers a download directory collects.
    "notes.txt",
    "partial_download.nc",
];

/// Serves canned rasters keyed by the orbit number in the file name.
struct OrbitLoader {
    rows: usize,
    cols: usize,
}

impl ProductLoader for OrbitLoader {
    fn load(&self, path: &Path, _request: &LoadRequest) -> SatGridResult<ProductData> {
        let orbit = ProductFile::parse(path)?.orbit;

        match orbit {
            // A swath covering the whole grid.
            18386 => Ok(ProductData::Binned(Raster::from_values(
                self.rows,
                self.cols,
                vec![1.0; self.rows * self.cols],
            ))),
            // A swath that missed the area of interest.
            18584 => Ok(ProductData::NoData),
            // A swath covering only the southern half of the grid.
            18780 => {
                let mut raster = Raster::missing(self.rows, self.cols);
                for row in 0..self.rows / 2 {
                    for col in 0..self.cols {
                        raster.set(row, col, 3.0);
                    }
                }
                Ok(ProductData::Binned(raster))
            }
            // Anything else behaves like a truncated download.
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("orbit {} not staged", orbit),
            )
            .into()),
        }
    }
}

fn stage_download_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();

    for name in NO2_MAY_ORBITS.iter().chain(OTHER_FILES.iter()) {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }

    dir
}

fn may_2021_no2_filter() -> ProductFilter {
    let midnight = |y, m, d| {
        chrono::NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    };

    ProductFilter {
        product: Some(ProductType::NO2),
        mode: Some(ProcessingMode::OFFL),
        start: Some(midnight(2021, 5, 1)),
        end: Some(midnight(2021, 5, 31)),
    }
}

#[test]
fn test_level3_from_download_directory() {
    init_logging();

    let dir = stage_download_dir();

    let files = satgrid::list_product_files(dir.path(), &may_2021_no2_filter()).unwrap();
    assert_eq!(files.len(), 4);
    assert!(files.windows(2).all(|pair| pair[0].start <= pair[1].start));

    let grid = GridDescriptor::new(54.0, 58.0, 1.0, 8.0, 13.0, 1.0).unwrap();
    assert_eq!(grid.shape(), (4, 5));

    let loader = OrbitLoader { rows: 4, cols: 5 };
    let request = LoadRequest::for_product(ProductType::NO2, 0.75, grid);

    let paths: Vec<PathBuf> = files.iter().map(|file| file.path.clone()).collect();
    let composite = build_level3(&paths, &loader, &request).unwrap();

    // Orbit 18386 covered everything with 1.0 and orbit 18780 added 3.0 over the southern
    // half. Orbit 18584 was empty and orbit 18655 failed to load, neither contributes.
    assert_eq!(composite.files_used(), 2);
    for row in 0..4 {
        for col in 0..5 {
            let expected = if row < 2 { 2.0 } else { 1.0 };
            assert_eq!(composite.value(row, col), expected, "cell {} {}", row, col);
        }
    }
}

#[test]
fn test_parallel_driver_matches_sequential() {
    init_logging();

    let dir = stage_download_dir();

    let files = satgrid::list_product_files(dir.path(), &may_2021_no2_filter()).unwrap();
    let paths: Vec<PathBuf> = files.iter().map(|file| file.path.clone()).collect();

    let grid = GridDescriptor::new(54.0, 58.0, 1.0, 8.0, 13.0, 1.0).unwrap();
    let loader = OrbitLoader { rows: 4, cols: 5 };
    let request = LoadRequest::for_product(ProductType::NO2, 0.75, grid);

    let sequential = build_level3(&paths, &loader, &request).unwrap();

    for jobs in [1, 2, 4, 0] {
        let parallel = build_level3_parallel(&paths, &loader, &request, jobs).unwrap();

        assert_eq!(parallel.files_used(), sequential.files_used());
        for (p, s) in parallel
            .raster()
            .values()
            .iter()
            .zip(sequential.raster().values())
        {
            assert!(p == s || (p.is_nan() && s.is_nan()));
        }
    }
}

#[test]
fn test_run_with_no_valid_data_fails() {
    init_logging();

    let dir = tempfile::tempdir().unwrap();
    // Only the empty-swath orbit and a truncated download are present.
    for name in [
        "S5P_OFFL_L2__NO2____20210515T101500_20210515T115630_18584_01_010400_20210516T190815.nc",
        "S5P_OFFL_L2__NO2____20210520T101500_20210520T115630_18655_01_010400_20210521T190815.nc",
    ] {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }

    let files = satgrid::list_product_files(dir.path(), &ProductFilter::default()).unwrap();
    let paths: Vec<PathBuf> = files.iter().map(|file| file.path.clone()).collect();

    let grid = GridDescriptor::new(54.0, 58.0, 1.0, 8.0, 13.0, 1.0).unwrap();
    let loader = OrbitLoader { rows: 4, cols: 5 };
    let request = LoadRequest::for_product(ProductType::NO2, 0.75, grid);

    let result = build_level3(&paths, &loader, &request);

    match result {
        Err(SatGridError::NoValidData(err)) => assert_eq!(err.files, 2),
        other => panic!("expected NoValidDataError, got {:?}", other.map(|_| ())),
    }
}
