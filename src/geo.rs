/*!
 * Geographic types shared across the crate.
 *
 * Coordinates are in degrees, latitude positive north and longitude positive east. No
 * projection handling is done here, these are the plain geodetic coordinates the harmonized
 * products are delivered in.
 */

/// A coordinate on the globe in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    /// Latitude in degrees north.
    pub lat: f64,
    /// Longitude in degrees east.
    pub lon: f64,
}

/// Rectangular area described by its lower left and upper right corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// The lower left corner.
    pub ll: Coord,
    /// The upper right corner.
    pub ur: Coord,
}

impl BoundingBox {
    /**
     * The area as a map extent.
     *
     * #Returns
     * `[west, east, south, north]` in degrees, the order map drawing libraries take an extent
     * in.
     */
    pub fn extent(&self) -> [f64; 4] {
        [self.ll.lon, self.ur.lon, self.ll.lat, self.ur.lat]
    }
}
