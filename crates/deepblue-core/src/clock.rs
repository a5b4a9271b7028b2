//! Frozen scene clock and the sun direction it implies

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::geodesy::enu_frame;
use crate::scene::Cartesian3;

pub const SOLAR_DECLINATION_MAX_DEG: f64 = -23.45;
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Latitude/longitude (degrees) of the point where the sun is overhead
///
/// Uses the cosine declination approximation and ignores the equation of
/// time; good enough to light a predictable side of the globe.
pub fn subsolar_point(at: DateTime<Utc>) -> (f64, f64) {
    let day_of_year = at.ordinal() as f64;
    let declination = SOLAR_DECLINATION_MAX_DEG
        * ((360.0 / DAYS_PER_YEAR) * (day_of_year + 10.0)).to_radians().cos();

    let hours = at.hour() as f64 + at.minute() as f64 / 60.0 + at.second() as f64 / 3600.0;
    let longitude = (-(hours - 12.0) * 15.0 + 540.0).rem_euclid(360.0) - 180.0;

    (declination, longitude)
}

/// Unit vector from the earth center toward the sun, in ECEF
pub fn sun_direction(at: DateTime<Utc>) -> Cartesian3 {
    let (lat, lon) = subsolar_point(at);
    enu_frame(lon, lat).up
}
