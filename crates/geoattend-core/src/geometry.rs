//! Spherical-earth geometry for geofence membership
//!
//! Coordinates are WGS-84 degrees treated as points on a sphere. Polygons
//! are tested with a planar ray cast in (lat, lng) space, which holds for
//! zones far smaller than the earth's curvature. Polygons that straddle the
//! antimeridian or enclose a pole are not handled.

use geoattend_api::{Point, ZoneShape};

/// Mean earth radius used for great-circle distance
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine great-circle distance between two points, in meters
pub fn distance_meters(a: Point, b: Point) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

/// True iff `p` lies within `radius_meters` of `center`. The boundary is inside.
pub fn point_in_circle(p: Point, center: Point, radius_meters: f64) -> bool {
    distance_meters(p, center) <= radius_meters
}

/// Ray-casting parity test against an implicitly closed polygon.
///
/// A ray is cast from `p` and each edge it crosses flips the parity. Edges
/// with equal longitudes never count. Fewer than three vertices contain
/// nothing.
pub fn point_in_polygon(p: Point, vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let crossings = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .filter(|(a, b)| ray_crosses(p, **a, **b))
        .count();

    crossings % 2 == 1
}

fn ray_crosses(p: Point, a: Point, b: Point) -> bool {
    let spans = (a.lng <= p.lng && p.lng < b.lng) || (b.lng <= p.lng && p.lng < a.lng);
    if !spans {
        return false;
    }

    // spans implies a.lng != b.lng
    let lat_at_lng = a.lat + (p.lng - a.lng) * (b.lat - a.lat) / (b.lng - a.lng);
    p.lat < lat_at_lng
}

/// Dispatch a containment test on the zone's geometry
pub fn shape_contains(shape: &ZoneShape, p: Point) -> bool {
    match shape {
        ZoneShape::Circle {
            center,
            radius_meters,
        } => point_in_circle(p, *center, f64::from(*radius_meters)),
        ZoneShape::Polygon { vertices } => point_in_polygon(p, vertices),
    }
}
