//! Active zone directory

use geoattend_api::{Point, Zone};
use geoattend_util::ZoneId;

use crate::geometry::shape_contains;

/// The active zones, in creation order.
///
/// Containment is first-match-wins over that order. Overlapping zones are
/// not detected; which one a point resolves to is decided by the order in
/// which the zones were created.
#[derive(Debug, Clone, Default)]
pub struct ZoneDirectory {
    zones: Vec<Zone>,
}

impl ZoneDirectory {
    /// Build from zones already sorted by creation order. Inactive zones are dropped.
    pub fn new(zones: impl IntoIterator<Item = Zone>) -> Self {
        Self {
            zones: zones.into_iter().filter(Self::is_active).collect(),
        }
    }

    /// Only active zones take part in containment queries
    pub fn is_active(zone: &Zone) -> bool {
        zone.active
    }

    /// The first active zone containing `p`
    pub fn find_containing(&self, p: Point) -> Option<&Zone> {
        self.zones.iter().find(|z| shape_contains(&z.shape, p))
    }

    pub fn get(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.id == id)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use geoattend_api::ZoneShape;

    fn circle(id: &str, lat: f64, lng: f64, radius: u32, active: bool) -> Zone {
        Zone {
            id: ZoneId::new(id),
            name: id.to_string(),
            description: None,
            shape: ZoneShape::Circle {
                center: Point::new(lat, lng),
                radius_meters: radius,
            },
            active,
            created_at: Local.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_directory_finds_nothing() {
        let dir = ZoneDirectory::default();
        assert!(dir.is_empty());
        assert!(dir.find_containing(Point::new(0.0, 0.0)).is_none());
        assert!(dir.find_containing(Point::new(45.0, 90.0)).is_none());
    }

    #[test]
    fn first_match_wins() {
        let dir = ZoneDirectory::new(vec![
            circle("outer", 0.0, 0.0, 5000, true),
            circle("inner", 0.0, 0.0, 100, true),
        ]);
        let found = dir.find_containing(Point::new(0.0, 0.0)).unwrap();
        assert_eq!(found.id, ZoneId::new("outer"));
    }

    #[test]
    fn inactive_zones_are_skipped() {
        let dir = ZoneDirectory::new(vec![
            circle("closed", 0.0, 0.0, 5000, false),
            circle("open", 0.0, 0.0, 100, true),
        ]);
        assert_eq!(dir.len(), 1);
        assert!(dir.get(&ZoneId::new("closed")).is_none());
        let found = dir.find_containing(Point::new(0.0, 0.0)).unwrap();
        assert_eq!(found.id, ZoneId::new("open"));

        // Outside the small active zone but inside the inactive one
        assert!(dir.find_containing(Point::new(0.01, 0.0)).is_none());
    }
}
