//! Static surf spot reference data.
//!
//! The registry is built once at startup (from config, or the built-in Sydney list)
//! and handed by `Arc` to whatever needs it. It is never mutated afterwards.

use crate::{Coordinate, CoordinateError, SurfSpot};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpotError {
    #[error("duplicate spot name: {0}")]
    DuplicateName(String),

    #[error("spot {name}: {source}")]
    InvalidCoordinate {
        name: String,
        #[source]
        source: CoordinateError,
    },
}

/// The built-in Sydney beaches.
pub fn default_spots() -> Vec<SurfSpot> {
    // (name, latitude, longitude, camera)
    const SPOTS: [(&str, f64, f64, &str); 5] = [
        (
            "Bondi Beach",
            -33.890842,
            151.274292,
            "https://bondisurfclub.com/bondi-surf-cam/",
        ),
        (
            "Manly Beach",
            -33.791693,
            151.287632,
            "https://www.swellnet.com/surfcams/manly",
        ),
        (
            "Maroubra Beach",
            -33.948714,
            151.257127,
            "https://www.randwick.nsw.gov.au/facilities-and-recreation/beaches-and-coast/beaches/maroubra-beach",
        ),
        (
            "Curl Curl Beach",
            -33.769318,
            151.292159,
            "https://www.stewarthouse.org.au/curl-curl-surf-cam/",
        ),
        (
            "Wollongong",
            -34.424836,
            150.902157,
            "https://www.swellnet.com/surfcams/wollongong",
        ),
    ];

    SPOTS
        .iter()
        .map(|&(name, latitude, longitude, camera)| SurfSpot {
            name: name.to_string(),
            coordinate: Coordinate {
                latitude,
                longitude,
            },
            camera_url: Some(camera.to_string()),
        })
        .collect()
}

/// Validated, ordered list of spots with unique names.
#[derive(Clone, Debug)]
pub struct SpotRegistry {
    spots: Vec<SurfSpot>,
}

impl SpotRegistry {
    pub fn new(spots: Vec<SurfSpot>) -> Result<Self, SpotError> {
        for (i, spot) in spots.iter().enumerate() {
            spot.coordinate
                .validate()
                .map_err(|source| SpotError::InvalidCoordinate {
                    name: spot.name.clone(),
                    source,
                })?;
            if spots[..i].iter().any(|s| s.name == spot.name) {
                return Err(SpotError::DuplicateName(spot.name.clone()));
            }
        }
        Ok(SpotRegistry { spots })
    }

    pub fn get(&self, name: &str) -> Option<&SurfSpot> {
        self.spots.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SurfSpot> {
        self.spots.iter()
    }

    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_list_is_valid() {
        let registry = SpotRegistry::new(default_spots()).unwrap();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.iter().next().unwrap().name, "Bondi Beach");

        let manly = registry.get("Manly Beach").unwrap();
        assert_eq!(manly.coordinate.latitude, -33.791693);
        assert!(registry.get("Byron Bay").is_none());
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut spots = default_spots();
        spots.push(spots[0].clone());
        assert_eq!(
            SpotRegistry::new(spots).unwrap_err(),
            SpotError::DuplicateName("Bondi Beach".to_string())
        );
    }

    #[test]
    fn rejects_bad_coordinates() {
        let mut spots = default_spots();
        spots[2].coordinate.longitude = 200.0;
        match SpotRegistry::new(spots) {
            Err(SpotError::InvalidCoordinate { name, .. }) => assert_eq!(name, "Maroubra Beach"),
            other => panic!("expected invalid coordinate, got {other:?}"),
        }
    }
}
