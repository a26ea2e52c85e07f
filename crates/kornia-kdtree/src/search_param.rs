use serde::{Deserialize, Serialize};

use crate::KdTreeError;

/// Selects how the neighborhood of a query point is gathered.
///
/// The parameter is plain data so it can be loaded from a configuration file,
/// e.g. `{"Hybrid": {"radius": 0.1, "max_nn": 30}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SearchParam {
    /// The `knn` closest points.
    Knn {
        /// Number of neighbors to return.
        knn: usize,
    },

    /// Every point within `radius` of the query.
    Radius {
        /// Search radius, inclusive.
        radius: f64,
    },

    /// Every point within `radius`, capped to the `max_nn` closest ones.
    Hybrid {
        /// Search radius, inclusive.
        radius: f64,
        /// Maximum number of neighbors to return.
        max_nn: usize,
    },
}

impl Default for SearchParam {
    fn default() -> Self {
        SearchParam::Knn { knn: 30 }
    }
}

fn validate_radius(radius: f64) -> Result<(), KdTreeError> {
    if radius > 0.0 && radius.is_finite() {
        Ok(())
    } else {
        Err(KdTreeError::InvalidRadius(radius))
    }
}

impl SearchParam {
    /// Check that the numeric parameters describe a meaningful search.
    pub fn validate(&self) -> Result<(), KdTreeError> {
        match *self {
            SearchParam::Knn { knn } => {
                if knn == 0 {
                    return Err(KdTreeError::InvalidKnn(knn));
                }
                Ok(())
            }
            SearchParam::Radius { radius } => validate_radius(radius),
            SearchParam::Hybrid { radius, max_nn } => {
                validate_radius(radius)?;
                if max_nn == 0 {
                    return Err(KdTreeError::InvalidMaxNn(max_nn));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_knn() {
        assert_eq!(SearchParam::default(), SearchParam::Knn { knn: 30 });
        assert!(SearchParam::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert_eq!(
            SearchParam::Knn { knn: 0 }.validate(),
            Err(KdTreeError::InvalidKnn(0))
        );
        assert_eq!(
            SearchParam::Radius { radius: -1.0 }.validate(),
            Err(KdTreeError::InvalidRadius(-1.0))
        );
        assert!(SearchParam::Radius { radius: f64::NAN }.validate().is_err());
        assert!(SearchParam::Radius {
            radius: f64::INFINITY
        }
        .validate()
        .is_err());
        assert_eq!(
            SearchParam::Hybrid {
                radius: 1.0,
                max_nn: 0
            }
            .validate(),
            Err(KdTreeError::InvalidMaxNn(0))
        );
    }

    #[test]
    fn test_deserialize_from_json() -> Result<(), Box<dyn std::error::Error>> {
        let json = r#"{"Hybrid": {"radius": 0.5, "max_nn": 12}}"#;
        let param: SearchParam = serde_json::from_str(json)?;
        assert_eq!(
            param,
            SearchParam::Hybrid {
                radius: 0.5,
                max_nn: 12
            }
        );

        let param: SearchParam = serde_json::from_str(r#"{"Knn": {"knn": 8}}"#)?;
        assert_eq!(param, SearchParam::Knn { knn: 8 });
        Ok(())
    }
}
