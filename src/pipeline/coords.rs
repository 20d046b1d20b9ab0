//! Cell site coordinate mapping

use crate::config::CellCoordinates;
use crate::error::{PrepError, Result};
use crate::pipeline::neighbors::SelectedMeasurement;
use tracing::warn;

/// Site coordinates of the serving and selected neighbor cells of a row
#[derive(Debug, Clone, PartialEq)]
pub struct CellSites {
    pub serving: Option<(f64, f64)>,
    pub neighbors: Vec<Option<(f64, f64)>>,
}

/// Look up the cells referenced by a row; unknown ids stay `None`
pub fn map_sites(measurement: &SelectedMeasurement, coordinates: &CellCoordinates) -> CellSites {
    CellSites {
        serving: measurement
            .serving_cell
            .and_then(|id| coordinates.lookup(id)),
        neighbors: measurement
            .neighbors
            .iter()
            .map(|n| coordinates.lookup(n.cell_id))
            .collect(),
    }
}

/// Check every referenced cell id against the table.
///
/// Returns the ids without coordinates. In strict mode any such id is an error.
pub fn check_coverage<'a, I>(
    measurements: I,
    coordinates: &CellCoordinates,
    strict: bool,
) -> Result<Vec<i64>>
where
    I: IntoIterator<Item = &'a SelectedMeasurement>,
{
    let observed = measurements.into_iter().flat_map(|m| {
        m.serving_cell
            .into_iter()
            .chain(m.neighbors.iter().map(|n| n.cell_id))
    });
    let missing = coordinates.missing_ids(observed);

    if !missing.is_empty() {
        if strict {
            return Err(PrepError::MissingCoordinates { ids: missing });
        }
        warn!("No coordinates for cell ids {:?}; they map to 0", missing);
    }
    Ok(missing)
}
