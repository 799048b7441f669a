//! Rules that stop a strip from shrinking over player content.
//!
//! A shrink retracts the valid rectangle from `current` to a smaller
//! `candidate`. The cells that would drop out are exactly the ones inside
//! `current` but outside `candidate`; if any of them is occupied or zoned and
//! the matching flag is on, the shrink is refused and the strip keeps its
//! previous geometry.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::grid::{CellRect, StripCells};

/// Host-managed conflict-avoidance flags, read every tick.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneDepthSettings {
    /// Refuse to retract a strip past a cell with a building on it.
    pub block_occupied_cell_removal: bool,
    /// Refuse to retract a strip past a cell that already has a zone.
    pub block_zoned_cell_removal: bool,
}

impl Default for ZoneDepthSettings {
    fn default() -> Self {
        Self {
            block_occupied_cell_removal: true,
            block_zoned_cell_removal: true,
        }
    }
}

pub fn any_cell_occupied(cells: &StripCells, current: CellRect, candidate: CellRect) -> bool {
    current
        .cells_outside(candidate)
        .any(|(x, y)| cells.get(x, y).is_some_and(|c| c.occupied))
}

pub fn any_cell_zoned(cells: &StripCells, current: CellRect, candidate: CellRect) -> bool {
    current
        .cells_outside(candidate)
        .any(|(x, y)| cells.get(x, y).is_some_and(|c| c.zone.is_zoned()))
}

/// Whether `current` may be replaced by `candidate`.
///
/// Growth (candidate covers current) never inspects the cells.
pub fn may_shrink_to(
    cells: &StripCells,
    current: CellRect,
    candidate: CellRect,
    settings: &ZoneDepthSettings,
) -> bool {
    if candidate.contains_rect(&current) {
        return true;
    }
    if settings.block_occupied_cell_removal && any_cell_occupied(cells, current, candidate) {
        return false;
    }
    if settings.block_zoned_cell_removal && any_cell_zoned(cells, current, candidate) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ZoneType;

    const BOTH: ZoneDepthSettings = ZoneDepthSettings {
        block_occupied_cell_removal: true,
        block_zoned_cell_removal: true,
    };
    const NEITHER: ZoneDepthSettings = ZoneDepthSettings {
        block_occupied_cell_removal: false,
        block_zoned_cell_removal: false,
    };

    fn cells_with(occupied: &[(u32, u32)], zoned: &[(u32, u32)]) -> StripCells {
        let mut cells = StripCells::new(4);
        for &(x, y) in occupied {
            if let Some(cell) = cells.get_mut(x, y) {
                cell.occupied = true;
            }
        }
        for &(x, y) in zoned {
            if let Some(cell) = cells.get_mut(x, y) {
                cell.zone = ZoneType::ResidentialLow;
            }
        }
        cells
    }

    #[test]
    fn test_empty_cells_allow_shrink() {
        let cells = cells_with(&[], &[]);
        let current = CellRect::from_origin(4, 6);
        let candidate = CellRect::from_origin(4, 0);
        assert!(may_shrink_to(&cells, current, candidate, &BOTH));
    }

    #[test]
    fn test_occupied_cell_in_retracted_band_blocks() {
        let cells = cells_with(&[(1, 2)], &[]);
        let current = CellRect::from_origin(4, 6);
        assert!(any_cell_occupied(&cells, current, CellRect::from_origin(4, 2)));
        assert!(!may_shrink_to(&cells, current, CellRect::from_origin(4, 2), &BOTH));
        // Depth 3 keeps row 2 inside, so the building is safe.
        assert!(may_shrink_to(&cells, current, CellRect::from_origin(4, 3), &BOTH));
    }

    #[test]
    fn test_zoned_cell_blocks_only_with_flag() {
        let cells = cells_with(&[], &[(0, 5)]);
        let current = CellRect::from_origin(4, 6);
        let candidate = CellRect::from_origin(4, 4);
        assert!(any_cell_zoned(&cells, current, candidate));
        assert!(!may_shrink_to(&cells, current, candidate, &BOTH));
        let occupied_only = ZoneDepthSettings {
            block_zoned_cell_removal: false,
            ..BOTH
        };
        assert!(may_shrink_to(&cells, current, candidate, &occupied_only));
    }

    #[test]
    fn test_flags_off_allow_destructive_shrink() {
        let cells = cells_with(&[(0, 0), (3, 5)], &[(2, 3)]);
        let current = CellRect::from_origin(4, 6);
        assert!(may_shrink_to(&cells, current, CellRect::from_origin(4, 0), &NEITHER));
    }

    #[test]
    fn test_growth_always_allowed() {
        // Every cell occupied and zoned; growing from 2 to 6 must still pass.
        let all: Vec<(u32, u32)> = (0..6).flat_map(|y| (0..4).map(move |x| (x, y))).collect();
        let cells = cells_with(&all, &all);
        let current = CellRect::from_origin(4, 2);
        for depth in 2..=6 {
            assert!(may_shrink_to(&cells, current, CellRect::from_origin(4, depth), &BOTH));
        }
    }

    #[test]
    fn test_content_inside_candidate_is_ignored() {
        let cells = cells_with(&[(0, 0)], &[(1, 1)]);
        let current = CellRect::from_origin(4, 6);
        assert!(may_shrink_to(&cells, current, CellRect::from_origin(4, 2), &BOTH));
    }

    #[test]
    fn test_settings_missing_fields_use_defaults() {
        let settings: ZoneDepthSettings =
            serde_json::from_str(r#"{"block_zoned_cell_removal": false}"#).unwrap();
        assert!(settings.block_occupied_cell_removal);
        assert!(!settings.block_zoned_cell_removal);
    }
}
