use serde::{Deserialize, Serialize};
use std::fmt;

/// Permanent gene/clone identifier, independent of the physical layout.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct StableId(pub usize);

/// Physical spot position on one array layout.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct SpotId(pub usize);

/// Index of a sample in its `SampleStore`, in load order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct SampleId(pub usize);

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spot {}", self.0)
    }
}

/// A gene as seen by the engines: its stable id plus the spot it was printed
/// at, resolved once. `spot_id` is `None` for genes with no spot on the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneRef {
    /// Stable identifier.
    pub stable_id: StableId,
    /// Cached spot identifier, if assigned.
    pub spot_id: Option<SpotId>,
}

impl GeneRef {
    /// Create a gene reference.
    pub fn new(stable_id: StableId, spot_id: Option<SpotId>) -> Self {
        GeneRef { stable_id, spot_id }
    }
}

/// Position of a spot in the printed array: field, grid, row and column, all
/// 1-based as printed on the slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCoords {
    /// Field (duplicate print region).
    pub field: u32,
    /// Grid within the field.
    pub grid: u32,
    /// Row within the grid.
    pub row: u32,
    /// Column within the grid.
    pub column: u32,
}

impl GridCoords {
    /// Create grid coordinates.
    pub fn new(field: u32, grid: u32, row: u32, column: u32) -> Self {
        GridCoords {
            field,
            grid,
            row,
            column,
        }
    }
}

impl fmt::Display for GridCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "F{} G{} R{} C{}",
            self.field, self.grid, self.row, self.column
        )
    }
}

/// Screen position of a spot in a sample's pseudo-array image. `(0, 0)` means
/// the spot was never placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelCoord {
    /// Horizontal pixel.
    pub x: i32,
    /// Vertical pixel.
    pub y: i32,
}

impl PixelCoord {
    /// Create a pixel coordinate.
    pub fn new(x: i32, y: i32) -> Self {
        PixelCoord { x, y }
    }

    /// False for the `(0, 0)` unset sentinel.
    pub fn is_set(&self) -> bool {
        self.x != 0 || self.y != 0
    }

    /// Squared euclidean distance, computed in i64.
    pub fn dist_sq(&self, other: PixelCoord) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }
}

impl fmt::Display for PixelCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}
