//! Dense cell grid with multi-tile footprints.

use tile_arena_core::{
    config::{CellDef, Footprint, EMPTY_CELL},
    Aabb, PlacementError, TileCoord, Vec2,
};

/// Index of a cell definition within the palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u16);

impl CellId {
    /// Palette index of the empty cell.
    pub const EMPTY: CellId = CellId(0);

    /// Numeric palette index.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Offset of a slot from the anchor tile of the cell occupying it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellOffset {
    column: u32,
    row: u32,
}

impl CellOffset {
    /// Creates a new offset.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Columns between the slot and the anchor.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Rows between the slot and the anchor.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Slot {
    cell: CellId,
    offset: CellOffset,
}

impl Default for CellId {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Ordered set of cell definitions shared by every slot that references them.
///
/// Index zero always holds the walkable one-tile `Empty` cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellPalette {
    cells: Vec<CellDef>,
}

impl CellPalette {
    /// Builds a palette, forcing `Empty` to index zero and dropping duplicate names.
    #[must_use]
    pub fn new(definitions: Vec<CellDef>) -> Self {
        let mut empty = definitions
            .iter()
            .find(|cell| cell.name == EMPTY_CELL)
            .cloned()
            .unwrap_or_else(CellDef::empty);
        empty.walkable = true;
        empty.footprint = Footprint::default();

        let mut cells = vec![empty];
        for definition in definitions {
            if cells.iter().any(|cell| cell.name == definition.name) {
                if definition.name != EMPTY_CELL {
                    tracing::warn!(cell = %definition.name, "duplicate_cell_definition_ignored");
                }
                continue;
            }
            if definition.footprint.width == 0 || definition.footprint.height == 0 {
                tracing::warn!(cell = %definition.name, "cell_with_empty_footprint_ignored");
                continue;
            }
            if cells.len() > usize::from(u16::MAX) {
                tracing::warn!(cell = %definition.name, "cell_palette_full");
                break;
            }
            cells.push(definition);
        }
        Self { cells }
    }

    /// Resolves a cell name to its palette index.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<CellId> {
        self.cells
            .iter()
            .position(|cell| cell.name == name)
            .and_then(|index| u16::try_from(index).ok())
            .map(CellId)
    }

    /// Definition stored at the palette index.
    #[must_use]
    pub fn get(&self, id: CellId) -> Option<&CellDef> {
        self.cells.get(usize::from(id.0))
    }

    /// Iterator over every definition in palette order.
    pub fn iter(&self) -> impl Iterator<Item = &CellDef> {
        self.cells.iter()
    }

    /// Number of definitions, the empty cell included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; the empty cell is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Default for CellPalette {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Unrecoverable grid configuration failures.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum GridError {
    /// The grid would contain no tiles or too many to address.
    #[error("grid dimensions {columns}x{rows} are invalid")]
    InvalidDimensions {
        /// Requested number of columns.
        columns: u32,
        /// Requested number of rows.
        rows: u32,
    },
    /// Tiles must have a finite positive side length.
    #[error("tile length {0} is not a finite positive number")]
    InvalidTileLength(f32),
    /// Scale factors must be at least one.
    #[error("grid scale factor {0} is invalid")]
    InvalidScaleFactor(u32),
}

/// Dense grid of slots, each referencing exactly one palette cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    tile_length: f32,
    scale: u32,
    palette: CellPalette,
    slots: Vec<Slot>,
    revision: u64,
}

impl Grid {
    /// Creates a grid filled with the empty cell.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_length: f32,
        palette: CellPalette,
    ) -> Result<Self, GridError> {
        Self::with_scale(columns, rows, tile_length, 1, palette)
    }

    /// Creates an empty grid that already accumulated the provided scale.
    pub fn with_scale(
        columns: u32,
        rows: u32,
        tile_length: f32,
        scale: u32,
        palette: CellPalette,
    ) -> Result<Self, GridError> {
        if !(tile_length.is_finite() && tile_length > 0.0) {
            return Err(GridError::InvalidTileLength(tile_length));
        }
        if scale == 0 {
            return Err(GridError::InvalidScaleFactor(scale));
        }
        let capacity = slot_capacity(columns, rows)?;
        Ok(Self {
            columns,
            rows,
            tile_length,
            scale,
            palette,
            slots: vec![Slot::default(); capacity],
            revision: 0,
        })
    }

    /// Grid without any tiles, used before the first configuration.
    pub(crate) fn unconfigured(palette: CellPalette) -> Self {
        Self {
            columns: 0,
            rows: 0,
            tile_length: 1.0,
            scale: 1,
            palette,
            slots: Vec::new(),
            revision: 0,
        }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a tile in pixels.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Product of every scale factor applied since configuration.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }

    /// Counter bumped by every successful mutation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Palette shared by every slot.
    #[must_use]
    pub fn palette(&self) -> &CellPalette {
        &self.palette
    }

    /// Pixel-space rectangle covered by the grid.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            Vec2::ZERO,
            Vec2::new(
                self.columns as f32 * self.tile_length,
                self.rows as f32 * self.tile_length,
            ),
        )
    }

    /// Reports whether the tile lies inside the grid.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        self.index(tile).is_some()
    }

    /// Cell occupying the tile, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, tile: TileCoord) -> Option<&CellDef> {
        let slot = self.slot(tile)?;
        self.palette.get(slot.cell)
    }

    /// Palette index of the cell occupying the tile.
    #[must_use]
    pub fn cell_id(&self, tile: TileCoord) -> Option<CellId> {
        self.slot(tile).map(|slot| slot.cell)
    }

    /// Offset of the tile from the anchor of the cell occupying it.
    #[must_use]
    pub fn offset(&self, tile: TileCoord) -> Option<CellOffset> {
        self.slot(tile).map(|slot| slot.offset)
    }

    /// Anchor tile of the cell occupying the tile.
    #[must_use]
    pub fn anchor(&self, tile: TileCoord) -> Option<TileCoord> {
        let slot = self.slot(tile)?;
        Some(tile.offset(
            -(slot.offset.column as i32),
            -(slot.offset.row as i32),
        ))
    }

    /// Reports whether entities may stand on the tile; false outside the grid.
    #[must_use]
    pub fn is_walkable(&self, tile: TileCoord) -> bool {
        self.get(tile).map_or(false, |cell| cell.walkable)
    }

    /// Trigger tag carried by the cell occupying the tile.
    #[must_use]
    pub fn trigger(&self, tile: TileCoord) -> Option<&str> {
        self.get(tile).and_then(|cell| cell.trigger.as_deref())
    }

    /// Places the named cell with its scaled footprint anchored at `origin`.
    ///
    /// Cells overlapped by the new footprint are removed in full first. A
    /// rejected placement leaves the grid untouched.
    pub fn set(&mut self, origin: TileCoord, name: &str) -> Result<(), PlacementError> {
        let result = self.try_set(origin, name);
        if let Err(reason) = result {
            tracing::warn!(
                column = origin.column(),
                row = origin.row(),
                cell = name,
                reason = %reason,
                "cell_placement_rejected"
            );
        }
        result
    }

    fn try_set(&mut self, origin: TileCoord, name: &str) -> Result<(), PlacementError> {
        let id = self.palette.id(name).ok_or(PlacementError::UnknownCell)?;
        let (width, height) = if id == CellId::EMPTY {
            (1, 1)
        } else {
            let footprint = self
                .palette
                .get(id)
                .map(|cell| cell.footprint)
                .ok_or(PlacementError::UnknownCell)?;
            (footprint.width, footprint.height)
        };
        let width = u64::from(width) * u64::from(self.scale);
        let height = u64::from(height) * u64::from(self.scale);

        let fits = origin.column() >= 0
            && origin.row() >= 0
            && origin.column() as u64 + width <= u64::from(self.columns)
            && origin.row() as u64 + height <= u64::from(self.rows);
        if !fits {
            return Err(PlacementError::OutOfBounds);
        }

        let width = width as u32;
        let height = height as u32;
        for tile in footprint_tiles(origin, width, height) {
            let _ = self.clear_slots(tile);
        }
        for row in 0..height {
            for column in 0..width {
                let tile = origin.offset(column as i32, row as i32);
                let offset = if id == CellId::EMPTY {
                    CellOffset::default()
                } else {
                    CellOffset::new(column, row)
                };
                if let Some(index) = self.index(tile) {
                    self.slots[index] = Slot { cell: id, offset };
                }
            }
        }
        self.revision = self.revision.saturating_add(1);
        Ok(())
    }

    /// Resets the whole footprint of the cell covering `tile` to the empty cell.
    ///
    /// Returns the removed cell's anchor and name, or `None` when the tile is
    /// empty or outside the grid.
    pub fn clear(&mut self, tile: TileCoord) -> Option<(TileCoord, String)> {
        let removed = self.clear_slots(tile)?;
        self.revision = self.revision.saturating_add(1);
        Some(removed)
    }

    fn clear_slots(&mut self, tile: TileCoord) -> Option<(TileCoord, String)> {
        let slot = self.slot(tile)?;
        if slot.cell == CellId::EMPTY {
            return None;
        }
        let anchor = self.anchor(tile)?;
        let cell = self.palette.get(slot.cell)?;
        let name = cell.name.clone();
        let width = cell.footprint.width.saturating_mul(self.scale);
        let height = cell.footprint.height.saturating_mul(self.scale);

        for covered in footprint_tiles(anchor, width, height) {
            if let Some(index) = self.index(covered) {
                if self.slots[index].cell == slot.cell {
                    self.slots[index] = Slot::default();
                }
            }
        }
        Some((anchor, name))
    }

    /// Rebuilds the grid at `factor` times its resolution.
    ///
    /// Every source slot becomes a `factor`×`factor` block whose offsets keep
    /// pointing at the scaled anchor. Tile length is unchanged.
    pub fn scale_by(&self, factor: u32) -> Result<Grid, GridError> {
        if factor == 0 {
            return Err(GridError::InvalidScaleFactor(factor));
        }
        if self.columns == 0 || self.rows == 0 {
            return Err(GridError::InvalidDimensions {
                columns: self.columns,
                rows: self.rows,
            });
        }
        let invalid = GridError::InvalidDimensions {
            columns: self.columns,
            rows: self.rows,
        };
        let columns = self.columns.checked_mul(factor).ok_or(invalid)?;
        let rows = self.rows.checked_mul(factor).ok_or(invalid)?;
        let scale = self
            .scale
            .checked_mul(factor)
            .ok_or(GridError::InvalidScaleFactor(factor))?;

        let mut scaled = Grid::with_scale(
            columns,
            rows,
            self.tile_length,
            scale,
            self.palette.clone(),
        )?;
        let source_width = self.columns as usize;
        let target_width = columns as usize;
        for (index, slot) in self.slots.iter().enumerate() {
            let column = (index % source_width) as u32;
            let row = (index / source_width) as u32;
            for sub_row in 0..factor {
                for sub_column in 0..factor {
                    let offset = if slot.cell == CellId::EMPTY {
                        CellOffset::default()
                    } else {
                        CellOffset::new(
                            slot.offset.column * factor + sub_column,
                            slot.offset.row * factor + sub_row,
                        )
                    };
                    let target_column = (column * factor + sub_column) as usize;
                    let target_row = (row * factor + sub_row) as usize;
                    scaled.slots[target_row * target_width + target_column] = Slot {
                        cell: slot.cell,
                        offset,
                    };
                }
            }
        }
        scaled.revision = self.revision.saturating_add(1);
        Ok(scaled)
    }

    /// Anchors of every non-empty cell in row-major order.
    #[must_use]
    pub fn anchors(&self) -> Vec<(TileCoord, &str)> {
        let width = self.columns as usize;
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.cell != CellId::EMPTY && slot.offset == CellOffset::default())
            .filter_map(|(index, slot)| {
                let cell = self.palette.get(slot.cell)?;
                let tile = TileCoord::new((index % width) as i32, (index / width) as i32);
                Some((tile, cell.name.as_str()))
            })
            .collect()
    }

    fn slot(&self, tile: TileCoord) -> Option<Slot> {
        self.index(tile).map(|index| self.slots[index])
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        let column = u32::try_from(tile.column()).ok()?;
        let row = u32::try_from(tile.row()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(row as usize * self.columns as usize + column as usize)
    }
}

fn slot_capacity(columns: u32, rows: u32) -> Result<usize, GridError> {
    let invalid = GridError::InvalidDimensions { columns, rows };
    if columns == 0 || rows == 0 {
        return Err(invalid);
    }
    let capacity = u64::from(columns) * u64::from(rows);
    usize::try_from(capacity)
        .ok()
        .filter(|capacity| *capacity <= isize::MAX as usize / 64)
        .ok_or(invalid)
}

fn footprint_tiles(origin: TileCoord, width: u32, height: u32) -> impl Iterator<Item = TileCoord> {
    (0..height).flat_map(move |row| {
        (0..width).map(move |column| origin.offset(column as i32, row as i32))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_arena_core::config::default_cells;

    fn grid(columns: u32, rows: u32) -> Grid {
        Grid::new(columns, rows, 32.0, CellPalette::new(default_cells())).expect("valid grid")
    }

    #[test]
    fn palette_forces_empty_to_index_zero() {
        let palette = CellPalette::new(vec![
            CellDef::new("wall", false),
            CellDef::new("wall", true),
        ]);
        assert_eq!(palette.id(EMPTY_CELL), Some(CellId::EMPTY));
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.get(CellId(1)).map(|cell| cell.walkable), Some(false));
    }

    #[test]
    fn placement_fills_the_full_footprint() {
        let mut grid = grid(6, 6);
        assert_eq!(grid.set(TileCoord::new(1, 1), "pillar"), Ok(()));

        assert_eq!(grid.revision(), 1);
        for tile in footprint_tiles(TileCoord::new(1, 1), 2, 2) {
            assert!(!grid.is_walkable(tile));
            assert_eq!(grid.anchor(tile), Some(TileCoord::new(1, 1)));
        }
        assert_eq!(grid.offset(TileCoord::new(2, 2)), Some(CellOffset::new(1, 1)));
        assert!(grid.is_walkable(TileCoord::new(3, 1)));
    }

    #[test]
    fn out_of_bounds_placement_is_rejected_without_mutation() {
        let mut grid = grid(4, 4);
        let before = grid.clone();
        assert_eq!(
            grid.set(TileCoord::new(3, 3), "pillar"),
            Err(PlacementError::OutOfBounds)
        );
        assert_eq!(
            grid.set(TileCoord::new(-1, 0), "wall"),
            Err(PlacementError::OutOfBounds)
        );
        assert_eq!(
            grid.set(TileCoord::new(0, 0), "lava"),
            Err(PlacementError::UnknownCell)
        );
        assert_eq!(grid, before);
    }

    #[test]
    fn queries_outside_the_grid_return_sentinels() {
        let grid = grid(3, 3);
        assert!(grid.get(TileCoord::new(3, 0)).is_none());
        assert!(grid.get(TileCoord::new(0, -1)).is_none());
        assert!(!grid.is_walkable(TileCoord::new(-5, 7)));
        assert_eq!(grid.trigger(TileCoord::new(9, 9)), None);
    }

    #[test]
    fn overlapping_placement_removes_the_previous_cell_in_full() {
        let mut grid = grid(6, 6);
        assert_eq!(grid.set(TileCoord::new(0, 0), "pillar"), Ok(()));
        assert_eq!(grid.set(TileCoord::new(1, 1), "wall"), Ok(()));

        assert!(grid.is_walkable(TileCoord::new(0, 0)));
        assert!(grid.is_walkable(TileCoord::new(1, 0)));
        assert!(grid.is_walkable(TileCoord::new(0, 1)));
        assert!(!grid.is_walkable(TileCoord::new(1, 1)));
        assert_eq!(grid.anchors(), vec![(TileCoord::new(1, 1), "wall")]);
    }

    #[test]
    fn clearing_any_covered_tile_removes_the_footprint() {
        let mut grid = grid(6, 6);
        assert_eq!(grid.set(TileCoord::new(2, 2), "pillar"), Ok(()));

        let removed = grid.clear(TileCoord::new(3, 3));
        assert_eq!(removed, Some((TileCoord::new(2, 2), "pillar".to_owned())));
        for tile in footprint_tiles(TileCoord::new(2, 2), 2, 2) {
            assert_eq!(grid.cell_id(tile), Some(CellId::EMPTY));
        }
        assert_eq!(grid.clear(TileCoord::new(3, 3)), None);
    }

    #[test]
    fn scaling_replicates_slots_with_corrected_offsets() {
        let mut grid = grid(3, 2);
        assert_eq!(grid.set(TileCoord::new(1, 0), "pillar"), Ok(()));

        let scaled = grid.scale_by(2).expect("scaled grid");
        assert_eq!((scaled.columns(), scaled.rows()), (6, 4));
        assert_eq!(scaled.scale(), 2);
        assert_eq!(scaled.tile_length(), 32.0);

        assert_eq!(scaled.anchor(TileCoord::new(5, 3)), Some(TileCoord::new(2, 0)));
        assert_eq!(scaled.offset(TileCoord::new(5, 3)), Some(CellOffset::new(3, 3)));
        assert_eq!(scaled.anchors(), vec![(TileCoord::new(2, 0), "pillar")]);
        assert!(scaled.is_walkable(TileCoord::new(1, 3)));
    }

    #[test]
    fn placement_after_scaling_uses_the_scaled_footprint() {
        let mut scaled = grid(4, 4).scale_by(2).expect("scaled grid");
        assert_eq!(scaled.set(TileCoord::new(0, 0), "wall"), Ok(()));
        assert!(!scaled.is_walkable(TileCoord::new(1, 1)));
        assert!(scaled.is_walkable(TileCoord::new(2, 0)));

        let mut cleared = scaled.clone();
        assert_eq!(
            cleared.clear(TileCoord::new(1, 0)),
            Some((TileCoord::new(0, 0), "wall".to_owned()))
        );
        assert!(cleared.is_walkable(TileCoord::new(1, 1)));
    }

    #[test]
    fn invalid_configuration_fails_fast() {
        assert_eq!(
            Grid::new(0, 4, 32.0, CellPalette::default()),
            Err(GridError::InvalidDimensions { columns: 0, rows: 4 })
        );
        assert!(matches!(
            Grid::new(4, 4, 0.0, CellPalette::default()),
            Err(GridError::InvalidTileLength(_))
        ));
        assert_eq!(grid(2, 2).scale_by(0), Err(GridError::InvalidScaleFactor(0)));
        assert!(Grid::unconfigured(CellPalette::default()).scale_by(2).is_err());
    }
}
