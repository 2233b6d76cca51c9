//! Half-open border grid with run-length compaction.
//!
//! Borders live on the edges between cells, not on the cells themselves:
//! horizontal line `r` separates row `r - 1` from row `r`, vertical line `c`
//! separates column `c - 1` from column `c`. A cell's bottom edge is therefore
//! the same edge as the top edge of the cell below it.
//!
//! Along each line, equal adjacent edges are stored as one run `(start, span)`.

use std::collections::BTreeMap;

use crate::style::{BorderLine, CellBorders};

/// One edge of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BorderSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl BorderSide {
    pub const ALL: [BorderSide; 4] = [BorderSide::Top, BorderSide::Bottom, BorderSide::Left, BorderSide::Right];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Orientation {
    Horizontal,
    Vertical,
}

/// `(line, position)` of the edge `side` of cell `(row, col)`.
fn edge(row: u32, col: u32, side: BorderSide) -> (Orientation, u32, u32) {
    match side {
        BorderSide::Top => (Orientation::Horizontal, row, col),
        BorderSide::Bottom => (Orientation::Horizontal, row + 1, col),
        BorderSide::Left => (Orientation::Vertical, col, row),
        BorderSide::Right => (Orientation::Vertical, col + 1, row),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Run {
    line: BorderLine,
    span: u32,
}

/// Runs of one orientation, keyed by `(line, start)`.
#[derive(Clone, Debug, Default)]
struct Lines {
    runs: BTreeMap<(u32, u32), Run>,
}

impl Lines {
    /// The run covering `pos` on `line`, with its start.
    fn covering(&self, line: u32, pos: u32) -> Option<(u32, Run)> {
        let ((l, start), run) = self.runs.range(..=(line, pos)).next_back()?;
        if *l == line && pos < start + run.span {
            Some((*start, *run))
        } else {
            None
        }
    }

    fn get(&self, line: u32, pos: u32) -> Option<BorderLine> {
        self.covering(line, pos).map(|(_, run)| run.line)
    }

    fn set(&mut self, line: u32, pos: u32, value: Option<BorderLine>) {
        if let Some((start, run)) = self.covering(line, pos) {
            self.runs.remove(&(line, start));
            if pos > start {
                self.runs.insert((line, start), Run { line: run.line, span: pos - start });
            }
            let end = start + run.span;
            if pos + 1 < end {
                self.runs.insert((line, pos + 1), Run { line: run.line, span: end - pos - 1 });
            }
        }
        if let Some(value) = value {
            self.runs.insert((line, pos), Run { line: value, span: 1 });
        }
    }

    /// Merge touching equal runs, scanning each line from its far end.
    fn compact(&mut self) {
        let mut merged: BTreeMap<(u32, u32), Run> = BTreeMap::new();
        let mut pending: Option<((u32, u32), Run)> = None;
        for (&(line, start), &run) in self.runs.iter().rev() {
            pending = match pending {
                Some(((p_line, p_start), p_run))
                    if p_line == line && start + run.span == p_start && p_run.line == run.line =>
                {
                    Some(((line, start), Run { line: run.line, span: run.span + p_run.span }))
                }
                Some((key, p_run)) => {
                    merged.insert(key, p_run);
                    Some(((line, start), run))
                }
                None => Some(((line, start), run)),
            };
        }
        if let Some((key, run)) = pending {
            merged.insert(key, run);
        }
        self.runs = merged;
    }

    fn expanded(&self) -> impl Iterator<Item = (u32, u32, BorderLine)> + '_ {
        self.runs
            .iter()
            .flat_map(|(&(line, start), run)| (start..start + run.span).map(move |p| (line, p, run.line)))
    }
}

/// Borders of a whole sheet.
#[derive(Clone, Debug, Default)]
pub struct BorderGrid {
    horizontal: Lines,
    vertical: Lines,
}

impl BorderGrid {
    pub fn new() -> Self {
        Self::default()
    }

    fn lines(&self, orientation: Orientation) -> &Lines {
        match orientation {
            Orientation::Horizontal => &self.horizontal,
            Orientation::Vertical => &self.vertical,
        }
    }

    fn lines_mut(&mut self, orientation: Orientation) -> &mut Lines {
        match orientation {
            Orientation::Horizontal => &mut self.horizontal,
            Orientation::Vertical => &mut self.vertical,
        }
    }

    pub fn get(&self, row: u32, col: u32, side: BorderSide) -> Option<BorderLine> {
        let (o, line, pos) = edge(row, col, side);
        self.lines(o).get(line, pos)
    }

    /// Set or clear one edge. Clearing inside a run splits it.
    pub fn set(&mut self, row: u32, col: u32, side: BorderSide, value: Option<BorderLine>) {
        let (o, line, pos) = edge(row, col, side);
        self.lines_mut(o).set(line, pos, value);
    }

    /// The four edges around a cell.
    pub fn cell_borders(&self, row: u32, col: u32) -> CellBorders {
        CellBorders {
            top: self.get(row, col, BorderSide::Top),
            bottom: self.get(row, col, BorderSide::Bottom),
            left: self.get(row, col, BorderSide::Left),
            right: self.get(row, col, BorderSide::Right),
        }
    }

    /// Record every present edge of `borders`; absent edges are left alone.
    pub fn apply(&mut self, row: u32, col: u32, borders: &CellBorders) {
        let sides = [
            (BorderSide::Top, borders.top),
            (BorderSide::Bottom, borders.bottom),
            (BorderSide::Left, borders.left),
            (BorderSide::Right, borders.right),
        ];
        for (side, line) in sides {
            if line.is_some() {
                self.set(row, col, side, line);
            }
        }
    }

    /// Merge adjacent equal edges along every line into single runs.
    pub fn compact(&mut self) {
        self.horizontal.compact();
        self.vertical.compact();
    }

    /// Number of stored runs.
    pub fn run_count(&self) -> usize {
        self.horizontal.runs.len() + self.vertical.runs.len()
    }

    /// Longest run that starts at the given edge, if one starts there.
    pub fn run_span(&self, row: u32, col: u32, side: BorderSide) -> Option<u32> {
        let (o, line, pos) = edge(row, col, side);
        self.lines(o).runs.get(&(line, pos)).map(|r| r.span)
    }

    pub fn is_empty(&self) -> bool {
        self.run_count() == 0
    }

    /// Every cell that has at least one edge, as `(row, col)`, each cell once
    /// in row-major order. Edges on the outer side of a cell are attributed to
    /// the cell they belong to: the top line of row `r` to row `r`, the line
    /// below the last row to that row.
    pub fn touched_cells(&self) -> Vec<(u32, u32)> {
        let mut cells: Vec<(u32, u32)> = Vec::new();
        for (line, col, _) in self.horizontal.expanded() {
            cells.push((line, col));
            if line > 0 {
                cells.push((line - 1, col));
            }
        }
        for (line, row, _) in self.vertical.expanded() {
            cells.push((row, line));
            if line > 0 {
                cells.push((row, line - 1));
            }
        }
        cells.sort_unstable();
        cells.dedup();
        cells
    }

    /// Cells that must be written so every edge is carried by some cell:
    /// edges are emitted on the cell above/left of them, or on the cell
    /// below/right for line 0.
    pub fn carrier_cells(&self) -> Vec<(u32, u32)> {
        let mut cells: Vec<(u32, u32)> = Vec::new();
        for (line, col, _) in self.horizontal.expanded() {
            cells.push(if line == 0 { (0, col) } else { (line - 1, col) });
        }
        for (line, row, _) in self.vertical.expanded() {
            cells.push(if line == 0 { (row, 0) } else { (row, line - 1) });
        }
        cells.sort_unstable();
        cells.dedup();
        cells
    }

    /// Structural equality over the expanded edges, independent of compaction.
    pub fn content_eq(&self, other: &BorderGrid) -> bool {
        self.horizontal.expanded().eq(other.horizontal.expanded())
            && self.vertical.expanded().eq(other.vertical.expanded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::BorderLineStyle;

    #[test]
    fn test_shared_edge() {
        let mut grid = BorderGrid::new();
        grid.set(2, 3, BorderSide::Bottom, Some(BorderLine::thin()));
        assert_eq!(grid.get(3, 3, BorderSide::Top), Some(BorderLine::thin()));
        grid.set(1, 1, BorderSide::Right, Some(BorderLine::medium()));
        assert_eq!(grid.get(1, 2, BorderSide::Left), Some(BorderLine::medium()));
        assert_eq!(grid.get(1, 1, BorderSide::Left), None);
    }

    #[test]
    fn test_compaction_of_ten_top_borders() {
        let mut grid = BorderGrid::new();
        for col in 0..10 {
            grid.set(4, col, BorderSide::Top, Some(BorderLine::thin()));
        }
        let before = grid.clone();
        assert_eq!(grid.run_count(), 10);

        grid.compact();
        assert_eq!(grid.run_count(), 1);
        assert_eq!(grid.run_span(4, 0, BorderSide::Top), Some(10));
        for col in 0..10 {
            assert_eq!(grid.get(4, col, BorderSide::Top), Some(BorderLine::thin()));
        }
        assert_eq!(grid.get(4, 10, BorderSide::Top), None);
        assert!(grid.content_eq(&before));
    }

    #[test]
    fn test_compaction_keeps_different_styles_apart() {
        let mut grid = BorderGrid::new();
        for col in 0..6 {
            let line = if col < 3 { BorderLine::thin() } else { BorderLine::new(BorderLineStyle::Double) };
            grid.set(0, col, BorderSide::Bottom, Some(line));
        }
        grid.set(0, 8, BorderSide::Bottom, Some(BorderLine::thin()));
        grid.compact();
        assert_eq!(grid.run_count(), 3);
        assert_eq!(grid.run_span(0, 0, BorderSide::Bottom), Some(3));
        assert_eq!(grid.run_span(0, 3, BorderSide::Bottom), Some(3));
        assert_eq!(grid.run_span(0, 8, BorderSide::Bottom), Some(1));
    }

    #[test]
    fn test_set_inside_run_splits_it() {
        let mut grid = BorderGrid::new();
        for row in 0..5 {
            grid.set(row, 2, BorderSide::Left, Some(BorderLine::thick()));
        }
        grid.compact();
        grid.set(2, 2, BorderSide::Left, None);
        assert_eq!(grid.run_count(), 2);
        assert_eq!(grid.get(1, 2, BorderSide::Left), Some(BorderLine::thick()));
        assert_eq!(grid.get(2, 2, BorderSide::Left), None);
        assert_eq!(grid.get(3, 2, BorderSide::Left), Some(BorderLine::thick()));

        grid.set(4, 2, BorderSide::Left, Some(BorderLine::thin()));
        assert_eq!(grid.get(3, 2, BorderSide::Left), Some(BorderLine::thick()));
        assert_eq!(grid.get(4, 2, BorderSide::Left), Some(BorderLine::thin()));
    }

    #[test]
    fn test_carrier_cells() {
        let mut grid = BorderGrid::new();
        grid.apply(0, 0, &CellBorders::all(BorderLine::thin()));
        assert_eq!(grid.carrier_cells(), vec![(0, 0)]);
        assert_eq!(grid.touched_cells(), vec![(0, 0), (0, 1), (1, 0)]);
    }
}
