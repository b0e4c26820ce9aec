use crate::data::Series;
use crate::ir::PixelRect;

/// Space between neighbouring facet cells
pub const CELL_GAP: f64 = 10.0;

/// Smallest cell that still leaves room for the axes and a plot area
pub const MIN_CELL_WIDTH: f64 = 160.0;
pub const MIN_CELL_HEIGHT: f64 = 120.0;

/// Grid arrangement of small-multiple panels
#[derive(Debug, Clone, PartialEq)]
pub struct FacetLayout {
    pub nrow: usize,
    pub ncol: usize,
    pub panel_titles: Vec<String>,
}

impl FacetLayout {
    /// One panel per series, titled with the series' group key
    pub fn from_series(series: &[Series]) -> Self {
        let (nrow, ncol) = calculate_grid_dimensions(series.len());
        Self {
            nrow,
            ncol,
            panel_titles: series.iter().map(|s| s.key.clone()).collect(),
        }
    }

    /// Shrinks the grid to what `area` can hold at the minimum cell size.
    ///
    /// Columns are capped first; panels beyond the last row that fits are
    /// dropped with a warning.
    pub fn fit_to(self, area: PixelRect) -> Self {
        if self.is_empty() {
            return self;
        }
        let max_cols = (((area.width + CELL_GAP) / (MIN_CELL_WIDTH + CELL_GAP)).floor() as usize).max(1);
        let max_rows = (((area.height + CELL_GAP) / (MIN_CELL_HEIGHT + CELL_GAP)).floor() as usize).max(1);

        let ncol = self.ncol.min(max_cols);
        let mut panel_titles = self.panel_titles;
        let capacity = ncol * max_rows;
        if panel_titles.len() > capacity {
            log::warn!(
                "{} facets do not fit in {}x{}, showing the first {}",
                panel_titles.len(),
                area.width,
                area.height,
                capacity
            );
            panel_titles.truncate(capacity);
        }
        let nrow = panel_titles.len().div_ceil(ncol);
        Self { nrow, ncol, panel_titles }
    }

    pub fn len(&self) -> usize {
        self.panel_titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panel_titles.is_empty()
    }

    /// `(row, col)` of the panel at `index`, filled row by row
    pub fn position(&self, index: usize) -> (usize, usize) {
        (index / self.ncol.max(1), index % self.ncol.max(1))
    }

    /// Pixel bounds of the panel at `index` inside `area`
    pub fn cell(&self, index: usize, area: PixelRect) -> PixelRect {
        let (row, col) = self.position(index);
        let ncol = self.ncol.max(1) as f64;
        let nrow = self.nrow.max(1) as f64;
        let width = (area.width - CELL_GAP * (ncol - 1.0)) / ncol;
        let height = (area.height - CELL_GAP * (nrow - 1.0)) / nrow;
        PixelRect::new(
            area.x + col as f64 * (width + CELL_GAP),
            area.y + row as f64 * (height + CELL_GAP),
            width,
            height,
        )
    }
}

/// Square-ish grid: as many columns as the ceiling of the square root
pub fn calculate_grid_dimensions(n_panels: usize) -> (usize, usize) {
    if n_panels == 0 {
        return (0, 0);
    }
    let cols = (n_panels as f64).sqrt().ceil() as usize;
    let rows = (n_panels as f64 / cols as f64).ceil() as usize;
    (rows, cols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_dimensions() {
        assert_eq!(calculate_grid_dimensions(0), (0, 0));
        assert_eq!(calculate_grid_dimensions(1), (1, 1));
        assert_eq!(calculate_grid_dimensions(3), (2, 2));
        assert_eq!(calculate_grid_dimensions(4), (2, 2));
        assert_eq!(calculate_grid_dimensions(5), (2, 3));
        assert_eq!(calculate_grid_dimensions(10), (3, 4));
    }

    #[test]
    fn test_layout_from_series() {
        let series: Vec<Series> = ["north", "south", "west"]
            .iter()
            .map(|k| Series { key: k.to_string(), points: Vec::new() })
            .collect();
        let layout = FacetLayout::from_series(&series);
        assert_eq!(layout.len(), 3);
        assert_eq!((layout.nrow, layout.ncol), (2, 2));
        assert_eq!(layout.position(2), (1, 0));
        assert_eq!(layout.panel_titles[1], "south");
    }

    fn titles(n: usize) -> Vec<Series> {
        (0..n).map(|i| Series { key: format!("g{}", i), points: Vec::new() }).collect()
    }

    #[test]
    fn test_fit_keeps_layout_that_fits() {
        let layout = FacetLayout::from_series(&titles(3));
        let fitted = layout.clone().fit_to(PixelRect::new(0.0, 0.0, 800.0, 600.0));
        assert_eq!(fitted, layout);
    }

    #[test]
    fn test_fit_never_goes_below_minimum_cell() {
        let area = PixelRect::new(0.0, 0.0, 800.0, 600.0);
        for n in [50, 100] {
            let layout = FacetLayout::from_series(&titles(n)).fit_to(area);
            assert!(layout.len() < n);
            assert!(layout.nrow * layout.ncol >= layout.len());
            for i in 0..layout.len() {
                let cell = layout.cell(i, area);
                assert!(cell.width >= MIN_CELL_WIDTH, "{:?}", cell);
                assert!(cell.height >= MIN_CELL_HEIGHT, "{:?}", cell);
            }
            assert_eq!(layout.panel_titles[0], "g0");
        }
    }

    #[test]
    fn test_fit_tiny_area_keeps_one_panel() {
        let layout = FacetLayout::from_series(&titles(4)).fit_to(PixelRect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(layout.len(), 1);
        assert_eq!((layout.nrow, layout.ncol), (1, 1));
    }

    #[test]
    fn test_cells_tile_the_area() {
        let layout = FacetLayout { nrow: 2, ncol: 2, panel_titles: vec![String::new(); 4] };
        let area = PixelRect::new(0.0, 0.0, 210.0, 110.0);
        assert_eq!(layout.cell(0, area), PixelRect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(layout.cell(3, area), PixelRect::new(110.0, 60.0, 100.0, 50.0));
    }
}
