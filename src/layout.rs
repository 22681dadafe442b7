//! Masonry layout: places each item into the currently shortest column.

use crate::config::LayoutSettings;
use crate::constants::{ASPECT_RATIOS, LAYOUT_ROUNDING};
use crate::error::GalleryError;
use crate::tile::TileId;
use glam::Vec2;

/// Where one item landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlacement {
    pub id: TileId,
    pub column: usize,
    /// Center of the tile in world units (the grid grows toward -y)
    pub center: Vec2,
    pub size: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub columns: usize,
    pub tiles: Vec<TilePlacement>,
    /// Tallest column accumulator
    pub content_height: f32,
}

impl LayoutResult {
    /// Initial camera y: a third of the way down the grid, which favors the
    /// top rows over the geometric center.
    pub fn initial_camera_y(&self) -> f32 {
        -self.content_height / 3.0
    }
}

/// Aspect ratio (height / width) for the item at `index`.
pub fn aspect_ratio(index: usize) -> f32 {
    ASPECT_RATIOS[index % ASPECT_RATIOS.len()]
}

fn round_to_grid(value: f32) -> f32 {
    (value * LAYOUT_ROUNDING).round() / LAYOUT_ROUNDING
}

/// Lay out `item_count` items into `column_count` columns.
pub fn layout(
    item_count: usize,
    column_count: usize,
    settings: &LayoutSettings,
) -> Result<LayoutResult, GalleryError> {
    if item_count == 0 {
        return Err(GalleryError::EmptyManifest);
    }
    if column_count < 1 {
        return Err(GalleryError::InvalidColumnCount(column_count));
    }

    let column_spacing = settings.column_width + settings.horizontal_gap;
    let float_slack = settings.max_float_amplitude * 2.0;
    let mut column_heights = vec![0.0f32; column_count];
    let mut tiles = Vec::with_capacity(item_count);

    for index in 0..item_count {
        // Strict `<` keeps the leftmost column on ties
        let mut column = 0;
        for (candidate, &height) in column_heights.iter().enumerate().skip(1) {
            if height < column_heights[column] {
                column = candidate;
            }
        }

        let height = settings.column_width * aspect_ratio(index);
        let x = (column as f32 - column_count as f32 / 2.0 + 0.5) * column_spacing;
        let y = -(column_heights[column] + height / 2.0);

        tiles.push(TilePlacement {
            id: TileId(index),
            column,
            center: Vec2::new(round_to_grid(x), round_to_grid(y)),
            size: Vec2::new(settings.column_width, height),
        });

        column_heights[column] += height + settings.vertical_gap + float_slack;
    }

    let content_height = column_heights.iter().copied().fold(0.0, f32::max);

    Ok(LayoutResult {
        columns: column_count,
        tiles,
        content_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn settings() -> LayoutSettings {
        LayoutSettings::default()
    }

    #[test]
    fn test_empty_manifest_is_rejected() {
        assert!(matches!(layout(0, 3, &settings()), Err(GalleryError::EmptyManifest)));
    }

    #[test]
    fn test_zero_columns_is_rejected() {
        assert!(matches!(
            layout(5, 0, &settings()),
            Err(GalleryError::InvalidColumnCount(0))
        ));
    }

    #[test]
    fn test_seventeen_items_three_columns_follow_shortest_column() {
        let s = settings();
        let result = layout(17, 3, &s).unwrap();
        assert_eq!(result.tiles.len(), 17);

        // Replay the heuristic by hand
        let mut heights = [0.0f32; 3];
        for (index, tile) in result.tiles.iter().enumerate() {
            let mut expected = 0;
            for c in 1..3 {
                if heights[c] < heights[expected] {
                    expected = c;
                }
            }
            assert_eq!(tile.column, expected, "tile {index}");
            let h = s.column_width * ASPECT_RATIOS[index];
            let expected_y = -(heights[expected] + h / 2.0);
            assert!((tile.center.y - expected_y).abs() <= 0.005, "tile {index}");
            assert!((tile.size.y - h).abs() < 1e-6);
            heights[expected] += h + s.vertical_gap + s.max_float_amplitude * 2.0;
        }

        // Tile 0 sits at the top of column 0, tiles 1 and 2 fill the others
        let first = result.tiles[0];
        assert_eq!(first.column, 0);
        assert!((first.center.y - (-(1.8 * 1.2) / 2.0)).abs() < 1e-4);
        assert_eq!(result.tiles[1].column, 1);
        assert_eq!(result.tiles[2].column, 2);
        // Column 0 (height 2.16) is shortest after the first row
        assert_eq!(result.tiles[3].column, 0);
    }

    #[test]
    fn test_column_centers_are_symmetric() {
        let result = layout(3, 3, &settings()).unwrap();
        let spacing = 1.8 + 0.4;
        assert!((result.tiles[0].center.x + spacing).abs() < 1e-4);
        assert!(result.tiles[1].center.x.abs() < 1e-4);
        assert!((result.tiles[2].center.x - spacing).abs() < 1e-4);
    }

    #[test]
    fn test_content_height_and_initial_camera() {
        let result = layout(1, 2, &settings()).unwrap();
        let expected = 1.8 * 1.2 + 0.5 + 0.05;
        assert!((result.content_height - expected).abs() < 1e-5);
        assert!((result.initial_camera_y() + expected / 3.0).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_every_item_placed_in_range(n in 1usize..120, c in 1usize..8) {
            let result = layout(n, c, &settings()).unwrap();
            prop_assert_eq!(result.tiles.len(), n);
            for (i, tile) in result.tiles.iter().enumerate() {
                prop_assert_eq!(tile.id, TileId(i));
                prop_assert!(tile.column < c);
            }
        }

        #[test]
        fn prop_columns_grow_downward_without_overlap(n in 1usize..120, c in 1usize..8) {
            let result = layout(n, c, &settings()).unwrap();
            for column in 0..c {
                let stacked: Vec<_> = result.tiles.iter().filter(|t| t.column == column).collect();
                for pair in stacked.windows(2) {
                    let (above, below) = (pair[0], pair[1]);
                    prop_assert!(below.center.y.abs() > above.center.y.abs());
                    let above_bottom = above.center.y - above.size.y / 2.0;
                    let below_top = below.center.y + below.size.y / 2.0;
                    prop_assert!(below_top < above_bottom);
                }
            }
        }

        #[test]
        fn prop_layout_is_deterministic(n in 1usize..80, c in 1usize..8) {
            let a = layout(n, c, &settings()).unwrap();
            let b = layout(n, c, &settings()).unwrap();
            for (x, y) in a.tiles.iter().zip(&b.tiles) {
                prop_assert_eq!(x.center.x.to_bits(), y.center.x.to_bits());
                prop_assert_eq!(x.center.y.to_bits(), y.center.y.to_bits());
            }
        }
    }
}
