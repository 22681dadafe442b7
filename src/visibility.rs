//! View-rectangle culling and pointer hit testing.

use crate::tile::TileId;
use glam::Vec2;

/// Axis-aligned rectangle in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// World-space footprint of one tile as currently drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub id: TileId,
    pub rect: Rect,
}

/// Ids of tiles overlapping `view` grown by `margin`.
pub fn cull<I>(tiles: I, view: &Rect, margin: f32) -> Vec<TileId>
where
    I: IntoIterator<Item = TileBounds>,
{
    let view = view.expand(margin);
    tiles
        .into_iter()
        .filter(|t| t.rect.intersects(&view))
        .map(|t| t.id)
        .collect()
}

/// Topmost tile under `point`. Later tiles draw over earlier ones.
pub fn hit_test<I>(tiles: I, point: Vec2) -> Option<TileId>
where
    I: IntoIterator<Item = TileBounds>,
{
    tiles
        .into_iter()
        .filter(|t| t.rect.contains(point))
        .last()
        .map(|t| t.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(id: usize, x: f32, y: f32) -> TileBounds {
        TileBounds {
            id: TileId(id),
            rect: Rect::from_center(Vec2::new(x, y), Vec2::new(0.9, 1.0)),
        }
    }

    #[test]
    fn test_cull_keeps_overlapping_tiles() {
        let view = Rect::from_center(Vec2::ZERO, Vec2::new(4.0, 3.0));
        let tiles = [tile(0, 0.0, 0.0), tile(1, 6.0, 0.0), tile(2, 0.0, -30.0)];
        assert_eq!(cull(tiles, &view, 0.0), vec![TileId(0)]);
        // Margin pulls in the neighbor just off screen
        assert_eq!(cull(tiles, &view, 1.5), vec![TileId(0), TileId(1)]);
    }

    #[test]
    fn test_hit_test() {
        let tiles = [tile(0, 0.0, 0.0), tile(1, 3.0, 0.0)];
        assert_eq!(hit_test(tiles, Vec2::new(3.2, 0.5)), Some(TileId(1)));
        assert_eq!(hit_test(tiles, Vec2::new(1.5, 0.0)), None);
    }

    #[test]
    fn test_rect_extents() {
        let r = Rect::from_center(Vec2::new(1.0, 1.0), Vec2::new(2.0, 0.5));
        assert_eq!(r.width(), 4.0);
        assert_eq!(r.height(), 1.0);
        assert_eq!(r.center(), Vec2::new(1.0, 1.0));
    }
}
