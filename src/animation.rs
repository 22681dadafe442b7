//! Per-tile transient visual state: intro slide-in, hover tilt and scale,
//! tier crossfade, placeholder spinner.
//!
//! `AnimState` lives in an arena parallel to the tile `Vec` and knows
//! nothing about rendering.

use crate::constants::*;
use glam::Vec2;

/// Cubic ease-out.
pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Move `value` a fixed fraction toward `target`, snapping once close enough.
pub fn approach(value: f32, target: f32, rate: f32) -> f32 {
    let next = value + (target - value) * rate;
    if (target - next).abs() < ANIMATION_SETTLE_EPSILON {
        target
    } else {
        next
    }
}

/// Where a tile starts its slide-in. Origins cycle left, right, top, bottom.
pub fn intro_origin(index: usize, target: Vec2) -> Vec2 {
    match index % 4 {
        0 => Vec2::new(-INTRO_ORIGIN_X, target.y),
        1 => Vec2::new(INTRO_ORIGIN_X, target.y),
        2 => Vec2::new(target.x, INTRO_ORIGIN_Y),
        _ => Vec2::new(target.x, -INTRO_ORIGIN_Y),
    }
}

/// Global intro clock shared by every tile.
///
/// Each tile's progress is the clock minus its stagger delay, sped up by
/// `INTRO_TILE_RATE`. The clock keeps running until the last tile arrives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntroClock {
    elapsed: f32,
    speed: f32,
    tile_count: usize,
}

impl IntroClock {
    pub fn new(speed: f32, tile_count: usize) -> Self {
        Self {
            elapsed: 0.0,
            speed,
            tile_count,
        }
    }

    pub fn advance(&mut self, dt_seconds: f32) {
        if !self.is_complete() {
            self.elapsed += dt_seconds / self.speed;
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Linear intro progress of the tile at `index`, in [0, 1].
    pub fn tile_progress(&self, index: usize) -> f32 {
        let delay = INTRO_STAGGER * index as f32;
        ((self.elapsed - delay / self.speed) * INTRO_TILE_RATE).clamp(0.0, 1.0)
    }

    /// The last tile carries the largest delay, so it finishes last.
    pub fn is_complete(&self) -> bool {
        self.tile_count == 0 || self.tile_progress(self.tile_count - 1) >= 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimState {
    pub origin: Vec2,
    pub intro: f32,
    pub intro_eased: f32,
    /// 1.0 when no crossfade is running
    pub crossfade: f32,
    pub hover: f32,
    pub hover_target: f32,
    /// Rotation about x and y, in radians
    pub tilt: Vec2,
    pub tilt_target: Vec2,
    pub spinner_angle: f32,
}

impl AnimState {
    pub fn new(index: usize, target: Vec2) -> Self {
        Self {
            origin: intro_origin(index, target),
            intro: 0.0,
            intro_eased: 0.0,
            crossfade: 1.0,
            hover: 0.0,
            hover_target: 0.0,
            tilt: Vec2::ZERO,
            tilt_target: Vec2::ZERO,
            spinner_angle: 0.0,
        }
    }

    pub fn set_intro(&mut self, progress: f32) {
        self.intro = progress;
        self.intro_eased = ease_out_cubic(progress);
    }

    pub fn intro_done(&self) -> bool {
        self.intro >= 1.0
    }

    /// Current center given the tile's resting position.
    pub fn position(&self, target: Vec2) -> Vec2 {
        if self.intro_done() {
            target
        } else {
            self.origin.lerp(target, self.intro_eased)
        }
    }

    pub fn begin_crossfade(&mut self) {
        self.crossfade = 0.0;
    }

    /// Returns true on the tick the crossfade completes.
    pub fn advance_crossfade(&mut self, step: f32) -> bool {
        if self.crossfade >= 1.0 {
            return false;
        }
        self.crossfade = (self.crossfade + step).min(1.0);
        self.crossfade >= 1.0
    }

    /// Point the hover targets at a pointer offset from the tile center, or
    /// release them with `None`.
    pub fn set_hover(&mut self, pointer_offset: Option<Vec2>, half_size: Vec2, max_tilt: f32) {
        match pointer_offset {
            Some(offset) => {
                self.hover_target = 1.0;
                self.tilt_target = Vec2::new(-(offset.y / half_size.y), offset.x / half_size.x)
                    .clamp(Vec2::NEG_ONE, Vec2::ONE)
                    * max_tilt;
            }
            None => {
                self.hover_target = 0.0;
                self.tilt_target = Vec2::ZERO;
            }
        }
    }

    pub fn advance_hover(&mut self, hover_speed: f32, tilt_speed: f32) {
        self.hover = approach(self.hover, self.hover_target, hover_speed);
        self.tilt = Vec2::new(
            approach(self.tilt.x, self.tilt_target.x, tilt_speed),
            approach(self.tilt.y, self.tilt_target.y, tilt_speed),
        );
    }

    pub fn advance_spinner(&mut self, speed: f32) {
        self.spinner_angle = (self.spinner_angle + speed) % std::f32::consts::TAU;
    }

    /// Opacity of the displayed tier.
    pub fn opacity(&self) -> f32 {
        self.intro_eased * self.crossfade
    }

    /// Opacity of the outgoing tier during a crossfade.
    pub fn fade_out_opacity(&self) -> f32 {
        self.intro_eased * (1.0 - self.crossfade)
    }

    pub fn scale(&self, hover_scale: f32) -> f32 {
        1.0 + self.hover * hover_scale
    }

    /// Hover, tilt and crossfade have all reached their targets.
    pub fn is_settled(&self) -> bool {
        self.crossfade >= 1.0 && self.hover == self.hover_target && self.tilt == self.tilt_target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!(ease_out_cubic(0.5) > 0.5);
    }

    #[test]
    fn test_intro_origins_cycle() {
        let target = Vec2::new(1.0, -2.0);
        assert_eq!(intro_origin(0, target), Vec2::new(-25.0, -2.0));
        assert_eq!(intro_origin(1, target), Vec2::new(25.0, -2.0));
        assert_eq!(intro_origin(2, target), Vec2::new(1.0, 20.0));
        assert_eq!(intro_origin(3, target), Vec2::new(1.0, -20.0));
        assert_eq!(intro_origin(4, target), Vec2::new(-25.0, -2.0));
    }

    #[test]
    fn test_intro_staggers_and_completes() {
        let mut clock = IntroClock::new(2.0, 50);
        clock.advance(0.5);
        // elapsed 0.25: tile 0 at 0.375, tile 10 delayed by 0.1
        assert!((clock.tile_progress(0) - 0.375).abs() < 1e-5);
        assert!((clock.tile_progress(10) - 0.225).abs() < 1e-5);
        assert!(!clock.is_complete());

        for _ in 0..200 {
            clock.advance(0.016);
        }
        assert!(clock.is_complete());
        assert_eq!(clock.tile_progress(49), 1.0);

        let frozen = clock.elapsed();
        clock.advance(1.0);
        assert_eq!(clock.elapsed(), frozen);
    }

    #[test]
    fn test_position_slides_from_origin() {
        let target = Vec2::new(2.0, -3.0);
        let mut anim = AnimState::new(0, target);
        assert_eq!(anim.position(target), Vec2::new(-25.0, -3.0));
        anim.set_intro(0.5);
        let mid = anim.position(target);
        assert!(mid.x > -25.0 && mid.x < 2.0);
        anim.set_intro(1.0);
        assert_eq!(anim.position(target), target);
        assert_eq!(anim.opacity(), 1.0);
    }

    #[test]
    fn test_opacity_multiplies_intro_and_crossfade() {
        let mut anim = AnimState::new(0, Vec2::ZERO);
        anim.set_intro(0.5);
        anim.begin_crossfade();
        anim.advance_crossfade(0.3);

        // eased(0.5) = 1 - 0.5^3
        assert!((anim.intro_eased - 0.875).abs() < 1e-6);
        assert!((anim.opacity() - 0.875 * 0.3).abs() < 1e-6);
        assert!((anim.fade_out_opacity() - 0.875 * 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_crossfade_takes_twenty_steps() {
        let mut anim = AnimState::new(0, Vec2::ZERO);
        anim.begin_crossfade();
        let mut steps = 0;
        while !anim.advance_crossfade(0.05) {
            steps += 1;
            assert!(steps < 100);
        }
        assert!((19..=20).contains(&steps));
        assert!(anim.is_settled());
    }

    #[test]
    fn test_hover_approaches_and_settles() {
        let mut anim = AnimState::new(0, Vec2::ZERO);
        anim.set_hover(Some(Vec2::new(0.9, 0.0)), Vec2::new(0.9, 1.0), 0.18);
        assert_eq!(anim.tilt_target, Vec2::new(0.0, 0.18));

        anim.advance_hover(0.15, 0.12);
        assert!(anim.hover > 0.0 && anim.hover < 1.0);
        assert!(!anim.is_settled());

        for _ in 0..500 {
            anim.advance_hover(0.15, 0.12);
        }
        assert_eq!(anim.hover, 1.0);
        assert!(anim.is_settled());

        anim.set_hover(None, Vec2::new(0.9, 1.0), 0.18);
        assert!(!anim.is_settled());
    }
}
