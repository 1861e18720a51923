//! Axis-aligned geometry and the shared entity body
//!
//! Every moving thing in the battle (lasers, enemies, boss, power-ups,
//! fireballs) is a [`Body`]: position, velocity, size and an active flag.
//! Movement, bounds culling and hit tests are written once over [`Entity`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    /// Rectangle of `size` centered on `center`
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self::new(center - size / 2.0, size)
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Point containment (right/bottom edges exclusive)
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left() && point.x < self.right() && point.y >= self.top() && point.y < self.bottom()
    }

    /// Strict overlap; touching edges do not count
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}

/// Movable, collidable, deactivatable state shared by all entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Top-left corner
    pub pos: Vec2,
    /// Pixels per second
    pub vel: Vec2,
    pub size: Vec2,
    /// Inactive bodies are removed at the end of the sweep
    pub active: bool,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            size,
            active: true,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    /// Collision rectangle, always derived from the current position
    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    pub fn step(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    /// Deactivate once the body's origin leaves `bounds`
    pub fn cull_outside(&mut self, bounds: &Rect) {
        let p = self.pos;
        if p.x < bounds.left() || p.x > bounds.right() || p.y < bounds.top() || p.y > bounds.bottom() {
            self.active = false;
        }
    }
}

/// Anything built around a [`Body`]
pub trait Entity {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;

    fn rect(&self) -> Rect {
        self.body().rect()
    }

    fn is_active(&self) -> bool {
        self.body().active
    }
}

/// Move every entity, deactivate the ones outside `bounds` and drop inactive ones
pub fn sweep<E: Entity>(entities: &mut Vec<E>, dt: f32, bounds: &Rect) {
    for entity in entities.iter_mut() {
        let body = entity.body_mut();
        body.step(dt);
        body.cull_outside(bounds);
    }
    entities.retain(|e| e.is_active());
}

/// Index of the first active entity overlapping `rect`
pub fn first_hit<E: Entity>(entities: &[E], rect: &Rect) -> Option<usize> {
    entities
        .iter()
        .position(|e| e.is_active() && e.rect().intersects(rect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Dot(Body);

    impl Entity for Dot {
        fn body(&self) -> &Body {
            &self.0
        }
        fn body_mut(&mut self) -> &mut Body {
            &mut self.0
        }
    }

    #[test]
    fn test_rect_intersects_is_strict() {
        let a = Rect::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = Rect::from_xywh(10.0, 0.0, 10.0, 10.0);
        let c = Rect::from_xywh(9.0, 9.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(c.intersects(&a));
    }

    #[test]
    fn test_rect_contains() {
        let r = Rect::from_xywh(300.0, 320.0, 200.0, 60.0);
        assert!(r.contains(Vec2::new(400.0, 350.0)));
        assert!(!r.contains(Vec2::new(500.0, 350.0)));
        assert!(!r.contains(Vec2::new(299.0, 350.0)));
    }

    #[test]
    fn test_sweep_moves_and_culls() {
        let bounds = Rect::from_xywh(0.0, 0.0, 100.0, 100.0);
        let mut dots = vec![
            Dot(Body::new(Vec2::new(50.0, 50.0), Vec2::ONE).with_velocity(Vec2::new(0.0, 10.0))),
            Dot(Body::new(Vec2::new(50.0, 95.0), Vec2::ONE).with_velocity(Vec2::new(0.0, 10.0))),
        ];
        sweep(&mut dots, 1.0, &bounds);
        assert_eq!(dots.len(), 1);
        assert_eq!(dots[0].body().pos, Vec2::new(50.0, 60.0));
    }

    #[test]
    fn test_first_hit_skips_inactive() {
        let mut a = Body::new(Vec2::ZERO, Vec2::splat(10.0));
        a.active = false;
        let b = Body::new(Vec2::ZERO, Vec2::splat(10.0));
        let dots = vec![Dot(a), Dot(b)];
        let target = Rect::from_xywh(5.0, 5.0, 2.0, 2.0);
        assert_eq!(first_hit(&dots, &target), Some(1));
    }
}
