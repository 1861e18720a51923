//! Drop Dodger, the hidden mini-game
//!
//! Dodge falling drops; each drop that reaches the floor scores a point,
//! and drops fall faster and spawn more often as the score grows. The same
//! rules run on two fields: the graphical 800x600 scene (stepped at 30 Hz)
//! and a 40x20 character grid in the terminal.

pub mod tty;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::settings::Difficulty;
use crate::sim::Rect;

/// Drop spawn probability per step at score 0
pub const INITIAL_SPAWN_RATE: f64 = 0.1;
/// Added to the spawn probability per point
pub const SPAWN_RATE_PER_POINT: f64 = 0.01;

/// Geometry and speeds of a playing field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DodgerField {
    pub size: Vec2,
    pub player_size: Vec2,
    pub player_start: Vec2,
    /// Largest allowed player position (inclusive)
    pub player_max: Vec2,
    /// Distance moved per key press or step
    pub player_step: f32,
    pub drop_size: Vec2,
    /// Drops spawn at x in `0..=spawn_max_x`
    pub spawn_max_x: f32,
    /// Drops at or below this y are removed and score
    pub floor: f32,
    /// Fall distance per step at score 0
    pub base_speed: f32,
    /// Extra fall distance per step per point
    pub speed_per_point: f32,
}

impl DodgerField {
    /// 800x600 pixels, one step per 30 Hz frame
    pub fn graphical() -> Self {
        let size = Vec2::new(800.0, 600.0);
        Self {
            size,
            player_size: Vec2::new(14.0, 40.0),
            player_start: Vec2::new(size.x / 2.0, size.y - 40.0),
            player_max: Vec2::new(size.x - 20.0, size.y - 40.0),
            player_step: 10.0,
            drop_size: Vec2::new(14.0, 20.0),
            spawn_max_x: size.x - 20.0,
            floor: size.y,
            base_speed: 5.0,
            speed_per_point: 0.01,
        }
    }

    /// 40x20 character cells, one cell per step
    pub fn terminal() -> Self {
        let size = Vec2::new(40.0, 20.0);
        Self {
            size,
            player_size: Vec2::ONE,
            player_start: Vec2::new(size.x / 2.0, size.y - 2.0),
            player_max: size - Vec2::ONE,
            player_step: 1.0,
            drop_size: Vec2::ONE,
            spawn_max_x: size.x - 1.0,
            floor: size.y - 1.0,
            base_speed: 1.0,
            speed_per_point: 0.0,
        }
    }
}

/// Player movement directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Left,
    Right,
    Up,
    Down,
}

/// One Drop Dodger run
#[derive(Debug, Clone)]
pub struct DodgerState {
    pub field: DodgerField,
    pub player: Vec2,
    /// Top-left corners of falling drops
    pub drops: Vec<Vec2>,
    pub score: u64,
    pub difficulty: Difficulty,
    pub rng: Pcg32,
    /// Set once the player touches a drop
    pub crashed: bool,
}

impl DodgerState {
    pub fn new(field: DodgerField, difficulty: Difficulty, seed: u64) -> Self {
        Self {
            field,
            player: field.player_start,
            drops: Vec::new(),
            score: 0,
            difficulty,
            rng: Pcg32::seed_from_u64(seed),
            crashed: false,
        }
    }

    /// Start over on the same field, keeping the RNG stream
    pub fn reset(&mut self, difficulty: Difficulty) {
        self.player = self.field.player_start;
        self.drops.clear();
        self.score = 0;
        self.difficulty = difficulty;
        self.crashed = false;
    }

    pub fn max_drops(&self) -> usize {
        self.difficulty.max_drops()
    }

    /// Fall distance per step at the current score
    pub fn drop_speed(&self) -> f32 {
        self.field.base_speed + self.score as f32 * self.field.speed_per_point
    }

    pub fn spawn_rate(&self) -> f64 {
        INITIAL_SPAWN_RATE + SPAWN_RATE_PER_POINT * self.score as f64
    }

    /// Move the player one step, staying inside the field
    pub fn move_player(&mut self, dir: Move) {
        let step = self.field.player_step;
        let max = self.field.player_max;
        let p = &mut self.player;
        match dir {
            Move::Left if p.x > 0.0 => p.x = (p.x - step).max(0.0),
            Move::Right if p.x < max.x => p.x = (p.x + step).min(max.x),
            Move::Up if p.y > 0.0 => p.y = (p.y - step).max(0.0),
            Move::Down if p.y < max.y => p.y = (p.y + step).min(max.y),
            _ => {}
        }
    }

    /// Advance drops, maybe spawn one, then check for a crash.
    /// Returns true if the player was hit.
    pub fn step(&mut self) -> bool {
        if self.crashed {
            return true;
        }

        let speed = self.drop_speed();
        let floor = self.field.floor;
        let before = self.drops.len();
        self.drops.retain(|d| d.y < floor);
        self.score += (before - self.drops.len()) as u64;
        for drop in self.drops.iter_mut() {
            drop.y += speed;
        }

        if self.drops.len() < self.max_drops() && self.rng.random_bool(self.spawn_rate().min(1.0)) {
            let x = self.rng.random_range(0..=self.field.spawn_max_x as u32) as f32;
            self.drops.push(Vec2::new(x, 0.0));
        }

        self.crashed = self.is_hit();
        self.crashed
    }

    pub fn player_rect(&self) -> Rect {
        Rect::new(self.player, self.field.player_size)
    }

    pub fn drop_rect(&self, drop: Vec2) -> Rect {
        Rect::new(drop, self.field.drop_size)
    }

    /// Whether any drop overlaps the player
    pub fn is_hit(&self) -> bool {
        let player = self.player_rect();
        self.drops.iter().any(|d| self.drop_rect(*d).intersects(&player))
    }
}
