//! Battle state and core simulation types
//!
//! Everything the rewind buffer needs to reproduce a battle frame lives in
//! [`BattleState`], including the RNG. Cloning it is a full snapshot.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::boss::Boss;
use super::collision::{Body, Rect};
use super::entities::{BossLaser, Enemy, Fireball, Laser, PowerUp};
use crate::consts::{PLAY_AREA_WIDTH, SCREEN_HEIGHT, SCREEN_WIDTH};

pub const SHIP_SIZE: Vec2 = Vec2::new(50.0, 40.0);
/// Gap between the ship and the bottom of the screen
pub const SHIP_MARGIN: f32 = 20.0;
pub const SHIP_SPEED: f32 = 300.0;
/// Seconds between shots
pub const SHIP_FIRE_DELAY: f32 = 0.3;
/// Grace period after losing a life
pub const INVULNERABLE_SECS: f32 = 1.5;

pub const START_LIVES: u8 = 3;
pub const MAX_LIVES: u8 = 4;
/// Number of ship damage sprites (`img/nave0..3.png`)
pub const SHIP_TIERS: usize = 4;

/// A boss appears every time the score crosses a multiple of this
pub const BOSS_SCORE_INTERVAL: u64 = 2500;

/// Seconds between enemy spawns at score 0
pub const BASE_SPAWN_INTERVAL: f32 = 1.2;
pub const MIN_SPAWN_INTERVAL: f32 = 0.4;
/// Chance a destroyed enemy drops a power-up
pub const POWER_UP_DROP_CHANCE: f64 = 0.1;

/// Current phase of the battle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    Playing,
    /// Out of lives; waiting for restart
    GameOver,
}

/// Things that happened during a tick, for effects and logging
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BattleEvent {
    EnemyDestroyed { pos: Vec2, points: u64 },
    ShipHit { lives: u8 },
    PowerUpCollected(super::entities::PowerUpKind),
    BossSpawned { level: u32 },
    BossDefeated { pos: Vec2, level: u32 },
    FireballBurst { pos: Vec2 },
    GameOver { score: u64 },
}

/// Player ship
#[derive(Debug, Clone)]
pub struct Ship {
    pub body: Body,
    /// Horizontal speed (pixels/s); raised by power-ups
    pub speed: f32,
    /// Seconds between shots; lowered by power-ups
    pub fire_delay: f32,
    pub fire_cooldown: f32,
    /// Seconds of remaining invulnerability
    pub invulnerable: f32,
}

impl Ship {
    /// Ship centered at the bottom of `area`
    pub fn new(area: &Rect) -> Self {
        let pos = Vec2::new(
            area.center().x - SHIP_SIZE.x / 2.0,
            area.bottom() - SHIP_SIZE.y - SHIP_MARGIN,
        );
        Self {
            body: Body::new(pos, SHIP_SIZE),
            speed: SHIP_SPEED,
            fire_delay: SHIP_FIRE_DELAY,
            fire_cooldown: 0.0,
            invulnerable: 0.0,
        }
    }

    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0.0
    }
}

/// Damage sprite index for a life count: 0 is intact, 3 is the most damaged
pub fn damage_tier(lives: u8) -> usize {
    (SHIP_TIERS - 1).saturating_sub(lives as usize)
}

/// Complete battle state (deterministic, cloneable)
#[derive(Debug, Clone)]
pub struct BattleState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// Simulated seconds
    pub time: f64,
    pub phase: BattlePhase,
    pub score: u64,
    pub lives: u8,
    /// Horizontal playfield, centered on the screen
    pub area: Rect,
    pub ship: Ship,
    pub lasers: Vec<Laser>,
    pub boss_lasers: Vec<BossLaser>,
    pub fireballs: Vec<Fireball>,
    pub enemies: Vec<Enemy>,
    pub power_ups: Vec<PowerUp>,
    pub boss: Option<Boss>,
    pub bosses_defeated: u32,
    /// Score at which the next boss appears
    pub next_boss_score: u64,
    /// Seconds until the next enemy spawn
    pub spawn_timer: f32,
}

impl BattleState {
    /// Create a fresh battle with the given seed
    pub fn new(seed: u64) -> Self {
        let area = play_area();
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time: 0.0,
            phase: BattlePhase::Playing,
            score: 0,
            lives: START_LIVES,
            area,
            ship: Ship::new(&area),
            lasers: Vec::new(),
            boss_lasers: Vec::new(),
            fireballs: Vec::new(),
            enemies: Vec::new(),
            power_ups: Vec::new(),
            boss: None,
            bosses_defeated: 0,
            next_boss_score: BOSS_SCORE_INTERVAL,
            spawn_timer: BASE_SPAWN_INTERVAL,
        }
    }

    pub fn damage_tier(&self) -> usize {
        damage_tier(self.lives)
    }

    pub fn is_over(&self) -> bool {
        self.phase == BattlePhase::GameOver
    }

    /// Seconds between enemy spawns at the current score
    pub fn spawn_interval(&self) -> f32 {
        (BASE_SPAWN_INTERVAL - self.score as f32 / 5000.0).max(MIN_SPAWN_INTERVAL)
    }

    /// Region outside which entities are dropped
    pub fn cull_bounds(&self) -> Rect {
        Rect::from_xywh(-100.0, -150.0, SCREEN_WIDTH + 200.0, SCREEN_HEIGHT + 250.0)
    }
}

/// Playfield rectangle: `PLAY_AREA_WIDTH` wide, full height, centered
pub fn play_area() -> Rect {
    Rect::from_xywh((SCREEN_WIDTH - PLAY_AREA_WIDTH) / 2.0, 0.0, PLAY_AREA_WIDTH, SCREEN_HEIGHT)
}
