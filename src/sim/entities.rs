//! Battle entities: lasers, fireballs, enemies and power-ups

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::{Body, Entity};

macro_rules! impl_entity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Entity for $ty {
                fn body(&self) -> &Body {
                    &self.body
                }
                fn body_mut(&mut self) -> &mut Body {
                    &mut self.body
                }
            }
        )*
    };
}

impl_entity!(Laser, BossLaser, Fireball, Enemy, PowerUp);

/// Player laser size and speed (pixels, pixels/s)
pub const LASER_SIZE: Vec2 = Vec2::new(4.0, 15.0);
pub const LASER_SPEED: f32 = 400.0;

/// Boss laser speed when fired straight down
pub const BOSS_LASER_SPEED: f32 = 200.0;
/// Speed of the lasers released by an exploding fireball
pub const BURST_LASER_SPEED: f32 = 150.0;
/// Lasers per fireball burst
pub const BURST_COUNT: usize = 8;

pub const FIREBALL_SIZE: Vec2 = Vec2::new(20.0, 20.0);
pub const FIREBALL_SPEED: f32 = 150.0;

pub const POWER_UP_SIZE: Vec2 = Vec2::new(30.0, 30.0);
/// Slower than enemies so there is time to catch it
pub const POWER_UP_SPEED: f32 = 120.0;

/// A laser fired by the player ship (moves up)
#[derive(Debug, Clone)]
pub struct Laser {
    pub body: Body,
}

impl Laser {
    /// Laser centered horizontally on `x` with its top at `y`
    pub fn new(x: f32, y: f32) -> Self {
        let pos = Vec2::new(x - LASER_SIZE.x / 2.0, y);
        Self {
            body: Body::new(pos, LASER_SIZE).with_velocity(Vec2::new(0.0, -LASER_SPEED)),
        }
    }
}

/// A hostile laser (boss shot or burst fragment)
#[derive(Debug, Clone)]
pub struct BossLaser {
    pub body: Body,
}

impl BossLaser {
    /// Straight-down shot
    pub fn downward(x: f32, y: f32) -> Self {
        Self::directed(Vec2::new(x, y), Vec2::new(0.0, BOSS_LASER_SPEED))
    }

    pub fn directed(pos: Vec2, vel: Vec2) -> Self {
        Self {
            body: Body::new(pos, LASER_SIZE).with_velocity(vel),
        }
    }
}

/// Fireball that bursts into lasers after its fuse runs out
#[derive(Debug, Clone)]
pub struct Fireball {
    pub body: Body,
    /// Seconds until it explodes
    pub fuse: f32,
    pub age: f32,
}

impl Fireball {
    pub fn new(pos: Vec2, rng: &mut Pcg32) -> Self {
        Self {
            body: Body::new(pos, FIREBALL_SIZE).with_velocity(Vec2::new(0.0, FIREBALL_SPEED)),
            fuse: rng.random_range(0.5..1.5),
            age: 0.0,
        }
    }

    /// Age the fuse; true once it should explode
    pub fn burn(&mut self, dt: f32) -> bool {
        self.age += dt;
        self.age >= self.fuse
    }

    /// Lasers radiating from the center every 45 degrees
    pub fn burst(&self) -> Vec<BossLaser> {
        let origin = self.body.center();
        (0..BURST_COUNT)
            .map(|i| {
                let angle = (i as f32 * 45.0).to_radians();
                let dir = Vec2::new(angle.cos(), angle.sin());
                BossLaser::directed(origin, dir * BURST_LASER_SPEED)
            })
            .collect()
    }
}

/// Enemy sizes, from weakest to toughest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyKind {
    Small,
    Medium,
    Large,
}

impl EnemyKind {
    pub fn size(&self) -> Vec2 {
        match self {
            EnemyKind::Small => Vec2::new(40.0, 30.0),
            EnemyKind::Medium => Vec2::new(50.0, 40.0),
            EnemyKind::Large => Vec2::new(70.0, 50.0),
        }
    }

    /// Descent speed (pixels/s)
    pub fn speed(&self) -> f32 {
        match self {
            EnemyKind::Small => 100.0,
            EnemyKind::Medium => 80.0,
            EnemyKind::Large => 60.0,
        }
    }

    pub fn points(&self) -> u64 {
        match self {
            EnemyKind::Small => 10,
            EnemyKind::Medium => 20,
            EnemyKind::Large => 30,
        }
    }

    /// Hits needed to destroy
    pub fn health(&self) -> u8 {
        match self {
            EnemyKind::Small => 1,
            EnemyKind::Medium => 2,
            EnemyKind::Large => 3,
        }
    }

    /// Sprite index (`img/nemico{n}.png`)
    pub fn sprite_index(&self) -> usize {
        match self {
            EnemyKind::Small => 1,
            EnemyKind::Medium => 2,
            EnemyKind::Large => 3,
        }
    }

    /// Weighted pick: small enemies are the most common
    pub fn roll(rng: &mut Pcg32) -> Self {
        match rng.random_range(0..10) {
            0..=5 => EnemyKind::Small,
            6..=8 => EnemyKind::Medium,
            _ => EnemyKind::Large,
        }
    }
}

/// A descending enemy
#[derive(Debug, Clone)]
pub struct Enemy {
    pub body: Body,
    pub kind: EnemyKind,
    pub health: u8,
}

impl Enemy {
    pub fn new(kind: EnemyKind, pos: Vec2) -> Self {
        Self {
            body: Body::new(pos, kind.size()).with_velocity(Vec2::new(0.0, kind.speed())),
            kind,
            health: kind.health(),
        }
    }

    /// Apply damage; true if this destroyed the enemy
    pub fn take_damage(&mut self, amount: u8) -> bool {
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.body.active = false;
            return true;
        }
        false
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpKind {
    /// Destroy every enemy on screen
    ClearScreen,
    /// Fire 10% faster
    FireRate,
    /// Move 10% faster
    Speed,
    /// One more life (up to the maximum)
    ExtraLife,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::ClearScreen,
        PowerUpKind::FireRate,
        PowerUpKind::Speed,
        PowerUpKind::ExtraLife,
    ];

    pub fn roll(rng: &mut Pcg32) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Short label drawn on the capsule
    pub fn symbol(&self) -> &'static str {
        match self {
            PowerUpKind::ClearScreen => "X",
            PowerUpKind::FireRate => "F",
            PowerUpKind::Speed => ">",
            PowerUpKind::ExtraLife => "+",
        }
    }
}

/// A falling power-up capsule
#[derive(Debug, Clone)]
pub struct PowerUp {
    pub body: Body,
    pub kind: PowerUpKind,
}

impl PowerUp {
    pub fn new(kind: PowerUpKind, pos: Vec2) -> Self {
        Self {
            body: Body::new(pos, POWER_UP_SIZE).with_velocity(Vec2::new(0.0, POWER_UP_SPEED)),
            kind,
        }
    }
}
