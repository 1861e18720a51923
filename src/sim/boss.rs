//! The boss: patrols the top of the play area and fires downward

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::{Body, Entity, Rect};
use super::entities::{BossLaser, FIREBALL_SIZE, Fireball};

pub const BOSS_SIZE: Vec2 = Vec2::new(100.0, 80.0);
/// Vertical position the boss patrols at
pub const BOSS_Y: f32 = 50.0;
/// Points for defeating a boss, multiplied by its level
pub const BOSS_POINTS_PER_LEVEL: u64 = 500;
/// Level from which the boss also throws fireballs
pub const FIREBALL_MIN_LEVEL: u32 = 2;

/// Boss parameters for a given level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossStats {
    pub health: u32,
    /// Horizontal speed (pixels/s)
    pub speed: f32,
    /// Seconds between laser shots
    pub fire_delay: f32,
    /// Seconds between fireballs, if this level throws them
    pub fireball_delay: Option<f32>,
}

impl BossStats {
    pub fn for_level(level: u32) -> Self {
        let lv = level as f32;
        Self {
            health: 10 + 5 * level,
            speed: 80.0 + 10.0 * lv,
            fire_delay: (2.0 - 0.2 * lv).max(0.5),
            fireball_delay: (level >= FIREBALL_MIN_LEVEL).then(|| (5.0 - 0.5 * lv).max(3.0)),
        }
    }
}

/// What the boss fired this tick
#[derive(Debug, Default)]
pub struct BossVolley {
    pub lasers: Vec<BossLaser>,
    pub fireballs: Vec<Fireball>,
}

#[derive(Debug, Clone)]
pub struct Boss {
    pub body: Body,
    pub level: u32,
    pub stats: BossStats,
    pub health: u32,
    /// -1.0 or 1.0
    pub direction: f32,
    /// Seconds until the next random direction change
    pub turn_timer: f32,
    pub fire_timer: f32,
    pub fireball_timer: f32,
}

impl Entity for Boss {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl Boss {
    /// Spawn centered at the top of `area`
    pub fn spawn(level: u32, area: &Rect, rng: &mut Pcg32) -> Self {
        let stats = BossStats::for_level(level);
        let x = area.center().x - BOSS_SIZE.x / 2.0;
        Self {
            body: Body::new(Vec2::new(x, BOSS_Y), BOSS_SIZE),
            level,
            stats,
            health: stats.health,
            direction: if rng.random_bool(0.5) { 1.0 } else { -1.0 },
            turn_timer: rng.random_range(1.5..3.0),
            fire_timer: stats.fire_delay,
            fireball_timer: stats.fireball_delay.unwrap_or(0.0),
        }
    }

    /// Patrol inside `area` and fire when the timers run out
    pub fn update(&mut self, dt: f32, area: &Rect, rng: &mut Pcg32) -> BossVolley {
        let mut volley = BossVolley::default();

        self.turn_timer -= dt;
        if self.turn_timer <= 0.0 {
            self.direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            self.turn_timer = rng.random_range(1.5..3.0);
        }

        self.body.pos.x += self.direction * self.stats.speed * dt;
        let max_x = area.right() - self.body.size.x;
        if self.body.pos.x <= area.left() {
            self.body.pos.x = area.left();
            self.direction = 1.0;
        } else if self.body.pos.x >= max_x {
            self.body.pos.x = max_x;
            self.direction = -1.0;
        }

        self.fire_timer -= dt;
        if self.fire_timer <= 0.0 {
            self.fire_timer = self.stats.fire_delay;
            let center = self.body.center();
            volley
                .lasers
                .push(BossLaser::downward(center.x - 4.0, self.body.rect().bottom() + 5.0));
        }

        if let Some(delay) = self.stats.fireball_delay {
            self.fireball_timer -= dt;
            if self.fireball_timer <= 0.0 {
                self.fireball_timer = delay;
                let max_offset = (self.body.size.x - FIREBALL_SIZE.x).max(0.0);
                let pos = Vec2::new(
                    self.body.pos.x + rng.random_range(0.0..=max_offset),
                    self.body.rect().bottom() + 10.0,
                );
                volley.fireballs.push(Fireball::new(pos, rng));
            }
        }

        volley
    }

    /// Apply damage; true if the boss is defeated
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.body.active = false;
            return true;
        }
        false
    }

    /// Remaining health in 0..=1 for the health bar
    pub fn health_fraction(&self) -> f32 {
        self.health as f32 / self.stats.health.max(1) as f32
    }

    pub fn points(&self) -> u64 {
        BOSS_POINTS_PER_LEVEL * self.level as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn area() -> Rect {
        Rect::from_xywh(40.0, 0.0, 720.0, 600.0)
    }

    #[test]
    fn test_stats_scale_with_level() {
        let one = BossStats::for_level(1);
        assert_eq!(one.health, 15);
        assert!((one.fire_delay - 1.8).abs() < 1e-5);
        assert_eq!(one.fireball_delay, None);

        let two = BossStats::for_level(2);
        assert_eq!(two.health, 20);
        assert_eq!(two.fireball_delay, Some(4.0));

        let late = BossStats::for_level(20);
        assert_eq!(late.fire_delay, 0.5);
        assert_eq!(late.fireball_delay, Some(3.0));
    }

    #[test]
    fn test_boss_stays_in_area() {
        let mut rng = Pcg32::seed_from_u64(1);
        let area = area();
        let mut boss = Boss::spawn(3, &area, &mut rng);
        for _ in 0..2000 {
            boss.update(1.0 / 60.0, &area, &mut rng);
            assert!(boss.body.pos.x >= area.left());
            assert!(boss.rect().right() <= area.right() + 1e-3);
        }
    }

    #[test]
    fn test_boss_fires_on_schedule() {
        let mut rng = Pcg32::seed_from_u64(2);
        let area = area();
        let mut boss = Boss::spawn(1, &area, &mut rng);
        let mut shots = 0;
        let mut fireballs = 0;
        // 10 seconds at level 1: one shot per 1.8s, no fireballs
        for _ in 0..600 {
            let volley = boss.update(1.0 / 60.0, &area, &mut rng);
            shots += volley.lasers.len();
            fireballs += volley.fireballs.len();
        }
        assert_eq!(shots, 5);
        assert_eq!(fireballs, 0);
    }

    #[test]
    fn test_boss_defeat() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut boss = Boss::spawn(1, &area(), &mut rng);
        assert!(!boss.take_damage(14));
        assert!(boss.take_damage(1));
        assert!(!boss.is_active());
        assert_eq!(boss.points(), 500);
    }
}
