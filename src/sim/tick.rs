//! Battle simulation tick
//!
//! Advances a [`BattleState`] by one step. Given the same state, input and
//! dt the result is always the same; all randomness comes from the state's
//! own RNG.

use glam::Vec2;
use rand::Rng;

use super::boss::Boss;
use super::collision::{Entity, first_hit, sweep};
use super::entities::{Enemy, EnemyKind, Laser, POWER_UP_SIZE, PowerUp, PowerUpKind};
use super::state::{
    BOSS_SCORE_INTERVAL, BattleEvent, BattlePhase, BattleState, INVULNERABLE_SECS, MAX_LIVES,
    POWER_UP_DROP_CHANCE,
};

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Horizontal direction: -1.0 left, 1.0 right, 0.0 idle
    pub move_x: f32,
    /// Fire button held
    pub fire: bool,
}

impl TickInput {
    pub fn from_keys(left: bool, right: bool, fire: bool) -> Self {
        let move_x = match (left, right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        Self { move_x, fire }
    }
}

/// Advance the battle by `dt` seconds, returning what happened
pub fn tick(state: &mut BattleState, input: &TickInput, dt: f32) -> Vec<BattleEvent> {
    let mut events = Vec::new();

    if state.phase == BattlePhase::GameOver {
        return events;
    }

    state.time += dt as f64;

    // Ship movement, clamped to the play area
    let ship = &mut state.ship;
    let max_x = state.area.right() - ship.body.size.x;
    ship.body.pos.x =
        (ship.body.pos.x + input.move_x.clamp(-1.0, 1.0) * ship.speed * dt).clamp(state.area.left(), max_x);
    ship.invulnerable = (ship.invulnerable - dt).max(0.0);
    ship.fire_cooldown = (ship.fire_cooldown - dt).max(0.0);

    if input.fire && ship.fire_cooldown <= 0.0 {
        let rect = ship.rect();
        state.lasers.push(Laser::new(rect.center().x, rect.top()));
        ship.fire_cooldown = ship.fire_delay;
    }

    // Boss arrival, or regular enemy spawning while no boss is up
    if state.boss.is_none() && state.score >= state.next_boss_score {
        let level = state.bosses_defeated + 1;
        state.boss = Some(Boss::spawn(level, &state.area, &mut state.rng));
        log::info!("Boss level {} appears at score {}", level, state.score);
        events.push(BattleEvent::BossSpawned { level });
    }

    if state.boss.is_none() {
        state.spawn_timer -= dt;
        if state.spawn_timer <= 0.0 {
            spawn_enemy(state);
            state.spawn_timer = state.spawn_interval();
        }
    }

    // Boss patrol and fire
    if let Some(boss) = state.boss.as_mut() {
        let volley = boss.update(dt, &state.area, &mut state.rng);
        state.boss_lasers.extend(volley.lasers);
        state.fireballs.extend(volley.fireballs);
    }

    // Movement and culling
    let bounds = state.cull_bounds();
    sweep(&mut state.lasers, dt, &bounds);
    sweep(&mut state.boss_lasers, dt, &bounds);
    sweep(&mut state.fireballs, dt, &bounds);
    sweep(&mut state.enemies, dt, &bounds);
    sweep(&mut state.power_ups, dt, &bounds);

    // Fireball fuses
    let mut bursts = Vec::new();
    for fireball in state.fireballs.iter_mut() {
        if fireball.burn(dt) {
            fireball.body.active = false;
            bursts.push(fireball.burst());
            events.push(BattleEvent::FireballBurst {
                pos: fireball.body.center(),
            });
        }
    }
    state.fireballs.retain(|f| f.is_active());
    for burst in bursts {
        state.boss_lasers.extend(burst);
    }

    resolve_player_shots(state, &mut events);
    resolve_ship_hits(state, &mut events);
    collect_power_ups(state, &mut events);

    state.lasers.retain(|l| l.is_active());
    state.boss_lasers.retain(|l| l.is_active());
    state.enemies.retain(|e| e.is_active());
    state.power_ups.retain(|p| p.is_active());

    if state.lives == 0 {
        state.phase = BattlePhase::GameOver;
        log::info!("Game over with score {}", state.score);
        events.push(BattleEvent::GameOver { score: state.score });
    }

    events
}

fn spawn_enemy(state: &mut BattleState) {
    let kind = EnemyKind::roll(&mut state.rng);
    let size = kind.size();
    let x = state
        .rng
        .random_range(state.area.left()..state.area.right() - size.x);
    state.enemies.push(Enemy::new(kind, Vec2::new(x, -size.y)));
}

/// Player lasers against enemies and the boss
fn resolve_player_shots(state: &mut BattleState, events: &mut Vec<BattleEvent>) {
    let mut drops = Vec::new();

    for laser in state.lasers.iter_mut() {
        let rect = laser.rect();

        if let Some(i) = first_hit(&state.enemies, &rect) {
            laser.body.active = false;
            let enemy = &mut state.enemies[i];
            if enemy.take_damage(1) {
                let points = enemy.kind.points();
                state.score += points;
                events.push(BattleEvent::EnemyDestroyed {
                    pos: enemy.body.center(),
                    points,
                });
                if state.rng.random_bool(POWER_UP_DROP_CHANCE) {
                    drops.push(enemy.body.center());
                }
            }
            continue;
        }

        let Some(boss) = state.boss.as_mut() else {
            continue;
        };
        if boss.is_active() && boss.rect().intersects(&rect) {
            laser.body.active = false;
            if boss.take_damage(1) {
                let level = boss.level;
                state.score += boss.points();
                state.bosses_defeated += 1;
                events.push(BattleEvent::BossDefeated {
                    pos: boss.body.center(),
                    level,
                });
                log::info!("Boss level {} defeated, score {}", level, state.score);
            }
        }
    }

    if state.boss.as_ref().is_some_and(|b| !b.is_active()) {
        state.boss = None;
        while state.next_boss_score <= state.score {
            state.next_boss_score += BOSS_SCORE_INTERVAL;
        }
    }

    for center in drops {
        let kind = PowerUpKind::roll(&mut state.rng);
        let pos = center - POWER_UP_SIZE / 2.0;
        state.power_ups.push(PowerUp::new(kind, pos));
    }
}

/// Enemies and hostile lasers reaching the ship
fn resolve_ship_hits(state: &mut BattleState, events: &mut Vec<BattleEvent>) {
    let ship_rect = state.ship.rect();

    let mut hit = false;
    if let Some(i) = first_hit(&state.enemies, &ship_rect) {
        state.enemies[i].body.active = false;
        hit = true;
    }
    if let Some(i) = first_hit(&state.boss_lasers, &ship_rect) {
        state.boss_lasers[i].body.active = false;
        hit = true;
    }

    if hit && !state.ship.is_invulnerable() {
        state.lives = state.lives.saturating_sub(1);
        state.ship.invulnerable = INVULNERABLE_SECS;
        events.push(BattleEvent::ShipHit { lives: state.lives });
    }
}

fn collect_power_ups(state: &mut BattleState, events: &mut Vec<BattleEvent>) {
    let ship_rect = state.ship.rect();
    let Some(i) = first_hit(&state.power_ups, &ship_rect) else {
        return;
    };
    let kind = state.power_ups[i].kind;
    state.power_ups[i].body.active = false;
    apply_power_up(state, kind);
    events.push(BattleEvent::PowerUpCollected(kind));
}

/// Apply a power-up's effect to the battle
pub fn apply_power_up(state: &mut BattleState, kind: PowerUpKind) {
    match kind {
        PowerUpKind::ClearScreen => {
            for enemy in state.enemies.iter_mut().filter(|e| e.is_active()) {
                enemy.body.active = false;
                state.score += enemy.kind.points();
            }
        }
        PowerUpKind::FireRate => state.ship.fire_delay *= 0.9,
        PowerUpKind::Speed => state.ship.speed *= 1.1,
        PowerUpKind::ExtraLife => {
            if state.lives < MAX_LIVES {
                state.lives += 1;
            }
        }
    }
    log::debug!("Power-up {:?} applied", kind);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::BossLaser;
    use crate::sim::state::{SHIP_FIRE_DELAY, START_LIVES};

    const DT: f32 = 1.0 / 60.0;

    fn positions(state: &BattleState) -> Vec<Vec2> {
        state
            .enemies
            .iter()
            .map(|e| e.body.pos)
            .chain(state.lasers.iter().map(|l| l.body.pos))
            .chain(state.boss_lasers.iter().map(|l| l.body.pos))
            .collect()
    }

    #[test]
    fn test_tick_is_deterministic() {
        let mut a = BattleState::new(1234);
        let mut b = BattleState::new(1234);
        let input = TickInput::from_keys(false, true, true);

        for i in 0..600 {
            let input = if i % 90 < 45 { input } else { TickInput::from_keys(true, false, true) };
            tick(&mut a, &input, DT);
            tick(&mut b, &input, DT);
        }

        assert_eq!(a.score, b.score);
        assert_eq!(a.lives, b.lives);
        assert_eq!(a.ship.body.pos, b.ship.body.pos);
        assert_eq!(positions(&a), positions(&b));
        assert_eq!(a.rng.random::<u64>(), b.rng.random::<u64>());
    }

    #[test]
    fn test_clone_replays_identically() {
        let mut state = BattleState::new(99);
        for _ in 0..120 {
            tick(&mut state, &TickInput::from_keys(false, false, true), DT);
        }
        let mut fork = state.clone();
        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), DT);
            tick(&mut fork, &TickInput::default(), DT);
        }
        assert_eq!(positions(&state), positions(&fork));
        assert_eq!(state.spawn_timer, fork.spawn_timer);
    }

    #[test]
    fn test_ship_clamped_to_play_area() {
        let mut state = BattleState::new(5);
        state.spawn_timer = f32::MAX;
        for _ in 0..300 {
            tick(&mut state, &TickInput::from_keys(true, false, false), DT);
        }
        assert_eq!(state.ship.body.pos.x, state.area.left());

        for _ in 0..600 {
            tick(&mut state, &TickInput::from_keys(false, true, false), DT);
        }
        assert_eq!(state.ship.rect().right(), state.area.right());
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let mut state = BattleState::new(5);
        let fire = TickInput::from_keys(false, false, true);
        tick(&mut state, &fire, DT);
        tick(&mut state, &fire, DT);
        assert_eq!(state.lasers.len(), 1);
        assert!((state.ship.fire_cooldown - (SHIP_FIRE_DELAY - DT)).abs() < 1e-5);
    }

    #[test]
    fn test_laser_destroys_enemy_and_scores() {
        let mut state = BattleState::new(5);
        state.spawn_timer = 100.0;
        state.enemies.push(Enemy::new(EnemyKind::Small, Vec2::new(380.0, 300.0)));
        state.lasers.push(Laser::new(400.0, 330.0));

        let events = tick(&mut state, &TickInput::default(), DT);
        assert!(state.enemies.is_empty());
        assert!(state.lasers.is_empty());
        assert_eq!(state.score, 10);
        assert!(matches!(events[0], BattleEvent::EnemyDestroyed { points: 10, .. }));
    }

    #[test]
    fn test_ship_hit_costs_one_life_then_grace() {
        let mut state = BattleState::new(5);
        state.spawn_timer = 100.0;
        let target = state.ship.rect().center();
        state.boss_lasers.push(BossLaser::directed(target, Vec2::ZERO));
        state.boss_lasers.push(BossLaser::directed(target, Vec2::ZERO));

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.lives, START_LIVES - 1);
        assert!(state.ship.is_invulnerable());

        // Second laser lands during the grace period
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.lives, START_LIVES - 1);
        assert!(state.boss_lasers.is_empty());
    }

    #[test]
    fn test_game_over_freezes_state() {
        let mut state = BattleState::new(5);
        state.lives = 1;
        state.spawn_timer = 100.0;
        let target = state.ship.rect().center();
        state.boss_lasers.push(BossLaser::directed(target, Vec2::ZERO));

        let events = tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, BattlePhase::GameOver);
        assert!(events.contains(&BattleEvent::GameOver { score: 0 }));

        let time = state.time;
        assert!(tick(&mut state, &TickInput::from_keys(true, false, true), DT).is_empty());
        assert_eq!(state.time, time);
    }

    #[test]
    fn test_boss_appears_at_threshold_and_halts_spawns() {
        let mut state = BattleState::new(5);
        state.score = BOSS_SCORE_INTERVAL;
        let events = tick(&mut state, &TickInput::default(), DT);
        assert!(events.contains(&BattleEvent::BossSpawned { level: 1 }));
        assert!(state.boss.is_some());

        for _ in 0..300 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_boss_defeat_moves_threshold() {
        let mut state = BattleState::new(5);
        state.score = BOSS_SCORE_INTERVAL;
        tick(&mut state, &TickInput::default(), DT);
        let boss = state.boss.as_mut().unwrap();
        boss.health = 1;
        let center = boss.rect().center();
        state.lasers.push(Laser::new(center.x, center.y));

        let events = tick(&mut state, &TickInput::default(), DT);
        assert!(events.iter().any(|e| matches!(e, BattleEvent::BossDefeated { level: 1, .. })));
        assert!(state.boss.is_none());
        assert_eq!(state.bosses_defeated, 1);
        assert_eq!(state.score, BOSS_SCORE_INTERVAL + 500);
        assert_eq!(state.next_boss_score, BOSS_SCORE_INTERVAL * 2);
    }

    #[test]
    fn test_power_up_effects() {
        let mut state = BattleState::new(5);
        state.enemies.push(Enemy::new(EnemyKind::Medium, Vec2::new(100.0, 100.0)));
        state.enemies.push(Enemy::new(EnemyKind::Large, Vec2::new(300.0, 100.0)));
        apply_power_up(&mut state, PowerUpKind::ClearScreen);
        assert_eq!(state.score, 50);
        assert!(state.enemies.iter().all(|e| !e.is_active()));

        apply_power_up(&mut state, PowerUpKind::FireRate);
        assert!((state.ship.fire_delay - SHIP_FIRE_DELAY * 0.9).abs() < 1e-6);

        apply_power_up(&mut state, PowerUpKind::ExtraLife);
        apply_power_up(&mut state, PowerUpKind::ExtraLife);
        assert_eq!(state.lives, MAX_LIVES);
    }
}
