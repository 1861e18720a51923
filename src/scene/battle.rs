//! Main battle scene
//!
//! Wraps the deterministic [`BattleState`] simulation: translates held keys
//! into a [`TickInput`], draws the state and hands clones of it to the
//! rewind buffer. Explosion flashes and held keys are presentation state and
//! are not part of a snapshot.

use glam::Vec2;

use super::{Scene, Snapshot};
use crate::assets::{Sprite, SpriteShape};
use crate::consts::{SCENE_BATTLE, SCENE_MENU, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::context::SceneContext;
use crate::event::{GameEvent, Key};
use crate::renderer::{Color, Frame, colors};
use crate::sim::entities::{EnemyKind, FIREBALL_SIZE, LASER_SIZE, POWER_UP_SIZE};
use crate::sim::state::{SHIP_SIZE, SHIP_TIERS};
use crate::sim::{BattleEvent, BattleState, Entity, PowerUpKind, Rect, TickInput, damage_tier, tick};

/// Seconds an explosion flash stays on screen
const EXPLOSION_SECS: f32 = 0.4;
const HEALTH_BAR_SIZE: Vec2 = Vec2::new(100.0, 10.0);

/// Short-lived explosion flash
#[derive(Debug, Clone, Copy)]
struct Explosion {
    pos: Vec2,
    radius: f32,
    age: f32,
}

#[derive(Debug, Default, Clone, Copy)]
struct HeldKeys {
    left: bool,
    right: bool,
    fire: bool,
}

/// Sprites for everything the battle draws
#[derive(Debug, Clone)]
struct BattleSprites {
    background: Sprite,
    ship: [Sprite; SHIP_TIERS],
    enemies: [Sprite; 3],
    boss: Sprite,
    laser: Sprite,
    boss_laser: Sprite,
    fireball: Sprite,
    power_up: Sprite,
}

impl BattleSprites {
    fn placeholders() -> Self {
        let ship = |i: usize| {
            Sprite::placeholder(SHIP_SIZE, ship_tint(i), SpriteShape::Rect)
        };
        let enemy = |kind: EnemyKind| {
            Sprite::placeholder(kind.size(), enemy_color(kind), SpriteShape::Rect)
        };
        Self {
            background: Sprite::placeholder(
                Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT),
                colors::BLACK,
                SpriteShape::Rect,
            ),
            ship: [ship(0), ship(1), ship(2), ship(3)],
            enemies: [
                enemy(EnemyKind::Small),
                enemy(EnemyKind::Medium),
                enemy(EnemyKind::Large),
            ],
            boss: Sprite::placeholder(crate::sim::boss::BOSS_SIZE, colors::RED, SpriteShape::Rect),
            laser: Sprite::placeholder(LASER_SIZE, colors::GREEN, SpriteShape::Rect),
            boss_laser: Sprite::placeholder(LASER_SIZE, colors::RED, SpriteShape::Rect),
            fireball: Sprite::placeholder(FIREBALL_SIZE, Color::rgb(255, 165, 0), SpriteShape::Circle),
            power_up: Sprite::placeholder(POWER_UP_SIZE, colors::BLUE, SpriteShape::Circle),
        }
    }

    fn load(ctx: &mut SceneContext) -> Self {
        let base = Self::placeholders();
        let assets = &mut ctx.assets;
        let mut load = |path: &str, placeholder: &Sprite| {
            assets.sprite(path, placeholder.size, placeholder.color, placeholder.shape)
        };

        Self {
            background: load("img/sfondo_gioco.jpg", &base.background),
            ship: [
                load("img/nave0.png", &base.ship[0]),
                load("img/nave1.png", &base.ship[1]),
                load("img/nave2.png", &base.ship[2]),
                load("img/nave3.png", &base.ship[3]),
            ],
            enemies: [
                load("img/nemico1.png", &base.enemies[0]),
                load("img/nemico2.png", &base.enemies[1]),
                load("img/nemico3.png", &base.enemies[2]),
            ],
            boss: load("entita/boss.png", &base.boss),
            laser: base.laser,
            boss_laser: load("entita/laser_boss.png", &base.boss_laser),
            fireball: load("entita/fireball.png", &base.fireball),
            power_up: base.power_up,
        }
    }
}

fn ship_tint(tier: usize) -> Color {
    match tier {
        0 => colors::WHITE,
        1 => colors::YELLOW,
        2 => Color::rgb(255, 140, 0),
        _ => colors::RED,
    }
}

fn enemy_color(kind: EnemyKind) -> Color {
    match kind {
        EnemyKind::Small => Color::rgb(255, 0, 0),
        EnemyKind::Medium => Color::rgb(255, 100, 0),
        EnemyKind::Large => Color::rgb(255, 0, 100),
    }
}

fn power_up_color(kind: PowerUpKind) -> Color {
    match kind {
        PowerUpKind::ClearScreen => Color::rgb(255, 255, 255),
        PowerUpKind::FireRate => Color::rgb(0, 200, 255),
        PowerUpKind::Speed => Color::rgb(0, 255, 120),
        PowerUpKind::ExtraLife => Color::rgb(255, 80, 160),
    }
}

#[derive(Debug)]
pub struct BattleScene {
    state: BattleState,
    /// Ship sprite index, kept in sync with `state.lives`
    ship_tier: usize,
    keys: HeldKeys,
    explosions: Vec<Explosion>,
    sprites: BattleSprites,
    /// Fixed seed for reproducible runs; otherwise one per start
    seed: Option<u64>,
    runs: u64,
}

impl Default for BattleScene {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleScene {
    pub fn new() -> Self {
        Self::with_seed(None)
    }

    pub fn with_seed(seed: Option<u64>) -> Self {
        let state = BattleState::new(seed.unwrap_or_default());
        Self {
            ship_tier: state.damage_tier(),
            state,
            keys: HeldKeys::default(),
            explosions: Vec::new(),
            sprites: BattleSprites::placeholders(),
            seed,
            runs: 0,
        }
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }

    pub fn ship_tier(&self) -> usize {
        self.ship_tier
    }

    fn next_seed(&mut self, ctx: &SceneContext) -> u64 {
        self.runs += 1;
        match self.seed.or(ctx.settings.seed) {
            Some(seed) => seed.wrapping_add(self.runs - 1),
            None => crate::clock::time_seed(),
        }
    }

    fn set_key(&mut self, key: Key, down: bool) {
        match key {
            Key::Left | Key::Char('a') => self.keys.left = down,
            Key::Right | Key::Char('d') => self.keys.right = down,
            Key::Space | Key::Up => self.keys.fire = down,
            _ => {}
        }
    }

    fn on_battle_event(&mut self, event: BattleEvent) {
        match event {
            BattleEvent::EnemyDestroyed { pos, .. } => self.explosions.push(Explosion {
                pos,
                radius: 25.0,
                age: 0.0,
            }),
            BattleEvent::BossDefeated { pos, .. } => self.explosions.push(Explosion {
                pos,
                radius: 60.0,
                age: 0.0,
            }),
            BattleEvent::FireballBurst { pos } => self.explosions.push(Explosion {
                pos,
                radius: 15.0,
                age: 0.0,
            }),
            BattleEvent::ShipHit { lives } => log::debug!("Ship hit, {} lives left", lives),
            BattleEvent::PowerUpCollected(kind) => log::debug!("Collected {:?}", kind),
            BattleEvent::BossSpawned { .. } | BattleEvent::GameOver { .. } => {}
        }
    }

    fn draw_hud(&self, frame: &mut Frame) {
        let state = &self.state;
        frame.text(Vec2::new(50.0, 10.0), format!("SCORE {:06}", state.score), colors::WHITE);
        let lives: String = "♥".repeat(state.lives as usize);
        frame.text(Vec2::new(SCREEN_WIDTH - 200.0, 10.0), format!("LIVES {}", lives), colors::RED);
        if let Some(boss) = &state.boss {
            frame.text_centered(
                Vec2::new(SCREEN_WIDTH / 2.0, 10.0),
                format!("BOSS LV {}", boss.level),
                colors::YELLOW,
            );
        }
    }

    fn draw_game_over(&self, frame: &mut Frame) {
        let center = crate::screen_center();
        let panel = Rect::centered(center, Vec2::new(360.0, 140.0));
        frame.fill_rect(panel, colors::BLACK);
        frame.stroke_rect(panel, colors::RED);
        frame.text_centered(center - Vec2::new(0.0, 30.0), "GAME OVER", colors::RED);
        frame.text_centered(center, format!("SCORE {}", self.state.score), colors::WHITE);
        frame.text_centered(
            center + Vec2::new(0.0, 30.0),
            "ENTER to retry - ESC for menu",
            colors::LIGHT_GREY,
        );
    }
}

impl Scene for BattleScene {
    fn initialize(&mut self, ctx: &mut SceneContext) {
        let seed = self.next_seed(ctx);
        self.state = BattleState::new(seed);
        self.ship_tier = self.state.damage_tier();
        self.keys = HeldKeys::default();
        self.explosions.clear();
        self.sprites = BattleSprites::load(ctx);
        log::info!("Battle started (seed {})", seed);
    }

    fn finalize(&mut self, _ctx: &mut SceneContext) {
        self.keys = HeldKeys::default();
        self.explosions.clear();
        log::info!("Battle ended with score {}", self.state.score);
    }

    fn handle_event(&mut self, event: &GameEvent, ctx: &mut SceneContext) {
        match event {
            GameEvent::KeyDown(Key::Escape) => ctx.request_transition(SCENE_MENU),
            GameEvent::KeyDown(Key::Enter) if self.state.is_over() => {
                ctx.request_transition(SCENE_BATTLE)
            }
            GameEvent::KeyDown(key) => self.set_key(*key, true),
            GameEvent::KeyUp(key) => self.set_key(*key, false),
            _ => {}
        }
    }

    fn advance(&mut self, dt: f32, _ctx: &mut SceneContext) {
        let input = TickInput::from_keys(self.keys.left, self.keys.right, self.keys.fire);
        for event in tick(&mut self.state, &input, dt) {
            self.on_battle_event(event);
        }
        self.ship_tier = self.state.damage_tier();

        for explosion in self.explosions.iter_mut() {
            explosion.age += dt;
        }
        self.explosions.retain(|e| e.age < EXPLOSION_SECS);
    }

    fn render(&self, frame: &mut Frame) {
        let state = &self.state;
        let sprites = &self.sprites;

        frame.fill(colors::BLACK);
        frame.sprite(&sprites.background, Vec2::ZERO);
        frame.stroke_rect(state.area, colors::GREY);

        for enemy in &state.enemies {
            frame.sprite(&sprites.enemies[enemy.kind.sprite_index() - 1], enemy.body.pos);
        }

        if let Some(boss) = &state.boss {
            frame.sprite(&sprites.boss, boss.body.pos);
            let bar = Rect::new(boss.body.pos - Vec2::new(0.0, 20.0), HEALTH_BAR_SIZE);
            frame.fill_rect(bar, Color::rgb(50, 50, 50));
            let filled = Rect::new(bar.pos, Vec2::new(bar.size.x * boss.health_fraction(), bar.size.y));
            frame.fill_rect(filled, colors::RED);
        }

        for laser in &state.lasers {
            frame.sprite(&sprites.laser, laser.body.pos);
        }
        for laser in &state.boss_lasers {
            frame.sprite(&sprites.boss_laser, laser.body.pos);
        }
        for fireball in &state.fireballs {
            frame.sprite(&sprites.fireball, fireball.body.pos);
        }
        for power_up in &state.power_ups {
            let rect = power_up.rect();
            let sprite = Sprite {
                color: power_up_color(power_up.kind),
                ..sprites.power_up
            };
            frame.sprite(&sprite, rect.pos);
            frame.text_centered(rect.center(), power_up.kind.symbol(), colors::BLACK);
        }

        // Ship blinks while invulnerable
        let blink_off = state.ship.is_invulnerable() && (frame.time * 10.0) as i64 % 2 == 1;
        if !blink_off {
            frame.sprite(&sprites.ship[self.ship_tier], state.ship.body.pos);
        }

        for explosion in &self.explosions {
            let fade = 1.0 - explosion.age / EXPLOSION_SECS;
            let radius = explosion.radius * (0.5 + explosion.age / EXPLOSION_SECS);
            frame.circle(explosion.pos, radius, Color::rgb(255, 200, 50).scaled(fade));
        }

        self.draw_hud(frame);
        if state.is_over() {
            self.draw_game_over(frame);
        }
    }

    fn capture_state(&self) -> Snapshot {
        Snapshot::new(self.state.clone())
    }

    fn restore_state(&mut self, snapshot: &Snapshot) {
        let Some(state) = snapshot.get::<BattleState>() else {
            log::warn!("Ignoring snapshot that is not a battle state");
            return;
        };
        self.state = state.clone();
        self.ship_tier = damage_tier(self.state.lives);
        self.explosions.clear();
    }
}
