//! Drop Dodger scene
//!
//! The graphical version of the easter egg. The rules step at a fixed
//! 30 Hz whatever the loop cadence, and a crash opens an end screen with
//! Retry, Quit and difficulty buttons.

use glam::Vec2;

use super::{Scene, Snapshot};
use crate::assets::{Sprite, SpriteShape};
use crate::consts::{SCENE_MENU, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::context::SceneContext;
use crate::dodger::{DodgerField, DodgerState, Move};
use crate::event::{GameEvent, Key};
use crate::highscores::HighScoreFile;
use crate::renderer::{Color, Frame, colors};
use crate::settings::Difficulty;
use crate::sim::Rect;

/// Rule steps per second
pub const STEP_RATE: f32 = 30.0;
const STEP_SECS: f32 = 1.0 / STEP_RATE;

const RETRY_SIZE: Vec2 = Vec2::new(200.0, 50.0);
const DIFFICULTY_SIZE: Vec2 = Vec2::new(150.0, 50.0);

/// Buttons on the end screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndButton {
    Retry,
    Quit,
    Difficulty(Difficulty),
}

impl EndButton {
    fn label(&self) -> &'static str {
        match self {
            EndButton::Retry => "Retry",
            EndButton::Quit => "Quit",
            EndButton::Difficulty(d) => d.as_str(),
        }
    }

    fn color(&self) -> Color {
        match self {
            EndButton::Retry => colors::GREEN,
            EndButton::Quit => colors::RED,
            EndButton::Difficulty(Difficulty::Easy) => colors::BLUE,
            EndButton::Difficulty(Difficulty::Medium) => colors::YELLOW,
            EndButton::Difficulty(Difficulty::Hard) => colors::RED,
        }
    }
}

/// End screen layout
pub fn end_buttons() -> [(EndButton, Rect); 5] {
    let cx = SCREEN_WIDTH / 2.0;
    let cy = SCREEN_HEIGHT / 2.0;
    let row = cy + 180.0;
    [
        (EndButton::Retry, Rect::new(Vec2::new(cx - 100.0, cy + 20.0), RETRY_SIZE)),
        (EndButton::Quit, Rect::new(Vec2::new(cx - 100.0, cy + 100.0), RETRY_SIZE)),
        (
            EndButton::Difficulty(Difficulty::Easy),
            Rect::new(Vec2::new(cx - 250.0, row), DIFFICULTY_SIZE),
        ),
        (
            EndButton::Difficulty(Difficulty::Medium),
            Rect::new(Vec2::new(cx - 50.0, row), DIFFICULTY_SIZE),
        ),
        (
            EndButton::Difficulty(Difficulty::Hard),
            Rect::new(Vec2::new(cx + 150.0, row), DIFFICULTY_SIZE),
        ),
    ]
}

fn button_at(pos: Vec2) -> Option<EndButton> {
    end_buttons()
        .into_iter()
        .find(|(_, rect)| rect.contains(pos))
        .map(|(button, _)| button)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DodgerPhase {
    Playing,
    /// Crashed; scores as they stood when the run ended
    Ended { final_score: u64, high_score: u64 },
}

/// Everything a snapshot needs to resume a run
#[derive(Debug, Clone)]
struct DodgerRun {
    state: DodgerState,
    /// Unspent time toward the next rule step
    accumulator: f32,
    phase: DodgerPhase,
}

#[derive(Debug, Default, Clone, Copy)]
struct HeldMoves {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

impl HeldMoves {
    /// One move per step; left wins over right, right over up, up over down
    fn pick(&self) -> Option<Move> {
        if self.left {
            Some(Move::Left)
        } else if self.right {
            Some(Move::Right)
        } else if self.up {
            Some(Move::Up)
        } else if self.down {
            Some(Move::Down)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
struct DodgerSprites {
    background: Sprite,
    player: Sprite,
    drop: Sprite,
}

impl DodgerSprites {
    fn load(ctx: &mut SceneContext, field: &DodgerField) -> Self {
        let assets = &mut ctx.assets;
        Self {
            background: assets.sprite(
                "Uova_di_Pasqua/img/jeux-olympiques-paris-2024.jpg",
                field.size,
                Color::rgb(20, 30, 60),
                SpriteShape::Rect,
            ),
            player: assets.sprite(
                "Uova_di_Pasqua/img/olympic-torch.png",
                field.player_size,
                colors::YELLOW,
                SpriteShape::Rect,
            ),
            drop: assets.sprite(
                "Uova_di_Pasqua/img/water_drop.png",
                field.drop_size,
                Color::rgb(80, 160, 255),
                SpriteShape::Rect,
            ),
        }
    }
}

pub struct DodgerScene {
    run: DodgerRun,
    keys: HeldMoves,
    /// Best score on file, shown in the HUD
    high_score: u64,
    /// Scene to return to on Quit; `None` quits the game
    quit_to: Option<String>,
    sprites: Option<DodgerSprites>,
}

impl Default for DodgerScene {
    fn default() -> Self {
        Self::new()
    }
}

impl DodgerScene {
    /// Dodger reached from the main menu; Quit goes back there
    pub fn new() -> Self {
        Self::returning_to(Some(SCENE_MENU.to_string()))
    }

    /// Dodger launched on its own; Quit ends the game
    pub fn standalone() -> Self {
        Self::returning_to(None)
    }

    fn returning_to(quit_to: Option<String>) -> Self {
        Self {
            run: DodgerRun {
                state: DodgerState::new(DodgerField::graphical(), Difficulty::default(), 0),
                accumulator: 0.0,
                phase: DodgerPhase::Playing,
            },
            keys: HeldMoves::default(),
            high_score: 0,
            quit_to,
            sprites: None,
        }
    }

    pub fn state(&self) -> &DodgerState {
        &self.run.state
    }

    pub fn state_mut(&mut self) -> &mut DodgerState {
        &mut self.run.state
    }

    pub fn phase(&self) -> DodgerPhase {
        self.run.phase
    }

    fn restart(&mut self, difficulty: Difficulty) {
        self.run.state.reset(difficulty);
        self.run.accumulator = 0.0;
        self.run.phase = DodgerPhase::Playing;
        self.keys = HeldMoves::default();
        log::info!("Drop Dodger run started ({})", difficulty.as_str());
    }

    fn leave(&self, ctx: &mut SceneContext) {
        match &self.quit_to {
            Some(name) => ctx.request_transition(name.clone()),
            None => ctx.request_quit(),
        }
    }

    fn press(&mut self, button: EndButton, ctx: &mut SceneContext) {
        match button {
            EndButton::Retry => {
                self.restart(self.run.state.difficulty);
                ctx.request_history_clear();
            }
            EndButton::Quit => self.leave(ctx),
            EndButton::Difficulty(difficulty) => {
                ctx.settings.difficulty = difficulty;
                self.restart(difficulty);
                ctx.request_history_clear();
            }
        }
    }

    fn end_run(&mut self, ctx: &SceneContext) {
        let final_score = self.run.state.score;
        let high_score = self.high_score;
        self.run.phase = DodgerPhase::Ended {
            final_score,
            high_score,
        };
        match HighScoreFile::new(&ctx.settings.high_score_file).submit(final_score) {
            Ok(true) => self.high_score = final_score,
            Ok(false) => {}
            Err(e) => log::error!("Failed to save high score: {}", e),
        }
        log::info!("Drop Dodger over, score {}", final_score);
    }

    fn set_key(&mut self, key: Key, down: bool) {
        match key {
            Key::Left => self.keys.left = down,
            Key::Right => self.keys.right = down,
            Key::Up => self.keys.up = down,
            Key::Down => self.keys.down = down,
            _ => {}
        }
    }

    fn draw_end_screen(&self, frame: &mut Frame, final_score: u64, high_score: u64) {
        frame.fill(colors::BLACK);
        let cx = SCREEN_WIDTH / 2.0;
        let cy = SCREEN_HEIGHT / 2.0;
        frame.text_centered(Vec2::new(cx, cy - 150.0), "Game Over!", colors::WHITE);
        frame.text_centered(
            Vec2::new(cx, cy - 100.0),
            format!("Final Score: {}", final_score),
            colors::WHITE,
        );
        frame.text_centered(
            Vec2::new(cx, cy - 50.0),
            format!("High Score: {}", high_score),
            colors::WHITE,
        );
        for (button, rect) in end_buttons() {
            frame.fill_rect(rect, button.color());
            frame.text_centered(rect.center(), button.label(), colors::BLACK);
        }
    }
}

impl Scene for DodgerScene {
    fn initialize(&mut self, ctx: &mut SceneContext) {
        let seed = ctx.settings.seed.unwrap_or_else(crate::clock::time_seed);
        let difficulty = ctx.settings.difficulty;
        self.run.state = DodgerState::new(DodgerField::graphical(), difficulty, seed);
        self.restart(difficulty);
        self.high_score = HighScoreFile::new(&ctx.settings.high_score_file).load();
        self.sprites = Some(DodgerSprites::load(ctx, &self.run.state.field));
    }

    fn finalize(&mut self, _ctx: &mut SceneContext) {
        self.keys = HeldMoves::default();
    }

    fn handle_event(&mut self, event: &GameEvent, ctx: &mut SceneContext) {
        match (event, self.run.phase) {
            (GameEvent::KeyDown(Key::Escape), _) => self.leave(ctx),
            (GameEvent::KeyDown(Key::Enter), DodgerPhase::Ended { .. }) => {
                self.press(EndButton::Retry, ctx)
            }
            (GameEvent::KeyDown(key), DodgerPhase::Playing) => self.set_key(*key, true),
            (GameEvent::KeyUp(key), _) => self.set_key(*key, false),
            (GameEvent::MouseDown { .. }, DodgerPhase::Ended { .. }) => {
                if let Some(button) = event.left_click().and_then(button_at) {
                    self.press(button, ctx);
                }
            }
            _ => {}
        }
    }

    fn advance(&mut self, dt: f32, ctx: &mut SceneContext) {
        if self.run.phase != DodgerPhase::Playing {
            return;
        }
        self.run.accumulator += dt;
        while self.run.accumulator >= STEP_SECS {
            self.run.accumulator -= STEP_SECS;
            if let Some(dir) = self.keys.pick() {
                self.run.state.move_player(dir);
            }
            if self.run.state.step() {
                self.end_run(ctx);
                break;
            }
        }
    }

    fn render(&self, frame: &mut Frame) {
        if let DodgerPhase::Ended {
            final_score,
            high_score,
        } = self.run.phase
        {
            self.draw_end_screen(frame, final_score, high_score);
            return;
        }

        frame.fill(colors::BLACK);
        let state = &self.run.state;
        match &self.sprites {
            Some(sprites) => {
                frame.sprite(&sprites.background, Vec2::ZERO);
                frame.sprite(&sprites.player, state.player);
                for drop in &state.drops {
                    frame.sprite(&sprites.drop, *drop);
                }
            }
            None => {
                frame.fill_rect(state.player_rect(), colors::YELLOW);
                for drop in &state.drops {
                    frame.fill_rect(state.drop_rect(*drop), colors::BLUE);
                }
            }
        }
        frame.text(Vec2::new(10.0, 10.0), format!("Score: {}", state.score), colors::WHITE);
        frame.text(
            Vec2::new(10.0, 50.0),
            format!("High Score: {}", self.high_score),
            colors::WHITE,
        );
    }

    fn capture_state(&self) -> Snapshot {
        Snapshot::new(self.run.clone())
    }

    fn restore_state(&mut self, snapshot: &Snapshot) {
        match snapshot.get::<DodgerRun>() {
            Some(run) => self.run = run.clone(),
            None => log::warn!("Ignoring snapshot that is not a Drop Dodger run"),
        }
    }
}
