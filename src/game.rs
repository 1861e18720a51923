//! Frame loop
//!
//! Each frame: measure dt, turn expired timers into events, poll input,
//! handle quit and the rewind keys, dispatch the rest to the current scene,
//! tick once in the selected [`TickMode`], apply queued scene commands,
//! then render and present.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use glam::Vec2;

use crate::clock::Clock;
use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::context::SceneContext;
use crate::error::{GameError, Result};
use crate::event::{GameEvent, Key};
use crate::input::EventSource;
use crate::renderer::{Frame, Surface, colors};
use crate::scene::{SceneManager, TickMode};

/// How the rewind and replay keys behave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewindControl {
    /// Active while the key is held (needs key release events)
    #[default]
    Hold,
    /// Each press flips the state
    Toggle,
}

impl RewindControl {
    /// Pick the control style a terminal can support
    pub fn for_terminal(key_release: bool) -> Self {
        if key_release {
            RewindControl::Hold
        } else {
            RewindControl::Toggle
        }
    }
}

/// Owns the scenes and drives them frame by frame
pub struct Game<E: EventSource, S: Surface> {
    manager: SceneManager,
    ctx: SceneContext,
    clock: Clock,
    events: E,
    surface: S,
    control: RewindControl,
    rewind_on: bool,
    replay_on: bool,
    running: bool,
    frames: u64,
}

impl<E: EventSource, S: Surface> Game<E, S> {
    pub fn new(manager: SceneManager, ctx: SceneContext, events: E, surface: S) -> Self {
        let clock = Clock::new(ctx.settings.tick_rate);
        Self {
            manager,
            ctx,
            clock,
            events,
            surface,
            control: RewindControl::default(),
            rewind_on: false,
            replay_on: false,
            running: true,
            frames: 0,
        }
    }

    pub fn with_control(mut self, control: RewindControl) -> Self {
        self.control = control;
        self
    }

    /// Enter the first scene
    pub fn start(&mut self, scene: &str) -> Result<()> {
        self.manager.transition_to(scene, &mut self.ctx)?;
        Ok(())
    }

    pub fn manager(&self) -> &SceneManager {
        &self.manager
    }

    pub fn ctx(&self) -> &SceneContext {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut SceneContext {
        &mut self.ctx
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames presented so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Mode the next tick runs in. Rewind wins over replay.
    pub fn tick_mode(&self) -> TickMode {
        if self.rewind_on {
            TickMode::Rewind
        } else if self.replay_on {
            TickMode::Replay
        } else {
            TickMode::Advance
        }
    }

    fn rewind_key(&mut self, key: Key, down: bool) {
        let flag = match key {
            Key::Rewind => &mut self.rewind_on,
            _ => &mut self.replay_on,
        };
        match self.control {
            RewindControl::Hold => *flag = down,
            RewindControl::Toggle => {
                if down {
                    *flag = !*flag;
                }
            }
        }
    }

    /// Run one frame with the given delta. Returns false once the game
    /// should stop.
    pub fn run_frame(&mut self, dt: f32) -> Result<bool> {
        let mut events: Vec<GameEvent> = self
            .ctx
            .expire_timers(dt)
            .into_iter()
            .map(GameEvent::Timer)
            .collect();
        events.extend(self.events.poll()?);

        for event in &events {
            match event {
                GameEvent::Quit => {
                    log::info!("Quit requested");
                    self.running = false;
                    break;
                }
                GameEvent::KeyDown(key @ (Key::Rewind | Key::Replay)) => {
                    self.rewind_key(*key, true)
                }
                GameEvent::KeyUp(key @ (Key::Rewind | Key::Replay)) => {
                    self.rewind_key(*key, false)
                }
                _ => self.manager.handle_event(event, &mut self.ctx),
            }
        }
        if !self.running {
            return Ok(false);
        }

        let mode = self.tick_mode();
        self.manager.tick(&mut self.ctx, dt, mode);

        let outcome = self.manager.apply_commands(&mut self.ctx);
        if outcome.transitioned || outcome.history_cleared {
            self.rewind_on = false;
            self.replay_on = false;
        }
        if outcome.quit {
            log::info!("Scene requested quit");
            self.running = false;
            return Ok(false);
        }

        let mut frame = Frame::new(self.ctx.elapsed());
        self.manager.render(&mut frame);
        self.draw_overlay(&mut frame, mode);
        self.surface.present(&frame)?;
        self.frames += 1;
        Ok(true)
    }

    fn draw_overlay(&self, frame: &mut Frame, mode: TickMode) {
        let label = match mode {
            TickMode::Rewind => Some("<< REWIND"),
            TickMode::Replay => Some("REPLAY >>"),
            TickMode::Advance => None,
        };
        if let Some(label) = label {
            frame.text_centered(Vec2::new(SCREEN_WIDTH / 2.0, 20.0), label, colors::REWIND);
        }
        if self.ctx.settings.show_fps {
            frame.text(
                Vec2::new(SCREEN_WIDTH - 90.0, SCREEN_HEIGHT - 20.0),
                format!("FPS: {}", self.clock.fps()),
                colors::LIGHT_GREY,
            );
        }
    }

    /// Run until quit, then finalize the current scene. The scene is
    /// finalized on errors and panics too; a panic comes back as
    /// [`GameError::Panic`].
    pub fn run(&mut self) -> Result<()> {
        log::info!("Game loop running at {} ticks/s", self.ctx.settings.tick_rate);
        let result = match panic::catch_unwind(AssertUnwindSafe(|| self.run_loop())) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("Game loop panicked: {}", message);
                Err(GameError::Panic(message))
            }
        };
        self.manager.shutdown(&mut self.ctx);
        log::info!("Game loop stopped after {} frames", self.frames);
        result
    }

    fn run_loop(&mut self) -> Result<()> {
        while self.running {
            let dt = self.clock.tick();
            if !self.run_frame(dt)? {
                break;
            }
            self.clock.wait();
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{SCENE_BATTLE, SCENE_INTRO, SCENE_MENU};
    use crate::input::ScriptedEvents;
    use crate::renderer::{DrawCmd, NullSurface};
    use crate::scene::{BattleScene, IntroScene, MenuScene, Scene, Snapshot};
    use std::cell::Cell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    /// Scene whose whole state is a tick counter
    #[derive(Default)]
    struct Counter {
        ticks: u32,
    }

    impl Scene for Counter {
        fn initialize(&mut self, _ctx: &mut SceneContext) {
            self.ticks = 0;
        }
        fn finalize(&mut self, _ctx: &mut SceneContext) {}
        fn advance(&mut self, _dt: f32, _ctx: &mut SceneContext) {
            self.ticks += 1;
        }
        fn render(&self, frame: &mut Frame) {
            frame.text(Vec2::ZERO, format!("ticks {}", self.ticks), colors::WHITE);
        }
        fn capture_state(&self) -> Snapshot {
            Snapshot::new(self.ticks)
        }
        fn restore_state(&mut self, snapshot: &Snapshot) {
            if let Some(ticks) = snapshot.get::<u32>() {
                self.ticks = *ticks;
            }
        }
    }

    /// Surface keeping the last frame
    #[derive(Default)]
    struct LastFrame(Option<Frame>);

    impl Surface for LastFrame {
        fn present(&mut self, frame: &Frame) -> std::io::Result<()> {
            self.0 = Some(frame.clone());
            Ok(())
        }
    }

    impl LastFrame {
        fn texts(&self) -> Vec<String> {
            self.0
                .iter()
                .flat_map(|f| f.commands())
                .filter_map(|cmd| match cmd {
                    DrawCmd::Text { text, .. } => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    fn counter_game(script: ScriptedEvents) -> Game<ScriptedEvents, LastFrame> {
        let mut manager = SceneManager::new(600);
        manager.register("count", Box::new(Counter::default())).unwrap();
        let mut game = Game::new(manager, SceneContext::default(), script, LastFrame::default());
        game.start("count").unwrap();
        game
    }

    fn frames(game: &mut Game<ScriptedEvents, LastFrame>, n: usize) {
        for _ in 0..n {
            game.run_frame(DT).unwrap();
        }
    }

    #[test]
    fn test_hold_rewind_then_replay() {
        let mut script = ScriptedEvents::default();
        script.idle(5);
        script.push(vec![GameEvent::KeyDown(Key::Rewind)]);
        script.idle(1);
        script.push(vec![GameEvent::KeyUp(Key::Rewind), GameEvent::KeyDown(Key::Replay)]);
        let mut game = counter_game(script);

        frames(&mut game, 5);
        assert!(game.surface().texts().contains(&"ticks 5".to_string()));

        // Two rewind ticks: 5 -> 4 -> 3
        frames(&mut game, 2);
        assert!(game.surface().texts().contains(&"ticks 3".to_string()));
        assert!(game.surface().texts().contains(&"<< REWIND".to_string()));

        // One replay tick: 3 -> 4
        frames(&mut game, 1);
        assert_eq!(game.tick_mode(), TickMode::Replay);
        assert!(game.surface().texts().contains(&"ticks 4".to_string()));
    }

    #[test]
    fn test_rewind_wins_over_replay() {
        let script = ScriptedEvents::new(vec![vec![
            GameEvent::KeyDown(Key::Replay),
            GameEvent::KeyDown(Key::Rewind),
        ]]);
        let mut game = counter_game(script);
        frames(&mut game, 1);
        assert_eq!(game.tick_mode(), TickMode::Rewind);
    }

    #[test]
    fn test_toggle_control() {
        let script = ScriptedEvents::new(vec![
            vec![GameEvent::KeyDown(Key::Rewind)],
            vec![GameEvent::KeyUp(Key::Rewind)],
            vec![GameEvent::KeyDown(Key::Rewind)],
        ]);
        let mut game = counter_game(script).with_control(RewindControl::Toggle);
        frames(&mut game, 2);
        assert_eq!(game.tick_mode(), TickMode::Rewind);
        frames(&mut game, 1);
        assert_eq!(game.tick_mode(), TickMode::Advance);
    }

    #[test]
    fn test_quit_event_stops_before_tick() {
        let script = ScriptedEvents::new(vec![vec![GameEvent::Quit]]);
        let mut game = counter_game(script);
        assert!(!game.run_frame(DT).unwrap());
        assert!(!game.is_running());
        assert_eq!(game.frames(), 0);
    }

    #[test]
    fn test_run_finalizes_on_quit() {
        let mut script = ScriptedEvents::default();
        script.idle(3);
        script.push(vec![GameEvent::Quit]);
        let mut manager = SceneManager::new(600);
        manager.register(SCENE_MENU, Box::new(MenuScene::new())).unwrap();
        let mut ctx = SceneContext::default();
        ctx.settings.tick_rate = 0;
        let mut game = Game::new(manager, ctx, script, NullSurface::default());
        game.start(SCENE_MENU).unwrap();

        game.run().unwrap();
        assert_eq!(game.surface().frames_presented, 3);
        assert_eq!(game.manager().current_name(), None);
    }

    #[test]
    fn test_scene_quit_command_stops_loop() {
        let script = ScriptedEvents::new(vec![vec![GameEvent::KeyDown(Key::Escape)]]);
        let mut manager = SceneManager::new(600);
        manager.register(SCENE_MENU, Box::new(MenuScene::new())).unwrap();
        let mut game = Game::new(manager, SceneContext::default(), script, NullSurface::default());
        game.start(SCENE_MENU).unwrap();
        assert!(!game.run_frame(DT).unwrap());
    }

    #[test]
    fn test_menu_to_intro_to_battle() {
        let mut script = ScriptedEvents::new(vec![vec![GameEvent::KeyDown(Key::Enter)]]);
        // Skip becomes available after two seconds of real time
        script.idle(130);
        script.push(vec![GameEvent::KeyDown(Key::Escape)]);
        let mut manager = SceneManager::new(600);
        manager.register(SCENE_MENU, Box::new(MenuScene::new())).unwrap();
        manager.register(SCENE_INTRO, Box::new(IntroScene::new())).unwrap();
        manager
            .register(SCENE_BATTLE, Box::new(BattleScene::with_seed(Some(5))))
            .unwrap();
        let mut game = Game::new(manager, SceneContext::default(), script, NullSurface::default());
        game.start(SCENE_MENU).unwrap();

        game.run_frame(DT).unwrap();
        assert_eq!(game.manager().current_name(), Some(SCENE_INTRO));
        frames_null(&mut game, 131);
        assert_eq!(game.manager().current_name(), Some(SCENE_BATTLE));
    }

    fn frames_null(game: &mut Game<ScriptedEvents, NullSurface>, n: usize) {
        for _ in 0..n {
            game.run_frame(DT).unwrap();
        }
    }

    #[test]
    fn test_transition_resets_rewind_keys() {
        let script = ScriptedEvents::new(vec![vec![GameEvent::KeyDown(Key::Rewind)]]);
        let mut manager = SceneManager::new(600);
        manager.register("count", Box::new(Counter::default())).unwrap();
        manager.register("other", Box::new(Counter::default())).unwrap();
        let mut game = Game::new(manager, SceneContext::default(), script, NullSurface::default());
        game.start("count").unwrap();
        game.run_frame(DT).unwrap();
        assert_eq!(game.tick_mode(), TickMode::Rewind);

        game.ctx_mut().request_transition("other");
        game.run_frame(DT).unwrap();
        assert_eq!(game.tick_mode(), TickMode::Advance);
        assert_eq!(game.manager().current_name(), Some("other"));
    }

    /// Scene that panics on its first tick and counts finalizations
    struct Faulty {
        finalized: Rc<Cell<u32>>,
    }

    impl Scene for Faulty {
        fn initialize(&mut self, _ctx: &mut SceneContext) {}
        fn finalize(&mut self, _ctx: &mut SceneContext) {
            self.finalized.set(self.finalized.get() + 1);
        }
        fn advance(&mut self, _dt: f32, _ctx: &mut SceneContext) {
            panic!("scene bug");
        }
        fn render(&self, _frame: &mut Frame) {}
    }

    #[test]
    fn test_run_survives_scene_panic() {
        let finalized = Rc::new(Cell::new(0));
        let mut manager = SceneManager::new(600);
        manager
            .register(
                "faulty",
                Box::new(Faulty {
                    finalized: Rc::clone(&finalized),
                }),
            )
            .unwrap();
        let mut ctx = SceneContext::default();
        ctx.settings.tick_rate = 0;
        let mut game = Game::new(manager, ctx, ScriptedEvents::default(), NullSurface::default());
        game.start("faulty").unwrap();

        let result = game.run();
        assert!(matches!(result, Err(GameError::Panic(ref message)) if message == "scene bug"));
        assert_eq!(finalized.get(), 1);
        assert_eq!(game.manager().current_name(), None);
    }

    #[test]
    fn test_panic_message_formats() {
        let owned: Box<dyn Any + Send> = Box::new(format!("bad {}", 7));
        assert_eq!(panic_message(owned.as_ref()), "bad 7");
        let other: Box<dyn Any + Send> = Box::new(3_u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[test]
    fn test_fps_overlay() {
        let mut game = counter_game(ScriptedEvents::default());
        game.ctx_mut().settings.show_fps = true;
        frames(&mut game, 2);
        assert!(game.surface().texts().iter().any(|t| t.starts_with("FPS: ")));
    }
}
