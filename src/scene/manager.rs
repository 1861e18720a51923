//! Scene registry, lifecycle transitions and rewind dispatch

use std::collections::HashMap;

use super::{Scene, Snapshot, TickMode};
use crate::context::{SceneCommand, SceneContext};
use crate::error::SceneError;
use crate::event::GameEvent;
use crate::renderer::Frame;
use crate::rewind::RewindBuffer;

/// A registered scene and whether it is the active one
struct SceneEntry {
    scene: Box<dyn Scene>,
    active: bool,
}

/// Outcome of applying queued scene commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandOutcome {
    /// A quit was requested
    pub quit: bool,
    /// At least one transition happened
    pub transitioned: bool,
    /// The history was dropped without a transition
    pub history_cleared: bool,
}

/// Owns all scenes and the rewind history of the current one
pub struct SceneManager {
    scenes: HashMap<String, SceneEntry>,
    /// Registration order, for stable listings
    order: Vec<String>,
    current: Option<String>,
    history: RewindBuffer<Snapshot>,
}

impl SceneManager {
    /// Create a manager keeping up to `rewind_capacity` snapshots
    pub fn new(rewind_capacity: usize) -> Self {
        Self {
            scenes: HashMap::new(),
            order: Vec::new(),
            current: None,
            history: RewindBuffer::new(rewind_capacity),
        }
    }

    /// Add a scene under a unique name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        scene: Box<dyn Scene>,
    ) -> Result<(), SceneError> {
        let name = name.into();
        if self.scenes.contains_key(&name) {
            return Err(SceneError::Duplicate(name));
        }
        log::debug!("Registered scene '{}'", name);
        self.order.push(name.clone());
        self.scenes.insert(
            name,
            SceneEntry {
                scene,
                active: false,
            },
        );
        Ok(())
    }

    /// Make `name` the current scene.
    ///
    /// On an unknown name nothing changes: the current scene stays current
    /// and is not finalized. Otherwise the outgoing scene is finalized, the
    /// history and pending timers are dropped, and the incoming scene is
    /// initialized. Transitioning to the current scene restarts it.
    pub fn transition_to(&mut self, name: &str, ctx: &mut SceneContext) -> Result<(), SceneError> {
        if !self.scenes.contains_key(name) {
            return Err(SceneError::NotFound(name.to_string()));
        }

        if let Some(previous) = self.current.take() {
            if let Some(entry) = self.scenes.get_mut(&previous) {
                entry.scene.finalize(ctx);
                entry.active = false;
            }
        }

        self.history.clear();
        ctx.clear_timers();

        if let Some(entry) = self.scenes.get_mut(name) {
            entry.active = true;
            entry.scene.initialize(ctx);
        }
        self.current = Some(name.to_string());
        log::info!("Scene changed to '{}'", name);
        Ok(())
    }

    /// Run one tick on the current scene.
    ///
    /// Forward ticks record the post-update state. Rewind/replay ticks walk
    /// the history; past either end they do nothing.
    pub fn tick(&mut self, ctx: &mut SceneContext, dt: f32, mode: TickMode) {
        let Some(name) = self.current.as_deref() else {
            return;
        };
        let Some(entry) = self.scenes.get_mut(name) else {
            return;
        };

        match mode {
            TickMode::Advance => {
                entry.scene.advance(dt, ctx);
                self.history.push(entry.scene.capture_state());
            }
            TickMode::Rewind => {
                if let Some(snapshot) = self.history.step_back() {
                    entry.scene.restore_state(snapshot);
                }
            }
            TickMode::Replay => {
                if let Some(snapshot) = self.history.step_forward() {
                    entry.scene.restore_state(snapshot);
                }
            }
        }
    }

    /// Deliver an event to the current scene
    pub fn handle_event(&mut self, event: &GameEvent, ctx: &mut SceneContext) {
        if let Some(entry) = self.current_entry_mut() {
            entry.scene.handle_event(event, ctx);
        }
    }

    /// Apply commands queued by scenes during event handling or ticking.
    /// Failed transitions are logged and leave the current scene in place.
    pub fn apply_commands(&mut self, ctx: &mut SceneContext) -> CommandOutcome {
        let mut outcome = CommandOutcome::default();
        // Scenes may queue more commands while initializing
        while ctx.has_pending_commands() {
            for command in ctx.take_commands() {
                match command {
                    SceneCommand::Transition(name) => match self.transition_to(&name, ctx) {
                        Ok(()) => outcome.transitioned = true,
                        Err(e) => log::error!("Transition failed: {}", e),
                    },
                    SceneCommand::ClearHistory => {
                        self.clear_history();
                        outcome.history_cleared = true;
                    }
                    SceneCommand::Quit => outcome.quit = true,
                }
            }
            if outcome.quit {
                break;
            }
        }
        outcome
    }

    /// Draw the current scene
    pub fn render(&self, frame: &mut Frame) {
        if let Some(entry) = self.current.as_ref().and_then(|n| self.scenes.get(n)) {
            entry.scene.render(frame);
        }
    }

    /// Finalize the current scene before exit
    pub fn shutdown(&mut self, ctx: &mut SceneContext) {
        if let Some(name) = self.current.take() {
            if let Some(entry) = self.scenes.get_mut(&name) {
                entry.scene.finalize(ctx);
                entry.active = false;
            }
            log::info!("Scene '{}' shut down", name);
        }
        self.history.clear();
    }

    /// Drop recorded history without changing scenes
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Whether the named scene is the active one
    pub fn is_active(&self, name: &str) -> bool {
        self.scenes.get(name).is_some_and(|e| e.active)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    /// Registered names in registration order
    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn history(&self) -> &RewindBuffer<Snapshot> {
        &self.history
    }

    fn current_entry_mut(&mut self) -> Option<&mut SceneEntry> {
        let name = self.current.as_deref()?;
        self.scenes.get_mut(name)
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new(crate::rewind::DEFAULT_REWIND_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<String>>>;

    /// Scene that records lifecycle calls and counts ticks
    struct RecordingScene {
        name: &'static str,
        log: CallLog,
        value: i32,
    }

    impl RecordingScene {
        fn boxed(name: &'static str, log: &CallLog) -> Box<dyn Scene> {
            Box::new(Self {
                name,
                log: log.clone(),
                value: 0,
            })
        }
    }

    impl Scene for RecordingScene {
        fn initialize(&mut self, _ctx: &mut SceneContext) {
            self.log.borrow_mut().push(format!("{}.initialize", self.name));
        }

        fn finalize(&mut self, _ctx: &mut SceneContext) {
            self.log.borrow_mut().push(format!("{}.finalize", self.name));
        }

        fn handle_event(&mut self, event: &GameEvent, ctx: &mut SceneContext) {
            if let GameEvent::KeyDown(crate::event::Key::Enter) = event {
                ctx.request_transition("game");
            }
        }

        fn advance(&mut self, _dt: f32, _ctx: &mut SceneContext) {
            self.value += 1;
        }

        fn render(&self, _frame: &mut Frame) {}

        fn capture_state(&self) -> Snapshot {
            Snapshot::new(self.value)
        }

        fn restore_state(&mut self, snapshot: &Snapshot) {
            if let Some(value) = snapshot.get::<i32>() {
                self.value = *value;
            }
        }
    }

    fn setup() -> (SceneManager, SceneContext, CallLog) {
        let log: CallLog = Rc::default();
        let mut manager = SceneManager::new(8);
        manager.register("menu", RecordingScene::boxed("menu", &log)).unwrap();
        manager.register("game", RecordingScene::boxed("game", &log)).unwrap();
        (manager, SceneContext::default(), log)
    }

    fn recorded_value(manager: &SceneManager) -> i32 {
        manager
            .history()
            .current()
            .and_then(|s| s.get::<i32>().copied())
            .unwrap_or(-1)
    }

    #[test]
    fn test_register_duplicate_fails() {
        let (mut manager, _, log) = setup();
        let result = manager.register("menu", RecordingScene::boxed("menu2", &log));
        assert_eq!(result, Err(SceneError::Duplicate("menu".into())));
        assert_eq!(manager.scene_names().collect::<Vec<_>>(), vec!["menu", "game"]);
    }

    #[test]
    fn test_lifecycle_ordering() {
        let (mut manager, mut ctx, log) = setup();
        manager.transition_to("menu", &mut ctx).unwrap();
        manager.transition_to("game", &mut ctx).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["menu.initialize", "menu.finalize", "game.initialize"]
        );
        assert!(manager.is_active("game"));
        assert!(!manager.is_active("menu"));
    }

    #[test]
    fn test_transition_to_unknown_is_atomic() {
        let (mut manager, mut ctx, log) = setup();
        manager.transition_to("menu", &mut ctx).unwrap();
        let result = manager.transition_to("nowhere", &mut ctx);
        assert_eq!(result, Err(SceneError::NotFound("nowhere".into())));
        assert_eq!(manager.current_name(), Some("menu"));
        assert!(manager.is_active("menu"));
        assert_eq!(*log.borrow(), vec!["menu.initialize"]);
    }

    #[test]
    fn test_tick_without_scene_is_noop() {
        let (mut manager, mut ctx, _) = setup();
        manager.tick(&mut ctx, 0.016, TickMode::Advance);
        assert!(manager.history().is_empty());
    }

    #[test]
    fn test_advance_records_and_rewind_restores() {
        let (mut manager, mut ctx, _) = setup();
        manager.transition_to("game", &mut ctx).unwrap();
        for _ in 0..3 {
            manager.tick(&mut ctx, 0.016, TickMode::Advance);
        }
        assert_eq!(manager.history().len(), 3);
        assert_eq!(recorded_value(&manager), 3);

        manager.tick(&mut ctx, 0.016, TickMode::Rewind);
        assert_eq!(recorded_value(&manager), 2);
        manager.tick(&mut ctx, 0.016, TickMode::Rewind);
        manager.tick(&mut ctx, 0.016, TickMode::Rewind);
        // Past the oldest entry: idle
        assert_eq!(recorded_value(&manager), 1);

        manager.tick(&mut ctx, 0.016, TickMode::Replay);
        assert_eq!(recorded_value(&manager), 2);

        // Forward tick resumes from the restored value and drops the branch
        manager.tick(&mut ctx, 0.016, TickMode::Advance);
        assert_eq!(recorded_value(&manager), 3);
        assert_eq!(manager.history().len(), 3);
        assert!(!manager.history().can_step_forward());
    }

    #[test]
    fn test_rewind_on_empty_history_is_noop() {
        let (mut manager, mut ctx, _) = setup();
        manager.transition_to("game", &mut ctx).unwrap();
        manager.tick(&mut ctx, 0.016, TickMode::Rewind);
        assert_eq!(manager.history().cursor(), None);
    }

    #[test]
    fn test_restart_clears_history() {
        let (mut manager, mut ctx, log) = setup();
        manager.transition_to("game", &mut ctx).unwrap();
        manager.tick(&mut ctx, 0.016, TickMode::Advance);
        manager.transition_to("game", &mut ctx).unwrap();
        assert!(manager.history().is_empty());
        assert_eq!(
            *log.borrow(),
            vec!["game.initialize", "game.finalize", "game.initialize"]
        );
    }

    #[test]
    fn test_commands_drive_transitions() {
        let (mut manager, mut ctx, _) = setup();
        manager.transition_to("menu", &mut ctx).unwrap();
        manager.handle_event(&GameEvent::KeyDown(crate::event::Key::Enter), &mut ctx);
        let outcome = manager.apply_commands(&mut ctx);
        assert!(outcome.transitioned);
        assert!(!outcome.quit);
        assert_eq!(manager.current_name(), Some("game"));

        ctx.request_transition("missing");
        ctx.request_quit();
        let outcome = manager.apply_commands(&mut ctx);
        assert!(outcome.quit);
        assert!(!outcome.transitioned);
        assert_eq!(manager.current_name(), Some("game"));
    }

    #[test]
    fn test_clear_history_command_keeps_scene() {
        let (mut manager, mut ctx, log) = setup();
        manager.transition_to("game", &mut ctx).unwrap();
        manager.tick(&mut ctx, 0.016, TickMode::Advance);
        manager.tick(&mut ctx, 0.016, TickMode::Advance);

        ctx.request_history_clear();
        let outcome = manager.apply_commands(&mut ctx);
        assert!(outcome.history_cleared);
        assert!(!outcome.transitioned);
        assert!(manager.history().is_empty());
        assert_eq!(manager.current_name(), Some("game"));
        assert_eq!(*log.borrow(), vec!["game.initialize"]);

        // Nothing to rewind into
        manager.tick(&mut ctx, 0.016, TickMode::Rewind);
        manager.tick(&mut ctx, 0.016, TickMode::Advance);
        assert_eq!(recorded_value(&manager), 3);
        assert_eq!(manager.history().len(), 1);
    }

    #[test]
    fn test_shutdown_finalizes_current() {
        let (mut manager, mut ctx, log) = setup();
        manager.transition_to("menu", &mut ctx).unwrap();
        manager.shutdown(&mut ctx);
        assert_eq!(manager.current_name(), None);
        assert_eq!(*log.borrow(), vec!["menu.initialize", "menu.finalize"]);
    }
}
