//! Explicit per-game context handed to scenes
//!
//! Replaces process-wide globals: scenes read settings and assets from here
//! and queue requests (scene transitions, quit, timers) that the frame loop
//! applies between ticks.

use crate::assets::AssetLoader;
use crate::event::TimerId;
use crate::settings::Settings;

/// Request queued by a scene for the loop to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneCommand {
    /// Switch to the named scene (switching to the current scene restarts it)
    Transition(String),
    /// Forget the rewind history (a scene restarted in place)
    ClearHistory,
    /// Stop the game loop
    Quit,
}

#[derive(Debug, Clone)]
struct PendingTimer {
    id: TimerId,
    remaining: f32,
}

/// State shared between the loop and the active scene
#[derive(Debug)]
pub struct SceneContext {
    pub settings: Settings,
    pub assets: AssetLoader,
    commands: Vec<SceneCommand>,
    timers: Vec<PendingTimer>,
    /// Real seconds since the loop started (not rewound)
    elapsed: f64,
}

impl SceneContext {
    pub fn new(settings: Settings, assets: AssetLoader) -> Self {
        Self {
            settings,
            assets,
            commands: Vec::new(),
            timers: Vec::new(),
            elapsed: 0.0,
        }
    }

    /// Ask the loop to switch scenes after the current tick
    pub fn request_transition(&mut self, name: impl Into<String>) {
        self.commands.push(SceneCommand::Transition(name.into()));
    }

    /// Ask the loop to drop the rewind history after the current tick
    pub fn request_history_clear(&mut self) {
        self.commands.push(SceneCommand::ClearHistory);
    }

    /// Ask the loop to stop
    pub fn request_quit(&mut self) {
        self.commands.push(SceneCommand::Quit);
    }

    /// Drain queued commands in request order
    pub fn take_commands(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn has_pending_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    /// Fire `GameEvent::Timer(id)` after `delay` seconds. Rescheduling an id
    /// replaces the previous deadline.
    pub fn set_timer(&mut self, id: TimerId, delay: f32) {
        self.cancel_timer(id);
        self.timers.push(PendingTimer {
            id,
            remaining: delay.max(0.0),
        });
    }

    pub fn cancel_timer(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id);
    }

    /// Drop every pending timer (done on scene transitions)
    pub fn clear_timers(&mut self) {
        self.timers.clear();
    }

    /// Advance real time and return the timers that expired, in schedule order
    pub fn expire_timers(&mut self, dt: f32) -> Vec<TimerId> {
        self.elapsed += dt as f64;
        let mut fired = Vec::new();
        self.timers.retain_mut(|timer| {
            timer.remaining -= dt;
            if timer.remaining <= 0.0 {
                fired.push(timer.id);
                false
            } else {
                true
            }
        });
        fired
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl Default for SceneContext {
    fn default() -> Self {
        Self::new(Settings::default(), AssetLoader::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_drain_in_order() {
        let mut ctx = SceneContext::default();
        ctx.request_transition("game");
        ctx.request_quit();
        assert!(ctx.has_pending_commands());
        assert_eq!(
            ctx.take_commands(),
            vec![SceneCommand::Transition("game".into()), SceneCommand::Quit]
        );
        assert!(ctx.take_commands().is_empty());
    }

    #[test]
    fn test_timers_fire_once() {
        let mut ctx = SceneContext::default();
        ctx.set_timer(1, 0.5);
        ctx.set_timer(2, 1.0);
        assert!(ctx.expire_timers(0.4).is_empty());
        assert_eq!(ctx.expire_timers(0.2), vec![1]);
        assert_eq!(ctx.expire_timers(0.5), vec![2]);
        assert!(ctx.expire_timers(5.0).is_empty());
    }

    #[test]
    fn test_reschedule_replaces_deadline() {
        let mut ctx = SceneContext::default();
        ctx.set_timer(7, 0.1);
        ctx.set_timer(7, 1.0);
        assert!(ctx.expire_timers(0.5).is_empty());
        ctx.cancel_timer(7);
        assert!(ctx.expire_timers(1.0).is_empty());
    }
}
