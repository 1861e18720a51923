//! Deterministic battle simulation
//!
//! All gameplay logic for the main battle lives here. Nothing in this
//! module renders or reads input devices; the scene feeds it a
//! [`TickInput`] and draws the resulting [`BattleState`].

pub mod boss;
pub mod collision;
pub mod entities;
pub mod state;
pub mod tick;

pub use boss::{Boss, BossStats};
pub use collision::{Body, Entity, Rect, first_hit, sweep};
pub use entities::{BossLaser, Enemy, EnemyKind, Fireball, Laser, PowerUp, PowerUpKind};
pub use state::{BattleEvent, BattlePhase, BattleState, Ship, damage_tier, play_area};
pub use tick::{TickInput, apply_power_up, tick};
