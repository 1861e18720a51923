//! Drop Dodger on a plain terminal
//!
//! The field is a 40x20 character grid stepped every 100 ms. Keyboard input
//! is read on its own thread and applied to the shared state under a mutex,
//! so the player can move between steps.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{self, Color as TermColor};
use crossterm::{cursor, queue, terminal};
use rand::seq::IndexedRandom;

use super::{DodgerField, DodgerState, Move};
use crate::error::Result;
use crate::highscores::HighScoreFile;
use crate::renderer::terminal::TerminalSession;
use crate::settings::Difficulty;

/// Time between simulation steps
pub const STEP: Duration = Duration::from_millis(100);
/// How long the input thread waits for a key before rechecking the stop flag
const INPUT_POLL: Duration = Duration::from_millis(50);
/// Score line is cut to this many characters
const MAX_SCORE_WIDTH: usize = 10;

const PLAYER_CHAR: char = '@';
const DROP_CHAR: char = 'D';
const EMPTY_CHAR: char = '.';
const DROP_COLORS: [TermColor; 3] = [TermColor::Blue, TermColor::Cyan, TermColor::White];

/// State shared between the step loop and the input thread
#[derive(Debug)]
pub struct DodgerShared {
    pub state: DodgerState,
    /// Set by the input thread when the player asks to leave
    pub quit: bool,
}

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Move),
    Quit,
}

/// Map a terminal key to a command
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Left => Some(Command::Move(Move::Left)),
        KeyCode::Right => Some(Command::Move(Move::Right)),
        KeyCode::Up => Some(Command::Move(Move::Up)),
        KeyCode::Down => Some(Command::Move(Move::Down)),
        KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        _ => None,
    }
}

fn lock(shared: &Mutex<DodgerShared>) -> MutexGuard<'_, DodgerShared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Apply commands from `next` to the shared state until `stop` is set or
/// the player quits. `next` returns `Ok(None)` when no key arrived in time.
pub fn input_loop<F>(mut next: F, shared: &Mutex<DodgerShared>, stop: &AtomicBool)
where
    F: FnMut() -> io::Result<Option<Command>>,
{
    while !stop.load(Ordering::Relaxed) {
        match next() {
            Ok(Some(Command::Move(dir))) => lock(shared).state.move_player(dir),
            Ok(Some(Command::Quit)) => {
                lock(shared).quit = true;
                return;
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Input thread stopped: {}", e);
                lock(shared).quit = true;
                return;
            }
        }
    }
}

fn read_terminal_command() -> io::Result<Option<Command>> {
    if !event::poll(INPUT_POLL)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) => Ok(command_for(&key)),
        _ => Ok(None),
    }
}

/// Text rows of the field plus the score line
pub fn render_rows(state: &DodgerState) -> Vec<String> {
    let cols = state.field.size.x as usize;
    let rows = state.field.size.y as usize;
    let mut grid = vec![vec![EMPTY_CHAR; cols]; rows];

    for drop in &state.drops {
        let (x, y) = (drop.x as usize, drop.y as usize);
        if y < rows && x < cols {
            grid[y][x] = DROP_CHAR;
        }
    }
    let (px, py) = (state.player.x as usize, state.player.y as usize);
    if py < rows && px < cols {
        grid[py][px] = PLAYER_CHAR;
    }

    let mut lines: Vec<String> = grid.into_iter().map(|row| row.into_iter().collect()).collect();
    let mut score = format!("Score: {}", state.score);
    score.truncate(MAX_SCORE_WIDTH);
    lines.push(score);
    lines
}

fn draw(out: &mut impl Write, rows: &[String]) -> io::Result<()> {
    let mut rng = rand::rng();
    for (y, row) in rows.iter().enumerate() {
        queue!(out, cursor::MoveTo(0, y as u16))?;
        for ch in row.chars() {
            if ch == DROP_CHAR {
                let color = DROP_COLORS.choose(&mut rng).copied().unwrap_or(TermColor::White);
                queue!(out, style::SetForegroundColor(color), style::Print(ch), style::ResetColor)?;
            } else {
                queue!(out, style::Print(ch))?;
            }
        }
        queue!(out, terminal::Clear(terminal::ClearType::UntilNewLine))?;
    }
    out.flush()
}

fn draw_game_over(out: &mut impl Write, field: &DodgerField, score: u64) -> io::Result<()> {
    let mid_x = field.size.x as u16 / 2;
    let mid_y = field.size.y as u16 / 2;
    let title = "Game Over";
    let final_score = format!("Final Score: {}", score);
    queue!(
        out,
        cursor::MoveTo(mid_x.saturating_sub(title.len() as u16 / 2), mid_y),
        style::Print(title),
        cursor::MoveTo(mid_x.saturating_sub(final_score.len() as u16 / 2), mid_y + 1),
        style::Print(&final_score),
    )?;
    out.flush()
}

/// Block until a key is pressed
fn wait_for_key() -> io::Result<()> {
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Release {
                return Ok(());
            }
        }
    }
}

/// Play one terminal round. Returns the final score.
pub fn run(difficulty: Difficulty, seed: u64, high_scores: &HighScoreFile) -> Result<u64> {
    let state = DodgerState::new(DodgerField::terminal(), difficulty, seed);
    let field = state.field;
    let shared = Arc::new(Mutex::new(DodgerShared { state, quit: false }));
    let stop = Arc::new(AtomicBool::new(false));

    let session = TerminalSession::start()?;
    let input = {
        let shared = Arc::clone(&shared);
        let stop = Arc::clone(&stop);
        thread::Builder::new()
            .name("dodger-input".into())
            .spawn(move || input_loop(read_terminal_command, &shared, &stop))?
    };
    log::info!("Drop Dodger (terminal) started, difficulty {}", difficulty.as_str());

    let mut out = io::stdout();
    let (score, crashed) = loop {
        let (rows, crashed, quit, score) = {
            let mut guard = lock(&shared);
            let rows = render_rows(&guard.state);
            let crashed = guard.state.step();
            (rows, crashed, guard.quit, guard.state.score)
        };
        if let Err(e) = draw(&mut out, &rows) {
            stop.store(true, Ordering::Relaxed);
            return Err(e.into());
        }
        if crashed || quit {
            break (score, crashed);
        }
        thread::sleep(STEP);
    };

    stop.store(true, Ordering::Relaxed);
    if input.join().is_err() {
        log::warn!("Input thread panicked");
    }

    if crashed {
        draw_game_over(&mut out, &field, score)?;
        wait_for_key()?;
    }
    drop(session);

    high_scores.submit(score)?;
    log::info!("Drop Dodger (terminal) finished with score {}", score);
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::collections::VecDeque;

    fn shared() -> Mutex<DodgerShared> {
        Mutex::new(DodgerShared {
            state: DodgerState::new(DodgerField::terminal(), Difficulty::Easy, 3),
            quit: false,
        })
    }

    #[test]
    fn test_command_mapping() {
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(command_for(&press(KeyCode::Left)), Some(Command::Move(Move::Left)));
        assert_eq!(command_for(&press(KeyCode::Down)), Some(Command::Move(Move::Down)));
        assert_eq!(command_for(&press(KeyCode::Esc)), Some(Command::Quit));
        assert_eq!(command_for(&press(KeyCode::Char('x'))), None);
        assert_eq!(
            command_for(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
    }

    #[test]
    fn test_input_loop_moves_player_then_quits() {
        let shared = shared();
        let stop = AtomicBool::new(false);
        let mut script: VecDeque<Option<Command>> = VecDeque::from(vec![
            Some(Command::Move(Move::Left)),
            None,
            Some(Command::Move(Move::Up)),
            Some(Command::Quit),
            Some(Command::Move(Move::Left)),
        ]);
        input_loop(|| Ok(script.pop_front().flatten()), &shared, &stop);

        let guard = lock(&shared);
        assert!(guard.quit);
        assert_eq!(guard.state.player, Vec2::new(19.0, 17.0));
    }

    #[test]
    fn test_input_loop_honors_stop_flag() {
        let shared = shared();
        let stop = AtomicBool::new(true);
        input_loop(|| Ok(Some(Command::Move(Move::Left))), &shared, &stop);
        assert_eq!(lock(&shared).state.player, Vec2::new(20.0, 18.0));
    }

    #[test]
    fn test_input_thread_updates_shared_state() {
        let shared = Arc::new(shared());
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let shared = Arc::clone(&shared);
            let stop = Arc::clone(&stop);
            let mut sent = 0;
            thread::spawn(move || {
                input_loop(
                    || {
                        sent += 1;
                        Ok(match sent {
                            1..=3 => Some(Command::Move(Move::Right)),
                            _ => Some(Command::Quit),
                        })
                    },
                    &shared,
                    &stop,
                )
            })
        };
        handle.join().unwrap();
        assert_eq!(lock(&shared).state.player.x, 23.0);
    }

    #[test]
    fn test_render_rows() {
        let mut state = DodgerState::new(DodgerField::terminal(), Difficulty::Easy, 1);
        state.drops.push(Vec2::new(0.0, 0.0));
        state.score = 1_234_567;
        let rows = render_rows(&state);
        assert_eq!(rows.len(), 21);
        assert!(rows[0].starts_with("D...."));
        assert_eq!(rows[18].chars().nth(20), Some('@'));
        assert_eq!(rows[20], "Score: 123");
    }
}
