//! Mission brief typed out on an old green-phosphor terminal

use std::collections::VecDeque;

use glam::Vec2;

use super::{Scene, Snapshot};
use crate::consts::{SCENE_BATTLE, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::context::SceneContext;
use crate::event::{GameEvent, Key, TimerId};
use crate::renderer::{Frame, colors};
use crate::sim::Rect;

/// Seconds per typed character
pub const CHAR_DELAY: f32 = 0.015;
/// Seconds spent on a blank line
pub const BLANK_LINE_DELAY: f32 = 0.3;
/// Pause after a line is complete
pub const LINE_PAUSE: f32 = 0.1;
/// Wait after the last line before the battle starts
pub const OUTRO_DELAY: f32 = 3.0;
/// ESC is ignored until this many seconds have passed
pub const SKIP_DELAY: f32 = 2.0;
pub const MAX_VISIBLE_LINES: usize = 15;

const SKIP_TIMER: TimerId = 1;

const LEFT_MARGIN: f32 = 30.0;
const TOP: f32 = 50.0;
const LINE_HEIGHT: f32 = 30.0;
/// Approximate advance of one glyph, for the cursor
const GLYPH_WIDTH: f32 = 10.0;

pub const BRIEF: &[&str] = &[
    "BRIEF DE MISSIONE - CLASSIFICAZIONE OMEGA-RED",
    "",
    "Data: 17 ottobre 3147",
    "Destinazione: Nucleo Solare",
    "Operatore: Comandante Lupo Bruni",
    "Progetto: AURORA",
    "",
    "\"Comandante Bruni, questo messaggio è probabilmente l'ultimo che riceverà dall'umanità.\"",
    "",
    "La Terra è in agonia. Gli oceani sono morti, i cieli avvelenati. Ciò che resta",
    "della nostra specie vive sottoterra, in rifugi sempre più silenziosi. Gli",
    "scienziati del programma Aurora hanno identificato un'unica possibilità di",
    "resettare il ciclo stellare: innescare una reazione a catena nel cuore del Sole.",
    "Una rinascita... o l'oblio totale.",
    "",
    "La sua missione: pilotare la sonda Helios-9 fino al cuore del Sole. La carica",
    "a bordo deve essere attivata manualmente. Nessun ritorno previsto. Nessuna gloria.",
    "Solo la fine. O un nuovo inizio.",
    "",
    "Ma avvicinandosi alla stella, forme di vita sconosciute (antiche, colossali,",
    "ostili) l'hanno intercettata. Il contatto è perso. Lei fallisce... e si risveglia.",
    "Ancora.",
    "",
    "Qualcosa ha spezzato il corso del tempo. Lei è intrappolato in un ciclo,",
    "un eterno ricominciare.",
    "",
    "E poi, durante il suo ultimo attraversamento, Il Fenice è apparso: una creatura",
    "di fuoco e luce, nata dalle ceneri del Sole stesso. È una guida? Un'arma?",
    "Un'illusione?",
    "",
    "Lei è solo, Comandante. Ancora e ancora.",
    "",
    "Ma questa volta... potrebbe essere l'ultima.",
];

/// Typing progress; this is what rewinding the intro restores
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Typewriter {
    /// Completed lines still on screen (oldest first)
    pub shown: VecDeque<String>,
    /// Line being typed
    pub current: String,
    pub line_index: usize,
    pub char_index: usize,
    /// Seconds since the scene started
    pub clock: f32,
    last_char_at: f32,
    line_done_at: Option<f32>,
    /// Set once every line has been typed
    pub finished_at: Option<f32>,
}

impl Typewriter {
    /// Step the typing animation through `lines` by `dt` seconds
    pub fn advance(&mut self, dt: f32, lines: &[&str]) {
        self.clock += dt;

        if self.finished_at.is_some() {
            return;
        }
        if self.line_index >= lines.len() {
            self.finished_at = Some(self.clock);
            return;
        }

        if let Some(done_at) = self.line_done_at {
            if self.clock - done_at > LINE_PAUSE {
                self.shown.push_back(std::mem::take(&mut self.current));
                if self.shown.len() > MAX_VISIBLE_LINES {
                    self.shown.pop_front();
                }
                self.line_index += 1;
                self.char_index = 0;
                self.line_done_at = None;
            }
            return;
        }

        let line = lines[self.line_index];
        if line.is_empty() {
            if self.clock - self.last_char_at > BLANK_LINE_DELAY {
                self.line_done_at = Some(self.clock);
                self.last_char_at = self.clock;
            }
            return;
        }

        match line.chars().nth(self.char_index) {
            Some(ch) => {
                if self.clock - self.last_char_at > CHAR_DELAY {
                    self.current.push(ch);
                    self.char_index += 1;
                    self.last_char_at = self.clock;
                }
            }
            None => self.line_done_at = Some(self.clock),
        }
    }

    pub fn is_line_done(&self) -> bool {
        self.line_done_at.is_some()
    }

    /// Index in the brief of the first line still on screen
    pub fn first_visible(&self) -> usize {
        self.line_index.saturating_sub(self.shown.len())
    }
}

#[derive(Debug, Default)]
pub struct IntroScene {
    typewriter: Typewriter,
    skip_enabled: bool,
}

impl IntroScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typewriter(&self) -> &Typewriter {
        &self.typewriter
    }

    pub fn can_skip(&self) -> bool {
        self.skip_enabled
    }

    fn draw_crt(&self, frame: &mut Frame) {
        let mut y = 0.0;
        while y < SCREEN_HEIGHT {
            frame.line(Vec2::new(0.0, y), Vec2::new(SCREEN_WIDTH, y), colors::SCANLINE);
            y += 2.0;
        }
        let margin = 10.0;
        frame.stroke_rect(
            Rect::from_xywh(margin, margin, SCREEN_WIDTH - 2.0 * margin, SCREEN_HEIGHT - 2.0 * margin),
            colors::CRT_FRAME,
        );
    }
}

impl Scene for IntroScene {
    fn initialize(&mut self, ctx: &mut SceneContext) {
        self.typewriter = Typewriter::default();
        self.skip_enabled = false;
        ctx.set_timer(SKIP_TIMER, SKIP_DELAY);
    }

    fn finalize(&mut self, ctx: &mut SceneContext) {
        ctx.cancel_timer(SKIP_TIMER);
    }

    fn handle_event(&mut self, event: &GameEvent, ctx: &mut SceneContext) {
        match event {
            GameEvent::Timer(SKIP_TIMER) => self.skip_enabled = true,
            GameEvent::KeyDown(Key::Escape) if self.skip_enabled => {
                log::info!("Brief skipped");
                ctx.request_transition(SCENE_BATTLE);
            }
            _ => {}
        }
    }

    fn advance(&mut self, dt: f32, ctx: &mut SceneContext) {
        self.typewriter.advance(dt, BRIEF);
        if let Some(finished_at) = self.typewriter.finished_at {
            if self.typewriter.clock - finished_at > OUTRO_DELAY && !ctx.has_pending_commands() {
                ctx.request_transition(SCENE_BATTLE);
            }
        }
    }

    fn render(&self, frame: &mut Frame) {
        frame.fill(colors::BLACK);
        self.draw_crt(frame);

        let tw = &self.typewriter;
        let first = tw.first_visible();
        let color_for = |index: usize| if index == 0 { colors::YELLOW } else { colors::TERMINAL_GREEN };

        for (i, line) in tw.shown.iter().enumerate() {
            let pos = Vec2::new(LEFT_MARGIN, TOP + i as f32 * LINE_HEIGHT);
            frame.text(pos, line.as_str(), color_for(first + i));
        }

        let current_y = TOP + tw.shown.len() as f32 * LINE_HEIGHT;
        let current_color = color_for(tw.line_index);
        frame.text(Vec2::new(LEFT_MARGIN, current_y), tw.current.as_str(), current_color);

        let blink_on = (frame.time * 2.0) as i64 % 2 == 0;
        if !tw.is_line_done() && tw.finished_at.is_none() && blink_on {
            let x = LEFT_MARGIN + tw.current.chars().count() as f32 * GLYPH_WIDTH;
            frame.fill_rect(Rect::from_xywh(x, current_y, 8.0, 20.0), current_color);
        }

        let hint = if self.skip_enabled {
            colors::LIGHT_GREY
        } else {
            colors::GREY
        };
        frame.text(Vec2::new(20.0, SCREEN_HEIGHT - 40.0), "Premi ESC per saltare", hint);
    }

    fn capture_state(&self) -> Snapshot {
        Snapshot::new(self.typewriter.clone())
    }

    fn restore_state(&mut self, snapshot: &Snapshot) {
        if let Some(typewriter) = snapshot.get::<Typewriter>() {
            self.typewriter = typewriter.clone();
        }
    }
}
