//! Main menu: title, START button and the hidden Drop Dodger key

use glam::Vec2;

use super::Scene;
use crate::assets::{Sprite, SpriteShape};
use crate::consts::{SCENE_DODGER, SCENE_INTRO, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::context::SceneContext;
use crate::event::{GameEvent, Key};
use crate::renderer::{Color, Frame, colors};
use crate::sim::Rect;

pub const BUTTON_SIZE: Vec2 = Vec2::new(200.0, 60.0);
const TITLE: &str = "INVASORI INFINITO";
const TITLE_COLOR: Color = colors::YELLOW;

/// START button rectangle: centered, 50px below the middle
pub fn start_button() -> Rect {
    Rect::new(
        Vec2::new(
            ((SCREEN_WIDTH - BUTTON_SIZE.x) / 2.0).floor(),
            ((SCREEN_HEIGHT - BUTTON_SIZE.y) / 2.0).floor() + 50.0,
        ),
        BUTTON_SIZE,
    )
}

#[derive(Debug)]
pub struct MenuScene {
    button: Rect,
    hovered: bool,
    background: Option<Sprite>,
}

impl Default for MenuScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuScene {
    pub fn new() -> Self {
        Self {
            button: start_button(),
            hovered: false,
            background: None,
        }
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    fn start(&self, ctx: &mut SceneContext) {
        log::info!("Starting mission brief");
        ctx.request_transition(SCENE_INTRO);
    }
}

impl Scene for MenuScene {
    fn initialize(&mut self, ctx: &mut SceneContext) {
        self.button = start_button();
        self.hovered = false;
        self.background = Some(ctx.assets.sprite(
            "img/sfondo_menu.jpg",
            Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            Color::rgb(5, 5, 20),
            SpriteShape::Rect,
        ));
    }

    fn finalize(&mut self, _ctx: &mut SceneContext) {
        self.hovered = false;
    }

    fn handle_event(&mut self, event: &GameEvent, ctx: &mut SceneContext) {
        match event {
            GameEvent::MouseMove(pos) => self.hovered = self.button.contains(*pos),
            GameEvent::MouseDown { .. } => {
                if let Some(pos) = event.left_click() {
                    self.hovered = self.button.contains(pos);
                    if self.hovered {
                        self.start(ctx);
                    }
                }
            }
            GameEvent::KeyDown(Key::Enter | Key::Space) => self.start(ctx),
            GameEvent::KeyDown(Key::Char('d')) => {
                log::info!("Secret found: Drop Dodger");
                ctx.request_transition(SCENE_DODGER);
            }
            GameEvent::KeyDown(Key::Escape) => ctx.request_quit(),
            _ => {}
        }
    }

    fn advance(&mut self, _dt: f32, _ctx: &mut SceneContext) {}

    fn render(&self, frame: &mut Frame) {
        frame.fill(colors::BLACK);
        if let Some(background) = &self.background {
            frame.sprite(background, Vec2::ZERO);
        }

        frame.text_centered(
            Vec2::new(SCREEN_WIDTH / 2.0, SCREEN_HEIGHT / 2.0 - 50.0),
            TITLE,
            TITLE_COLOR,
        );

        let fill = if self.hovered {
            colors::BUTTON_HOVER
        } else {
            colors::BUTTON
        };
        frame.fill_rect(self.button, fill);
        frame.stroke_rect(self.button, colors::WHITE);
        frame.text_centered(self.button.center(), "START", colors::WHITE);

        frame.text_centered(
            Vec2::new(SCREEN_WIDTH / 2.0, SCREEN_HEIGHT - 40.0),
            "ENTER to start - ESC to quit",
            colors::GREY,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SceneCommand;
    use crate::event::MouseButton;

    fn ready() -> (MenuScene, SceneContext) {
        let mut ctx = SceneContext::default();
        ctx.assets = crate::assets::AssetLoader::new("does-not-exist");
        let mut menu = MenuScene::new();
        menu.initialize(&mut ctx);
        (menu, ctx)
    }

    #[test]
    fn test_button_layout() {
        let button = start_button();
        assert_eq!(button.pos, Vec2::new(300.0, 320.0));
        assert_eq!(button.size, BUTTON_SIZE);
    }

    #[test]
    fn test_hover_tracks_mouse() {
        let (mut menu, mut ctx) = ready();
        menu.handle_event(&GameEvent::MouseMove(Vec2::new(400.0, 350.0)), &mut ctx);
        assert!(menu.is_hovered());
        menu.handle_event(&GameEvent::MouseMove(Vec2::new(10.0, 10.0)), &mut ctx);
        assert!(!menu.is_hovered());
    }

    #[test]
    fn test_click_on_button_starts_intro() {
        let (mut menu, mut ctx) = ready();
        let click = GameEvent::MouseDown {
            button: MouseButton::Left,
            pos: Vec2::new(400.0, 350.0),
        };
        menu.handle_event(&click, &mut ctx);
        assert_eq!(ctx.take_commands(), vec![SceneCommand::Transition(SCENE_INTRO.into())]);
    }

    #[test]
    fn test_click_outside_or_right_click_ignored() {
        let (mut menu, mut ctx) = ready();
        menu.handle_event(
            &GameEvent::MouseDown {
                button: MouseButton::Left,
                pos: Vec2::new(50.0, 50.0),
            },
            &mut ctx,
        );
        menu.handle_event(
            &GameEvent::MouseDown {
                button: MouseButton::Right,
                pos: Vec2::new(400.0, 350.0),
            },
            &mut ctx,
        );
        assert!(!ctx.has_pending_commands());
    }

    #[test]
    fn test_secret_key_opens_dodger() {
        let (mut menu, mut ctx) = ready();
        menu.handle_event(&GameEvent::KeyDown(Key::Char('d')), &mut ctx);
        assert_eq!(ctx.take_commands(), vec![SceneCommand::Transition(SCENE_DODGER.into())]);
    }

    #[test]
    fn test_render_highlights_hovered_button() {
        let (mut menu, mut ctx) = ready();
        menu.handle_event(&GameEvent::MouseMove(Vec2::new(400.0, 350.0)), &mut ctx);
        let mut frame = Frame::new(0.0);
        menu.render(&mut frame);
        assert!(frame.commands().iter().any(|cmd| matches!(
            cmd,
            crate::renderer::DrawCmd::FillRect { color, .. } if *color == colors::BUTTON_HOVER
        )));
    }
}
