use crate::browser;
use anyhow::{anyhow, bail, Result};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::f64::consts::TAU;
use std::fmt;
use std::rc::Rc;
use web_sys::CanvasRenderingContext2d;

use self::input::InputEvent;

/// TABLE
/// ┌──────────────────────── Frame Lifecycle ────────────────────────┐
/// │                                                                 │
/// │  requestAnimationFrame(perf)                                    │
/// │        │                                                        │
/// │        ├─► delta = perf - last_frame                            │
/// │        ├─► drain queued InputEvents ──► Game::handle_input()    │
/// │        ├─► Renderer::clear()                                    │
/// │        ├─► Game::update(delta) ──► LoopControl                  │
/// │        ├─► Game::draw(&Renderer)                                │
/// │        └─► Continue ? request next frame : halt scheduling      │
/// │                                                                 │
/// │  input listener ──► queue event ──► wake loop if halted         │
/// └─────────────────────────────────────────────────────────────────┘
#[async_trait(?Send)]
pub trait Game {
    /// Consumes a loading placeholder and yields the playable game
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    /// Applied at the tick boundary, before `update`
    fn handle_input(&mut self, event: &InputEvent);
    fn update(&mut self, delta_ms: f64) -> LoopControl;
    fn draw(&self, canvas: &dyn Canvas);
}

/// What the game wants from the scheduler after a tick
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Halt,
}

pub struct GameLoop {
    last_frame: f64,
    scheduled: bool,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

/// Handle held by input listeners so an event can restart a halted loop
#[derive(Clone)]
pub struct LoopWaker {
    state: Rc<RefCell<GameLoop>>,
    frame: SharedLoopClosure,
}

impl LoopWaker {
    pub fn wake(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.scheduled {
            return Ok(());
        }
        // resuming after idle : don't let the idle time leak into delta
        state.last_frame = browser::now()?;
        let frame = self.frame.borrow();
        let closure = frame
            .as_ref()
            .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?;
        browser::request_animation_frame(closure)?;
        state.scheduled = true;
        Ok(())
    }
}

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut game = game.initialize().await?;
        let canvas = browser::canvas()?;
        let renderer = Renderer {
            // moving this outside of request_animation_frame closure no longer
            // requires us to use the expect() syntax ... nice
            context: browser::context()?,
            bounds: Rect::new_from_x_y(0.0, 0.0, canvas.width().into(), canvas.height().into()),
        };
        let (sender, mut receiver) = input::channel();

        let state = Rc::new(RefCell::new(GameLoop {
            last_frame: browser::now()?,
            scheduled: false,
        }));
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        let loop_state = state.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            let mut game_loop = loop_state.borrow_mut();
            let delta = perf - game_loop.last_frame;
            game_loop.last_frame = perf;

            for event in receiver.drain() {
                game.handle_input(&event);
            }

            renderer.clear(&renderer.bounds);
            let control = game.update(delta);
            game.draw(&renderer);

            game_loop.scheduled = false;
            if control == LoopControl::Continue {
                match f.borrow().as_ref() {
                    Some(closure) => match browser::request_animation_frame(closure) {
                        Ok(_) => game_loop.scheduled = true,
                        Err(err) => log::error!("GameLoop: could not schedule frame : {:#}", err),
                    },
                    None => log::error!("GameLoop: Loop is None"),
                }
            }
        }));

        let waker = LoopWaker { state, frame: g };
        input::prepare_input(&canvas, sender, waker.clone())?;
        waker.wake()
    }
}

// ==================== Geometry ====================
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Axis aligned box, origin top left (canvas coordinates)
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    pub fn new_from_x_y(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect::new(Point { x, y }, Size { width, height })
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    pub fn right(&self) -> f64 {
        self.x() + self.width()
    }

    pub fn bottom(&self) -> f64 {
        self.y() + self.height()
    }

    /// Strict overlap on both axes, touching edges don't count
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x() < other.right()
            && self.right() > other.x()
            && self.y() < other.bottom()
            && self.bottom() > other.y()
    }

    /// Shrinks the box by `margin` on every side
    pub fn inset(&self, margin: f64) -> Rect {
        Rect::new_from_x_y(
            self.x() + margin,
            self.y() + margin,
            self.width() - margin * 2.0,
            self.height() - margin * 2.0,
        )
    }

    /// `other` lies inside `self` without touching any edge
    pub fn strictly_contains(&self, other: &Rect) -> bool {
        other.x() > self.x()
            && other.y() > self.y()
            && other.right() < self.right()
            && other.bottom() < self.bottom()
    }
}

// ==================== Color ====================
/// Opaque RGB color, (de)serialized as "#rrggbb"
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("Expected a color like '#rrggbb', got '{}'", hex);
        }
        let value = u32::from_str_radix(digits, 16)
            .map_err(|err| anyhow!("Invalid hex color '{}' : {}", hex, err))?;
        Ok(Color::rgb(
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        ))
    }

    /// Component-wise linear blend, `t` = 0 is self, `t` = 1 is `other`.
    /// Components are floored like the canvas `rgb()` blend the game always used.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f64::from(a) * (1.0 - t) + f64::from(b) * t).floor() as u8;
        Color::rgb(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    pub fn to_css(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

// ==================== Rendering ====================
/// Drawing primitives the game needs from a 2D surface.
/// Keeps sprites and simulation testable without a browser.
pub trait Canvas {
    fn clear(&self, rect: &Rect);
    fn fill_rect(&self, rect: &Rect, color: Color);
    fn fill_circle(&self, center: Point, radius: f64, color: Color);
    fn fill_ellipse(&self, center: Point, radii: Size, color: Color);
    fn fill_polygon(&self, points: &[Point], color: Color);
    fn stroke_polyline(&self, points: &[Point], color: Color, line_width: f64);
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
    bounds: Rect,
}

impl Renderer {
    fn trace_path(&self, points: &[Point]) -> bool {
        let Some((first, rest)) = points.split_first() else {
            return false;
        };
        self.context.begin_path();
        self.context.move_to(first.x, first.y);
        for point in rest {
            self.context.line_to(point.x, point.y);
        }
        true
    }
}

impl Canvas for Renderer {
    fn clear(&self, rect: &Rect) {
        self.context
            .clear_rect(rect.x(), rect.y(), rect.width(), rect.height());
    }

    fn fill_rect(&self, rect: &Rect, color: Color) {
        self.context.set_fill_style_str(&color.to_css());
        self.context
            .fill_rect(rect.x(), rect.y(), rect.width(), rect.height());
    }

    fn fill_circle(&self, center: Point, radius: f64, color: Color) {
        self.context.set_fill_style_str(&color.to_css());
        self.context.begin_path();
        match self.context.arc(center.x, center.y, radius, 0.0, TAU) {
            Ok(()) => self.context.fill(),
            Err(err) => log::warn!("Renderer: arc failed : {:#?}", err),
        }
    }

    fn fill_ellipse(&self, center: Point, radii: Size, color: Color) {
        self.context.set_fill_style_str(&color.to_css());
        self.context.begin_path();
        match self
            .context
            .ellipse(center.x, center.y, radii.width, radii.height, 0.0, 0.0, TAU)
        {
            Ok(()) => self.context.fill(),
            Err(err) => log::warn!("Renderer: ellipse failed : {:#?}", err),
        }
    }

    fn fill_polygon(&self, points: &[Point], color: Color) {
        if self.trace_path(points) {
            self.context.set_fill_style_str(&color.to_css());
            self.context.fill();
        }
    }

    fn stroke_polyline(&self, points: &[Point], color: Color, line_width: f64) {
        if self.trace_path(points) {
            self.context.set_stroke_style_str(&color.to_css());
            self.context.set_line_width(line_width);
            self.context.stroke();
        }
    }
}

// ==================== Input ====================
pub mod input {
    use super::LoopWaker;
    use crate::browser;
    use anyhow::Result;
    use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
    use web_sys::{HtmlCanvasElement, KeyboardEvent, TouchEvent};

    /// Host input, already stripped of DOM types
    #[derive(Debug, Clone, PartialEq)]
    pub enum InputEvent {
        /// `KeyboardEvent.code`, e.g. "ArrowUp"
        KeyDown(String),
        KeyUp(String),
        /// y relative to the canvas top
        TouchStart { y: f64 },
        TouchEnd,
        /// start / play again button
        Button,
    }

    pub struct InputSender(UnboundedSender<InputEvent>);

    pub struct InputReceiver(UnboundedReceiver<InputEvent>);

    pub fn channel() -> (InputSender, InputReceiver) {
        let (tx, rx) = unbounded();
        (InputSender(tx), InputReceiver(rx))
    }

    impl InputSender {
        pub fn send(&self, event: InputEvent) {
            // receiver lives inside the frame closure, which is never dropped
            if let Err(err) = self.0.unbounded_send(event) {
                log::warn!("Input: dropped event, loop is gone : {}", err);
            }
        }
    }

    impl InputReceiver {
        /// Everything queued since the last tick, oldest first
        pub fn drain(&mut self) -> Vec<InputEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.0.try_recv() {
                events.push(event);
            }
            events
        }
    }

    /// Hooks keyboard, touch and button listeners into the queue.
    /// Every event also wakes the loop in case it halted on game over.
    pub fn prepare_input(
        canvas: &HtmlCanvasElement,
        sender: InputSender,
        waker: LoopWaker,
    ) -> Result<()> {
        let sender = std::rc::Rc::new(sender);
        let dispatch = move |event: InputEvent| {
            sender.send(event);
            if let Err(err) = waker.wake() {
                log::error!("Input: could not wake game loop : {:#}", err);
            }
        };

        let document = browser::document()?;
        let on_key_down = dispatch.clone();
        browser::add_listener(&document, "keydown", move |event: KeyboardEvent| {
            on_key_down(InputEvent::KeyDown(event.code()));
        })?;

        let on_key_up = dispatch.clone();
        browser::add_listener(&document, "keyup", move |event: KeyboardEvent| {
            on_key_up(InputEvent::KeyUp(event.code()));
        })?;

        let on_touch_start = dispatch.clone();
        let touch_canvas = canvas.clone();
        browser::add_listener(canvas, "touchstart", move |event: TouchEvent| {
            event.prevent_default();
            let top = touch_canvas.get_bounding_client_rect().top();
            let y = event
                .touches()
                .get(0)
                .map(|touch| f64::from(touch.client_y()) - top)
                .unwrap_or_default();
            on_touch_start(InputEvent::TouchStart { y });
        })?;

        let on_touch_end = dispatch.clone();
        browser::add_listener(canvas, "touchend", move |event: TouchEvent| {
            event.prevent_default();
            on_touch_end(InputEvent::TouchEnd);
        })?;

        let on_button = dispatch;
        let button = browser::element_by_id(browser::html::RESTART_BUTTON_ID)?;
        browser::add_listener(
            &button,
            "click",
            move |_event: web_sys::Event| on_button(InputEvent::Button),
        )?;

        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn drain_returns_events_in_arrival_order_and_empties_queue() {
            let (sender, mut receiver) = channel();
            sender.send(InputEvent::KeyDown("ArrowDown".into()));
            sender.send(InputEvent::KeyDown("ArrowUp".into()));
            sender.send(InputEvent::TouchEnd);

            assert_eq!(
                receiver.drain(),
                vec![
                    InputEvent::KeyDown("ArrowDown".into()),
                    InputEvent::KeyDown("ArrowUp".into()),
                    InputEvent::TouchEnd,
                ]
            );
            assert!(receiver.drain().is_empty());
        }
    }
}

// ==================== Test Support ====================
/// Canvas that records calls instead of drawing
#[cfg(test)]
pub(crate) mod recording {
    use super::{Canvas, Color, Point, Rect, Size};
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    pub enum DrawCall {
        Clear(Rect),
        Rect(Rect, Color),
        Circle(Point, f64, Color),
        Ellipse(Point, Size, Color),
        Polygon(Vec<Point>, Color),
        Polyline(Vec<Point>, Color, f64),
    }

    #[derive(Default)]
    pub struct RecordingCanvas {
        pub calls: RefCell<Vec<DrawCall>>,
    }

    impl RecordingCanvas {
        pub fn calls(&self) -> Vec<DrawCall> {
            self.calls.borrow().clone()
        }
    }

    impl Canvas for RecordingCanvas {
        fn clear(&self, rect: &Rect) {
            self.calls.borrow_mut().push(DrawCall::Clear(*rect));
        }

        fn fill_rect(&self, rect: &Rect, color: Color) {
            self.calls.borrow_mut().push(DrawCall::Rect(*rect, color));
        }

        fn fill_circle(&self, center: Point, radius: f64, color: Color) {
            self.calls
                .borrow_mut()
                .push(DrawCall::Circle(center, radius, color));
        }

        fn fill_ellipse(&self, center: Point, radii: Size, color: Color) {
            self.calls
                .borrow_mut()
                .push(DrawCall::Ellipse(center, radii, color));
        }

        fn fill_polygon(&self, points: &[Point], color: Color) {
            self.calls
                .borrow_mut()
                .push(DrawCall::Polygon(points.to_vec(), color));
        }

        fn stroke_polyline(&self, points: &[Point], color: Color, line_width: f64) {
            self.calls
                .borrow_mut()
                .push(DrawCall::Polyline(points.to_vec(), color, line_width));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rects_apart_on_both_axes_do_not_intersect() {
        let a = Rect::new_from_x_y(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new_from_x_y(20.0, 20.0, 5.0, 5.0);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn contained_rect_intersects() {
        let outer = Rect::new_from_x_y(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new_from_x_y(10.0, 10.0, 5.0, 5.0);
        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
        assert!(outer.strictly_contains(&inner));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new_from_x_y(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new_from_x_y(10.0, 0.0, 10.0, 10.0);
        let below = Rect::new_from_x_y(0.0, 10.0, 10.0, 10.0);
        assert!(!a.intersects(&right));
        assert!(!a.intersects(&below));
    }

    #[test]
    fn inset_shrinks_every_side() {
        let rect = Rect::new_from_x_y(100.0, 200.0, 30.0, 50.0);
        let inset = rect.inset(5.0);
        assert_eq!(inset, Rect::new_from_x_y(105.0, 205.0, 20.0, 40.0));
        assert!(rect.strictly_contains(&inset));
    }

    #[test]
    fn hex_colors_parse_with_or_without_hash() {
        assert_eq!(Color::from_hex("#1a472a").unwrap(), Color::rgb(0x1a, 0x47, 0x2a));
        assert_eq!(Color::from_hex("00ffaa").unwrap(), Color::rgb(0, 255, 170));
        assert!(Color::from_hex("#fff").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
    }

    #[test]
    fn color_lerp_floors_each_component() {
        let from = Color::rgb(0, 100, 255);
        let to = Color::rgb(255, 0, 0);
        assert_eq!(from.lerp(to, 0.0), from);
        assert_eq!(from.lerp(to, 1.0), to);
        assert_eq!(from.lerp(to, 0.5), Color::rgb(127, 50, 127));
    }

    #[test]
    fn color_serializes_as_hex_string() {
        let color = Color::rgb(0x8b, 0x45, 0x13);
        assert_eq!(String::from(color), "#8b4513");
        assert_eq!(color.to_css(), "rgb(139, 69, 19)");
    }
}
