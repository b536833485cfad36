//! Consumer-side interfaces: turtle graphics, the text stream, and the host
//! scheduler. The core calls these and never renders anything itself.
//!
//! Any method here is allowed to suspend internally (animate, pump an event
//! loop, block on input) before returning; the interpreter treats every call
//! as a potential suspension point.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use strum::{AsRefStr, EnumString};

use crate::value::format_number;

/// Pen composition mode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PenMode {
    #[default]
    Paint,
    Erase,
    Reverse,
}

/// How the turtle treats the field boundary.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TurtleMode {
    #[default]
    Wrap,
    Window,
    Fence,
}

/// Turtle graphics backend. Headings are degrees clockwise from north.
pub trait Turtle {
    fn move_by(&mut self, distance: f64);
    fn turn(&mut self, degrees: f64);
    /// Either coordinate may be absent: keep the current one.
    fn set_position(&mut self, x: Option<f64>, y: Option<f64>);
    fn position(&self) -> (f64, f64);
    fn set_heading(&mut self, degrees: f64);
    fn heading(&self) -> f64;
    fn home(&mut self);
    fn arc(&mut self, angle: f64, radius: f64);
    fn towards(&self, x: f64, y: f64) -> f64;
    fn show(&mut self);
    fn hide(&mut self);
    fn visible(&self) -> bool;
    fn clear(&mut self);
    fn clear_screen(&mut self);
    fn set_mode(&mut self, mode: TurtleMode);
    fn mode(&self) -> TurtleMode;
    fn fill(&mut self);
    fn begin_path(&mut self);
    fn fill_path(&mut self, color: &str);
    fn draw_text(&mut self, text: &str);
    fn set_font_size(&mut self, size: f64);
    fn font_size(&self) -> f64;
    fn set_font_name(&mut self, name: &str);
    fn font_name(&self) -> String;
    fn pen_down(&mut self);
    fn pen_up(&mut self);
    fn is_pen_down(&self) -> bool;
    fn set_pen_mode(&mut self, mode: PenMode);
    fn pen_mode(&self) -> PenMode;
    fn set_pen_color(&mut self, color: &str);
    fn pen_color(&self) -> String;
    fn set_bg_color(&mut self, color: &str);
    fn bg_color(&self) -> String;
    fn set_pen_width(&mut self, width: f64);
    fn pen_width(&self) -> f64;
    fn set_scrunch(&mut self, sx: f64, sy: f64);
    fn scrunch(&self) -> (f64, f64);
}

/// The textual console.
pub trait TextStream {
    /// Append text (no newline is added).
    fn write(&mut self, text: &str);
    /// Read one word/line, optionally after printing a prompt. May block.
    fn read(&mut self, prompt: Option<&str>) -> String;
    fn clear(&mut self);
}

/// Host scheduler hooks: the cooperative yield points of the driver.
pub trait Host {
    /// Called between statements and loop iterations.
    fn yield_now(&mut self) {}
    /// `WAIT` delay, in sixtieths of a second.
    fn wait(&mut self, _sixtieths: f64) {}
}

/// Host that never suspends.
#[derive(Default)]
pub struct NullHost;

impl Host for NullHost {}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// In-memory turtle that records every call and tracks enough geometry for
/// `POS` / `HEADING` / `TOWARDS` to answer truthfully.
pub struct RecordingTurtle {
    log: Rc<RefCell<Vec<String>>>,
    x: f64,
    y: f64,
    heading_deg: f64,
    visible: bool,
    pen: bool,
    pen_mode: PenMode,
    mode: TurtleMode,
    pen_color: String,
    bg_color: String,
    width: f64,
    font_size: f64,
    font_name: String,
    sx: f64,
    sy: f64,
}

impl Default for RecordingTurtle {
    fn default() -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
            x: 0.0,
            y: 0.0,
            heading_deg: 0.0,
            visible: true,
            pen: true,
            pen_mode: PenMode::Paint,
            mode: TurtleMode::Wrap,
            pen_color: "black".to_string(),
            bg_color: "white".to_string(),
            width: 1.0,
            font_size: 14.0,
            font_name: "sans-serif".to_string(),
            sx: 1.0,
            sy: 1.0,
        }
    }
}

impl RecordingTurtle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the call log; stays valid after the turtle is boxed.
    pub fn log(&self) -> Rc<RefCell<Vec<String>>> {
        self.log.clone()
    }

    fn record(&self, entry: String) {
        self.log.borrow_mut().push(entry);
    }
}

impl Turtle for RecordingTurtle {
    fn move_by(&mut self, distance: f64) {
        let rad = self.heading_deg.to_radians();
        self.x += distance * rad.sin();
        self.y += distance * rad.cos();
        self.record(format!("move({})", format_number(distance)));
    }

    fn turn(&mut self, degrees: f64) {
        self.heading_deg = (self.heading_deg + degrees).rem_euclid(360.0);
        self.record(format!("turn({})", format_number(degrees)));
    }

    fn set_position(&mut self, x: Option<f64>, y: Option<f64>) {
        if let Some(x) = x {
            self.x = x;
        }
        if let Some(y) = y {
            self.y = y;
        }
        self.record(format!(
            "setposition({}, {})",
            x.map(format_number).unwrap_or_default(),
            y.map(format_number).unwrap_or_default()
        ));
    }

    fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    fn set_heading(&mut self, degrees: f64) {
        self.heading_deg = degrees.rem_euclid(360.0);
        self.record(format!("setheading({})", format_number(degrees)));
    }

    fn heading(&self) -> f64 {
        self.heading_deg
    }

    fn home(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
        self.heading_deg = 0.0;
        self.record("home".to_string());
    }

    fn arc(&mut self, angle: f64, radius: f64) {
        self.record(format!(
            "arc({}, {})",
            format_number(angle),
            format_number(radius)
        ));
    }

    fn towards(&self, x: f64, y: f64) -> f64 {
        (x - self.x).atan2(y - self.y).to_degrees().rem_euclid(360.0)
    }

    fn show(&mut self) {
        self.visible = true;
        self.record("showturtle".to_string());
    }

    fn hide(&mut self) {
        self.visible = false;
        self.record("hideturtle".to_string());
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn clear(&mut self) {
        self.record("clear".to_string());
    }

    fn clear_screen(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
        self.heading_deg = 0.0;
        self.record("clearscreen".to_string());
    }

    fn set_mode(&mut self, mode: TurtleMode) {
        self.mode = mode;
        self.record(format!("setturtlemode({})", mode.as_ref()));
    }

    fn mode(&self) -> TurtleMode {
        self.mode
    }

    fn fill(&mut self) {
        self.record("fill".to_string());
    }

    fn begin_path(&mut self) {
        self.record("beginpath".to_string());
    }

    fn fill_path(&mut self, color: &str) {
        self.record(format!("fillpath({color})"));
    }

    fn draw_text(&mut self, text: &str) {
        self.record(format!("drawtext({text})"));
    }

    fn set_font_size(&mut self, size: f64) {
        self.font_size = size;
    }

    fn font_size(&self) -> f64 {
        self.font_size
    }

    fn set_font_name(&mut self, name: &str) {
        self.font_name = name.to_string();
    }

    fn font_name(&self) -> String {
        self.font_name.clone()
    }

    fn pen_down(&mut self) {
        self.pen = true;
        self.record("pendown".to_string());
    }

    fn pen_up(&mut self) {
        self.pen = false;
        self.record("penup".to_string());
    }

    fn is_pen_down(&self) -> bool {
        self.pen
    }

    fn set_pen_mode(&mut self, mode: PenMode) {
        self.pen_mode = mode;
        self.record(format!("setpenmode({})", mode.as_ref()));
    }

    fn pen_mode(&self) -> PenMode {
        self.pen_mode
    }

    fn set_pen_color(&mut self, color: &str) {
        self.pen_color = color.to_string();
        self.record(format!("setcolor({color})"));
    }

    fn pen_color(&self) -> String {
        self.pen_color.clone()
    }

    fn set_bg_color(&mut self, color: &str) {
        self.bg_color = color.to_string();
        self.record(format!("setbgcolor({color})"));
    }

    fn bg_color(&self) -> String {
        self.bg_color.clone()
    }

    fn set_pen_width(&mut self, width: f64) {
        self.width = width;
        self.record(format!("setwidth({})", format_number(width)));
    }

    fn pen_width(&self) -> f64 {
        self.width
    }

    fn set_scrunch(&mut self, sx: f64, sy: f64) {
        self.sx = sx;
        self.sy = sy;
        self.record(format!(
            "setscrunch({}, {})",
            format_number(sx),
            format_number(sy)
        ));
    }

    fn scrunch(&self) -> (f64, f64) {
        (self.sx, self.sy)
    }
}

/// Stream that accumulates writes into a shared buffer and answers reads
/// from a scripted queue.
#[derive(Default)]
pub struct BufferStream {
    out: Rc<RefCell<String>>,
    reads: VecDeque<String>,
}

impl BufferStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the accumulated output.
    pub fn buffer(&self) -> Rc<RefCell<String>> {
        self.out.clone()
    }

    /// Queue a line for a future `read`.
    pub fn push_read(&mut self, line: impl Into<String>) {
        self.reads.push_back(line.into());
    }
}

impl TextStream for BufferStream {
    fn write(&mut self, text: &str) {
        self.out.borrow_mut().push_str(text);
    }

    fn read(&mut self, prompt: Option<&str>) -> String {
        if let Some(prompt) = prompt {
            self.write(prompt);
        }
        self.reads.pop_front().unwrap_or_default()
    }

    fn clear(&mut self) {
        self.out.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_enums_parse_case_insensitively() {
        assert_eq!("wrap".parse::<TurtleMode>().unwrap(), TurtleMode::Wrap);
        assert_eq!("FENCE".parse::<TurtleMode>().unwrap(), TurtleMode::Fence);
        assert_eq!("Reverse".parse::<PenMode>().unwrap(), PenMode::Reverse);
        assert!("dotted".parse::<PenMode>().is_err());
        assert_eq!(PenMode::Paint.as_ref(), "paint");
    }

    #[test]
    fn recording_turtle_tracks_geometry() {
        let mut t = RecordingTurtle::new();
        t.set_heading(90.0);
        t.move_by(10.0);
        let (x, y) = t.position();
        assert!((x - 10.0).abs() < 1e-9);
        assert!(y.abs() < 1e-9);
        assert!((t.towards(20.0, 10.0) - 45.0).abs() < 1e-9);
        t.home();
        assert_eq!(t.position(), (0.0, 0.0));
    }

    #[test]
    fn buffer_stream_scripts_reads() {
        let mut s = BufferStream::new();
        s.push_read("hello");
        assert_eq!(s.read(Some("? ")), "hello");
        assert_eq!(&*s.buffer().borrow(), "? ");
        assert_eq!(s.read(None), "");
    }
}
