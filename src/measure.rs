//! Text measurement for auto-sizing nodes.
//!
//! The controller only sees [`TextMeasure`]; the browser shell plugs in a
//! canvas-backed implementation and tests use [`MonospaceMeasure`].

/// Horizontal padding inside a node, on each side.
pub const TEXT_PADDING_X: f64 = 12.0;
/// Vertical padding inside a node, top and bottom.
pub const TEXT_PADDING_Y: f64 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    pub family: String,
    pub size: f64,
    pub line_height: f64,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: "system-ui, sans-serif".to_string(),
            size: 14.0,
            line_height: 20.0,
        }
    }
}

impl Font {
    /// CSS shorthand for `CanvasRenderingContext2d::set_font`.
    pub fn css(&self) -> String {
        format!("{}px {}", self.size, self.family)
    }
}

pub trait TextMeasure {
    /// Width of a single line with no wrapping.
    fn line_width(&self, line: &str, font: &Font) -> f64;

    /// Size of the text block wrapped to `max_width`, padding excluded.
    /// The width is that of the longest wrapped line.
    fn measure(&self, text: &str, font: &Font, max_width: f64) -> (f64, f64) {
        let lines = wrap_lines(text, max_width, |s| self.line_width(s, font));
        let width = lines
            .iter()
            .map(|l| self.line_width(l, font))
            .fold(0.0, f64::max);
        (width, lines.len() as f64 * font.line_height)
    }
}

/// Greedy word wrap. Explicit newlines always break; a single word wider
/// than `max_width` gets its own line rather than being split.
pub fn wrap_lines(text: &str, max_width: f64, measure_width: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{} {}", current, word);
            if measure_width(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

/// Fixed advance per character. Deterministic, for tests and non-canvas hosts.
#[derive(Clone, Copy, Debug)]
pub struct MonospaceMeasure {
    pub char_width_ratio: f64,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self {
            char_width_ratio: 0.6,
        }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn line_width(&self, line: &str, font: &Font) -> f64 {
        line.chars().count() as f64 * font.size * self.char_width_ratio
    }
}
