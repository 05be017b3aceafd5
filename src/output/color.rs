//! `--colors` specifications: `TYPE:ATTRIBUTE:VALUE` or `TYPE:none`.
use crate::error::{Result, SeekrError};
use colored::{Color, ColoredString, Colorize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub intense: bool,
}

impl Style {
    fn fg(color: Color) -> Self {
        Self {
            fg: Some(color),
            ..Default::default()
        }
    }

    pub fn paint(&self, text: &str) -> ColoredString {
        let mut painted = text.normal();
        if let Some(fg) = self.fg {
            painted = painted.color(if self.intense { brighten(fg) } else { fg });
        }
        if let Some(bg) = self.bg {
            painted = painted.on_color(bg);
        }
        if self.bold {
            painted = painted.bold();
        }
        painted
    }
}

fn brighten(color: Color) -> Color {
    match color {
        Color::Black => Color::BrightBlack,
        Color::Red => Color::BrightRed,
        Color::Green => Color::BrightGreen,
        Color::Yellow => Color::BrightYellow,
        Color::Blue => Color::BrightBlue,
        Color::Magenta => Color::BrightMagenta,
        Color::Cyan => Color::BrightCyan,
        Color::White => Color::BrightWhite,
        other => other,
    }
}

/// Styles of the four colored output elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSpecs {
    pub path: Style,
    pub line: Style,
    pub column: Style,
    pub matched: Style,
}

impl Default for ColorSpecs {
    fn default() -> Self {
        Self {
            path: Style::fg(Color::Magenta),
            line: Style::fg(Color::Green),
            column: Style::default(),
            matched: Style {
                bold: true,
                ..Style::fg(Color::Red)
            },
        }
    }
}

impl ColorSpecs {
    /// Applies `specs` in order on top of the defaults.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        let mut colors = Self::default();
        for spec in specs {
            colors.apply(spec.as_ref())?;
        }
        Ok(colors)
    }

    fn apply(&mut self, spec: &str) -> Result<()> {
        let invalid = |why: &str| SeekrError::Config(format!("invalid color spec '{spec}': {why}"));
        let parts: Vec<&str> = spec.split(':').collect();
        let style = match parts[0] {
            "path" => &mut self.path,
            "line" => &mut self.line,
            "column" => &mut self.column,
            "match" => &mut self.matched,
            _ => return Err(invalid("type must be path, line, column or match")),
        };
        match parts[1..] {
            ["none"] => *style = Style::default(),
            ["fg", value] => style.fg = Some(parse_color(value).ok_or_else(|| invalid("unknown color"))?),
            ["bg", value] => style.bg = Some(parse_color(value).ok_or_else(|| invalid("unknown color"))?),
            ["style", "bold"] => style.bold = true,
            ["style", "nobold"] => style.bold = false,
            ["style", "intense"] => style.intense = true,
            ["style", "nointense"] => style.intense = false,
            ["style", _] => return Err(invalid("style must be bold, nobold, intense or nointense")),
            _ => return Err(invalid("expected TYPE:fg|bg|style:VALUE or TYPE:none")),
        }
        Ok(())
    }
}

/// A color name, an ANSI 256-color number, or `R,G,B`.
fn parse_color(value: &str) -> Option<Color> {
    let named = match value {
        "black" => Some(Color::Black),
        "blue" => Some(Color::Blue),
        "green" => Some(Color::Green),
        "red" => Some(Color::Red),
        "cyan" => Some(Color::Cyan),
        "magenta" => Some(Color::Magenta),
        "yellow" => Some(Color::Yellow),
        "white" => Some(Color::White),
        _ => None,
    };
    if named.is_some() {
        return named;
    }
    if let Ok(n) = value.parse::<u8>() {
        return Some(Color::AnsiColor(n));
    }
    match value.split(',').map(str::parse::<u8>).collect::<Vec<_>>()[..] {
        [Ok(r), Ok(g), Ok(b)] => Some(Color::TrueColor { r, g, b }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let colors = ColorSpecs::default();
        assert_eq!(colors.path.fg, Some(Color::Magenta));
        assert_eq!(colors.line.fg, Some(Color::Green));
        assert!(colors.matched.bold);
        assert_eq!(colors.column, Style::default());
    }

    #[test]
    fn test_specs_apply_in_order() {
        let colors = ColorSpecs::parse(&[
            "match:fg:blue",
            "match:style:nobold",
            "path:none",
            "line:bg:17",
            "column:fg:255,128,0",
            "column:style:intense",
        ])
        .unwrap();
        assert_eq!(colors.matched.fg, Some(Color::Blue));
        assert!(!colors.matched.bold);
        assert_eq!(colors.path, Style::default());
        assert_eq!(colors.line.bg, Some(Color::AnsiColor(17)));
        assert_eq!(colors.line.fg, Some(Color::Green));
        assert_eq!(colors.column.fg, Some(Color::TrueColor { r: 255, g: 128, b: 0 }));
        assert!(colors.column.intense);
    }

    #[test]
    fn test_invalid_specs() {
        for spec in ["match", "file:fg:red", "match:fg:purple", "match:style:italic", "line:fg:1,2", "path:fg"] {
            let err = ColorSpecs::parse(&[spec]).unwrap_err();
            assert!(err.is_fatal(), "{spec}");
            assert!(err.to_string().contains(spec), "{spec}");
        }
    }

    #[test]
    fn test_paint_intense_uses_bright_colors() {
        colored::control::set_override(true);
        let style = Style {
            intense: true,
            ..Style::fg(Color::Red)
        };
        assert_eq!(style.paint("x").fgcolor, Some(Color::BrightRed));
        assert_eq!(Style::default().paint("x").to_string(), "x");
    }
}
