//! Turn a `TestBackend` buffer into an SVG picture of the terminal

use anstyle::{Ansi256Color, AnsiColor, Effects, RgbColor, Style};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::style::{Color, Modifier};

fn to_anstyle(color: Color) -> Option<anstyle::Color> {
    let ansi = |c: AnsiColor| Some(anstyle::Color::Ansi(c));
    match color {
        Color::Reset => None,
        Color::Black => ansi(AnsiColor::Black),
        Color::Red => ansi(AnsiColor::Red),
        Color::Green => ansi(AnsiColor::Green),
        Color::Yellow => ansi(AnsiColor::Yellow),
        Color::Blue => ansi(AnsiColor::Blue),
        Color::Magenta => ansi(AnsiColor::Magenta),
        Color::Cyan => ansi(AnsiColor::Cyan),
        Color::Gray => ansi(AnsiColor::White),
        Color::DarkGray => ansi(AnsiColor::BrightBlack),
        Color::LightRed => ansi(AnsiColor::BrightRed),
        Color::LightGreen => ansi(AnsiColor::BrightGreen),
        Color::LightYellow => ansi(AnsiColor::BrightYellow),
        Color::LightBlue => ansi(AnsiColor::BrightBlue),
        Color::LightMagenta => ansi(AnsiColor::BrightMagenta),
        Color::LightCyan => ansi(AnsiColor::BrightCyan),
        Color::White => ansi(AnsiColor::BrightWhite),
        Color::Rgb(r, g, b) => Some(anstyle::Color::Rgb(RgbColor(r, g, b))),
        Color::Indexed(i) => Some(anstyle::Color::Ansi256(Ansi256Color(i))),
    }
}

fn to_effects(modifier: Modifier) -> Effects {
    let mut effects = Effects::new();
    if modifier.contains(Modifier::BOLD) {
        effects = effects | Effects::BOLD;
    }
    if modifier.contains(Modifier::DIM) {
        effects = effects | Effects::DIMMED;
    }
    if modifier.contains(Modifier::ITALIC) {
        effects = effects | Effects::ITALIC;
    }
    if modifier.contains(Modifier::UNDERLINED) {
        effects = effects | Effects::UNDERLINE;
    }
    if modifier.contains(Modifier::REVERSED) {
        effects = effects | Effects::INVERT;
    }
    if modifier.contains(Modifier::CROSSED_OUT) {
        effects = effects | Effects::STRIKETHROUGH;
    }
    effects
}

/// The buffer as ANSI-styled text, one line per terminal row
pub fn terminal_to_ansi(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let area = buffer.area;
    let mut out = String::new();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            let cell = &buffer[(x, y)];
            if cell.skip {
                continue;
            }
            let style = Style::new()
                .fg_color(to_anstyle(cell.fg))
                .bg_color(to_anstyle(cell.bg))
                .effects(to_effects(cell.modifier));
            out.push_str(&format!("{}{}{}", style.render(), cell.symbol(), style.render_reset()));
        }
        out.push('\n');
    }
    out
}

pub fn terminal_to_svg(terminal: &Terminal<TestBackend>) -> String {
    anstyle_svg::Term::new().render_svg(&terminal_to_ansi(terminal))
}
