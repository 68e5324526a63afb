use colored::Color;

pub const PRIMARY: Color = Color::BrightGreen;
pub const ACCENT: Color = Color::BrightCyan;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const LATENCY: Color = Color::Yellow;
pub const LOSS: Color = Color::Magenta;
pub const RANGE: Color = Color::BrightBlue;
