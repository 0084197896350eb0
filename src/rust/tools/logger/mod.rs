#[cfg(feature = "cli")]
use crossterm::style::{Attribute, Color, ResetColor, SetAttribute, SetForegroundColor};
#[cfg(feature = "cli")]
use std::fmt::Write;
use std::rc::Rc;

use crate::shared::diagnostics::{DiagnosticEvent, DiagnosticLevel, DiagnosticsEcho};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Success,
    Error,
    Info,
    Warning,
    Debug,
    Action,
}

impl From<DiagnosticLevel> for LogLevel {
    fn from(level: DiagnosticLevel) -> Self {
        match level {
            DiagnosticLevel::Info => LogLevel::Info,
            DiagnosticLevel::Warn => LogLevel::Warning,
            DiagnosticLevel::Error => LogLevel::Error,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Self
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        self.print_line(level, message.as_ref());
    }

    pub fn log_with_details<I, S>(&self, level: LogLevel, message: impl AsRef<str>, details: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.print_line(level, message.as_ref());
        for detail in details {
            self.print_detail(detail.as_ref());
        }
    }

    /// One diagnostics event: `[CATEGORY] message`, with its data as a detail line
    pub fn log_event(&self, event: &DiagnosticEvent) {
        let message = format!("[{}] {}", event.category, event.message);
        match &event.data {
            Some(data) => self.log_with_details(event.level.into(), message, [data.to_string()]),
            None => self.log(event.level.into(), message),
        }
    }

    /// Diagnostics echo that prints through this logger
    pub fn echo(&self) -> DiagnosticsEcho {
        let logger = self.clone();
        Rc::new(move |event: &DiagnosticEvent| logger.log_event(event))
    }

    pub fn success(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Success, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn action(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Action, message);
    }

    fn print_detail(&self, detail: &str) {
        #[cfg(feature = "cli")]
        {
            println!("   ↳ {}", detail);
        }
        #[cfg(not(feature = "cli"))]
        {
            println!("   -> {}", detail);
        }
    }

    fn print_line(&self, level: LogLevel, message: &str) {
        #[cfg(feature = "cli")]
        {
            println!("{}", self.render_colored_line(level, message));
        }
        #[cfg(not(feature = "cli"))]
        {
            println!("[{}] {}", level.as_label(), message);
        }
    }

    #[cfg(feature = "cli")]
    fn render_colored_line(&self, level: LogLevel, message: &str) -> String {
        let mut out = String::new();
        let (emoji, color) = level.visuals();

        out.push_str(emoji);
        out.push(' ');
        out.push_str(&self.render_signature());
        out.push(' ');
        out.push_str(&self.render_status(level, color));
        out.push(' ');
        out.push_str(message);
        out
    }

    #[cfg(feature = "cli")]
    fn render_signature(&self) -> String {
        let mut s = String::new();
        let _ = write!(&mut s, "{}", SetForegroundColor(Color::Grey));
        s.push('[');
        let _ = write!(
            &mut s,
            "{}{}",
            SetForegroundColor(Color::Rgb {
                r: 232,
                g: 163,
                b: 61,
            }),
            SetAttribute(Attribute::Bold)
        );
        s.push_str("Strumkit");
        let _ = write!(
            &mut s,
            "{}{}",
            SetAttribute(Attribute::Reset),
            SetForegroundColor(Color::Grey)
        );
        s.push(']');
        let _ = write!(&mut s, "{}", ResetColor);
        s
    }

    #[cfg(feature = "cli")]
    fn render_status(&self, level: LogLevel, color: Color) -> String {
        let mut s = String::new();
        let _ = write!(
            &mut s,
            "{}{}",
            SetForegroundColor(color),
            SetAttribute(Attribute::Bold)
        );
        s.push('[');
        s.push_str(level.as_label());
        s.push(']');
        let _ = write!(&mut s, "{}{}", SetAttribute(Attribute::Reset), ResetColor);
        s
    }
}

impl LogLevel {
    pub fn as_label(self) -> &'static str {
        match self {
            LogLevel::Success => "SUCCESS",
            LogLevel::Error => "ERROR",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Debug => "DEBUG",
            LogLevel::Action => "ACTION",
        }
    }

    #[cfg(feature = "cli")]
    fn visuals(self) -> (&'static str, Color) {
        match self {
            LogLevel::Success => (
                "✅",
                Color::Rgb {
                    r: 76,
                    g: 175,
                    b: 80,
                },
            ),
            LogLevel::Error => (
                "❌",
                Color::Rgb {
                    r: 244,
                    g: 67,
                    b: 54,
                },
            ),
            LogLevel::Info => (
                "ℹ️ ",
                Color::Rgb {
                    r: 33,
                    g: 150,
                    b: 243,
                },
            ),
            LogLevel::Warning => (
                "⚠️",
                Color::Rgb {
                    r: 255,
                    g: 152,
                    b: 0,
                },
            ),
            LogLevel::Debug => (
                "🛠️",
                Color::Rgb {
                    r: 121,
                    g: 134,
                    b: 203,
                },
            ),
            LogLevel::Action => (
                "🎸",
                Color::Rgb {
                    r: 0,
                    g: 188,
                    b: 212,
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_levels_map_to_log_levels() {
        assert_eq!(LogLevel::from(DiagnosticLevel::Info), LogLevel::Info);
        assert_eq!(LogLevel::from(DiagnosticLevel::Warn), LogLevel::Warning);
        assert_eq!(LogLevel::from(DiagnosticLevel::Error).as_label(), "ERROR");
    }
}
