use colored::*;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warn,
    Error,
    Debug,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Debug => "debug",
        }
    }

    /// Tag printed in front of text messages.
    fn tag(self) -> &'static str {
        match self {
            Level::Info => "forged",
            Level::Success => "success",
            Level::Warn => "warning",
            Level::Error => "error",
            Level::Debug => "debug",
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Level::Error | Level::Warn)
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    pub format: OutputFormat,
    pub color: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
        }
    }
}

static RENDERER: RwLock<Renderer> = RwLock::new(Renderer {
    format: OutputFormat::Text,
    color: true,
});

// Global debug state
static DEBUG_MODE: AtomicBool = AtomicBool::new(false);

pub fn set_debug_mode(enabled: bool) {
    DEBUG_MODE.store(enabled, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

pub fn init(format: OutputFormat, color: bool) {
    if let Ok(mut r) = RENDERER.write() {
        r.format = format;
        r.color = color;
    }
}

fn renderer() -> Renderer {
    RENDERER.read().map(|r| r.clone()).unwrap_or_default()
}

#[derive(Serialize)]
struct Event<'a> {
    level: &'a str,
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

fn colorize(level: Level, s: &str, enable: bool) -> String {
    if !enable {
        return s.to_string();
    }
    match level {
        Level::Info => s.magenta().bold().to_string(),
        Level::Success => s.green().bold().to_string(),
        Level::Warn => s.yellow().bold().to_string(),
        Level::Error => s.red().bold().to_string(),
        Level::Debug => s.cyan().to_string(),
    }
}

fn strip_ansi(input: &str) -> String {
    // Remove CSI sequences like \x1b[0m or \x1b[1;32m
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for b in chars.by_ref() {
                if ('@'..='~').contains(&b) {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

fn render_text(level: Level, message: &str, color: bool) -> String {
    format!("{} {}", colorize(level, level.tag(), color), message)
}

fn render_json(level: Level, code: &str, message: &str, data: Option<serde_json::Value>) -> String {
    let clean_msg = strip_ansi(message);
    let ev = Event {
        level: level.as_str(),
        code,
        message: &clean_msg,
        data,
    };
    serde_json::to_string(&ev).unwrap_or_else(|_| clean_msg.clone())
}

/// Write one event. Debug events are dropped unless debug mode is on.
pub fn emit(level: Level, code: &str, message: &str, data: Option<serde_json::Value>) {
    if level == Level::Debug && !is_debug_enabled() {
        return;
    }

    let r = renderer();
    let line = match r.format {
        OutputFormat::Text => render_text(level, message, r.color),
        OutputFormat::Json => render_json(level, code, message, data),
    };

    let mut out: Box<dyn Write> = if level.to_stderr() {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };
    let _ = writeln!(out, "{}", line);
}

/// Highlight a value (package, URL, step) inside a text message.
pub fn highlight(value: &str) -> String {
    let r = renderer();
    if r.color && r.format == OutputFormat::Text {
        value.yellow().to_string()
    } else {
        value.to_string()
    }
}

pub mod prelude {
    pub use super::{Level, emit, highlight, is_debug_enabled};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;32mok\x1b[0m done"), "ok done");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn test_text_without_color() {
        assert_eq!(
            render_text(Level::Error, "git clone failed", false),
            "error git clone failed"
        );
        assert_eq!(render_text(Level::Info, "Cloning", false), "forged Cloning");
    }

    #[test]
    fn test_json_event() {
        let line = render_json(
            Level::Success,
            "package.install.done",
            "\x1b[33mhtop\x1b[0m installed",
            Some(serde_json::json!({"tier": "official"})),
        );
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "success");
        assert_eq!(value["code"], "package.install.done");
        assert_eq!(value["message"], "htop installed");
        assert_eq!(value["data"]["tier"], "official");
    }

    #[test]
    fn test_levels_to_stderr() {
        assert!(Level::Error.to_stderr());
        assert!(Level::Warn.to_stderr());
        assert!(!Level::Success.to_stderr());
    }
}
