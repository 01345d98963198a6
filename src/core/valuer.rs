//! Record-aware field resolvers describing the caller
//!
//! With the record depth at 0 the call site captured by `#[track_caller]` is
//! used directly. Deeper frames, function names and stacks come from a
//! backtrace captured at resolution time, so they need debug info to be
//! useful; without it the resolvers report `???` for anything above the
//! call site itself.
//!
//! # Example
//!
//! ```
//! use rust_kvlog::prelude::*;
//! use rust_kvlog::core::valuer;
//!
//! let logger = Logger::new(DiscardWriter).with_field(valuer::caller("caller"));
//! logger.info("located", []);
//! ```

use super::field::{Field, FieldValue};
use super::record::{CallSite, Record};
use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::path::Path;

const UNKNOWN: &str = "???";

/// One logical frame of a captured backtrace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Frame {
    pub(crate) symbol: String,
    pub(crate) file: Option<String>,
    pub(crate) line: u32,
}

impl Frame {
    fn short_file(&self) -> Option<&str> {
        self.file
            .as_deref()
            .map(|file| CallSite::new(file, 0, 0).short_file())
    }

    fn is_runtime(&self) -> bool {
        const RUNTIME_PREFIXES: [&str; 5] = ["std::", "core::", "alloc::", "test::", "<std::"];
        RUNTIME_PREFIXES
            .iter()
            .any(|prefix| self.symbol.starts_with(prefix))
            || self
                .file
                .as_deref()
                .is_some_and(|file| file.starts_with("/rustc/") || file.contains("/library/std/"))
    }
}

/// Split the `Display` form of a backtrace into frames
///
/// Inlined symbols share the number of their physical frame and are listed
/// as separate frames here.
pub(crate) fn parse_backtrace(text: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                let (file, line_no) = split_location(location);
                frame.file = Some(file.to_string());
                frame.line = line_no;
            }
            continue;
        }

        let symbol = match trimmed.split_once(": ") {
            Some((index, symbol)) if index.chars().all(|c| c.is_ascii_digit()) => symbol,
            _ if !trimmed.is_empty() && line.starts_with("      ") => trimmed,
            _ => continue,
        };
        frames.push(Frame {
            symbol: strip_hash(symbol).to_string(),
            file: None,
            line: 0,
        });
    }
    frames
}

// "path/to/file.rs:12:5" -> ("path/to/file.rs", 12)
fn split_location(location: &str) -> (&str, u32) {
    let mut parts = location.rsplitn(3, ':');
    let last = parts.next().unwrap_or_default();
    let middle = parts.next();
    let rest = parts.next();

    match (middle, rest) {
        (Some(line), Some(file)) if line.parse::<u32>().is_ok() => (file, line.parse().unwrap_or(0)),
        (Some(file), _) => (file, last.parse().unwrap_or(0)),
        _ => (location, 0),
    }
}

fn strip_hash(symbol: &str) -> &str {
    match symbol.rfind("::h") {
        Some(pos)
            if symbol.len() - pos == 19
                && symbol[pos + 3..].chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            &symbol[..pos]
        }
        _ => symbol,
    }
}

/// Path segments of a symbol, ignoring `::` inside generic brackets
fn segments(symbol: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut nesting = 0usize;
    let mut start = 0;
    let bytes = symbol.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'<' => nesting += 1,
            b'>' => nesting = nesting.saturating_sub(1),
            b':' if nesting == 0 && bytes.get(i + 1) == Some(&b':') => {
                out.push(&symbol[start..i]);
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    out.push(&symbol[start..]);
    out
}

fn is_closure(segment: &str) -> bool {
    segment.starts_with("{{") && segment.ends_with("}}")
}

/// The function path without closure segments
fn function_path(symbol: &str) -> Vec<&str> {
    segments(symbol)
        .into_iter()
        .filter(|segment| !is_closure(segment))
        .collect()
}

fn locate_site(frames: &[Frame], site: &CallSite<'_>) -> Option<usize> {
    frames.iter().position(|frame| {
        frame.line == site.line
            && frame
                .file
                .as_deref()
                .is_some_and(|file| Path::new(file).ends_with(site.file))
    })
}

/// Frames from the call site outward, `None` when the site is not found
fn frames_from_site(site: &CallSite<'_>) -> Option<Vec<Frame>> {
    let frames = parse_backtrace(&Backtrace::force_capture().to_string());
    let index = locate_site(&frames, site)?;
    Some(frames[index..].to_vec())
}

/// What a resolver knows about the frame `record.depth` levels above the call
enum Target {
    Site,
    Frame(Frame),
    Missing,
}

fn target(record: &Record<'_>, need_symbol: bool) -> Target {
    if record.depth == 0 && !need_symbol {
        return Target::Site;
    }
    match frames_from_site(&record.site) {
        Some(frames) => match frames.into_iter().nth(record.depth) {
            Some(frame) => Target::Frame(frame),
            None => Target::Missing,
        },
        None if record.depth == 0 && !need_symbol => Target::Site,
        None => Target::Missing,
    }
}

fn location(record: &Record<'_>, full: bool) -> String {
    match target(record, false) {
        Target::Site if full => format!("{}:{}", record.site.file, record.site.line),
        Target::Site => record.site.to_string(),
        Target::Frame(frame) => {
            let file = if full {
                frame.file.as_deref()
            } else {
                frame.short_file()
            };
            format!("{}:{}", file.unwrap_or(UNKNOWN), frame.line)
        }
        Target::Missing => format!("{}:0", UNKNOWN),
    }
}

/// `file:line` of the caller, short file name
pub fn caller(name: impl Into<Cow<'static, str>>) -> Field {
    Field::valuer(name, |record| location(record, false).into())
}

/// `path/to/file:line` of the caller
pub fn caller_full(name: impl Into<Cow<'static, str>>) -> Field {
    Field::valuer(name, |record| location(record, true).into())
}

/// The stack from the caller outward, runtime frames removed: `[a.rs:1 b.rs:2]`
pub fn caller_stack(name: impl Into<Cow<'static, str>>) -> Field {
    Field::valuer(name, |record| {
        let Some(frames) = frames_from_site(&record.site) else {
            return match record.depth {
                0 => FieldValue::String(format!("[{}]", record.site)),
                _ => FieldValue::String(String::new()),
            };
        };
        let entries: Vec<String> = frames
            .iter()
            .skip(record.depth)
            .filter(|frame| !frame.is_runtime())
            .filter_map(|frame| Some(format!("{}:{}", frame.short_file()?, frame.line)))
            .collect();
        if entries.is_empty() {
            FieldValue::String(String::new())
        } else {
            FieldValue::String(format!("[{}]", entries.join(" ")))
        }
    })
}

/// Line number of the caller as a string
pub fn line_no(name: impl Into<Cow<'static, str>>) -> Field {
    Field::valuer(name, |record| match target(record, false) {
        Target::Site => record.site.line.to_string().into(),
        Target::Frame(frame) => frame.line.to_string().into(),
        Target::Missing => FieldValue::String(String::new()),
    })
}

/// Line number of the caller, 0 when unknown
pub fn line_no_as_int(name: impl Into<Cow<'static, str>>) -> Field {
    Field::valuer(name, |record| match target(record, false) {
        Target::Site => record.site.line.into(),
        Target::Frame(frame) => frame.line.into(),
        Target::Missing => 0u32.into(),
    })
}

/// Short name of the caller's file
pub fn file_name(name: impl Into<Cow<'static, str>>) -> Field {
    Field::valuer(name, |record| match target(record, false) {
        Target::Site => record.site.short_file().into(),
        Target::Frame(frame) => frame.short_file().unwrap_or(UNKNOWN).into(),
        Target::Missing => UNKNOWN.into(),
    })
}

/// Path of the caller's file as the compiler saw it
pub fn file_long_name(name: impl Into<Cow<'static, str>>) -> Field {
    Field::valuer(name, |record| match target(record, false) {
        Target::Site => record.site.file.into(),
        Target::Frame(frame) => frame.file.unwrap_or_else(|| UNKNOWN.to_string()).into(),
        Target::Missing => UNKNOWN.into(),
    })
}

fn with_symbol(record: &Record<'_>, f: impl FnOnce(&str) -> String) -> FieldValue {
    match target(record, true) {
        Target::Frame(frame) => f(&frame.symbol).into(),
        Target::Site | Target::Missing => UNKNOWN.into(),
    }
}

/// Name of the function containing the caller, without its module path
pub fn func_name(name: impl Into<Cow<'static, str>>) -> Field {
    Field::valuer(name, |record| {
        with_symbol(record, |symbol| {
            function_path(symbol)
                .last()
                .copied()
                .unwrap_or(UNKNOWN)
                .to_string()
        })
    })
}

/// Full path of the function containing the caller
pub fn func_full_name(name: impl Into<Cow<'static, str>>) -> Field {
    Field::valuer(name, |record| {
        with_symbol(record, |symbol| function_path(symbol).join("::"))
    })
}

/// Module path of the function containing the caller
pub fn package(name: impl Into<Cow<'static, str>>) -> Field {
    Field::valuer(name, |record| {
        with_symbol(record, |symbol| {
            let path = function_path(symbol);
            match path.split_last() {
                Some((_, module)) if !module.is_empty() => module.join("::"),
                _ => path.join("::"),
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;
    use chrono::Utc;

    const SAMPLE: &str = "\
   0: rust_kvlog::core::valuer::frames_from_site
             at ./src/core/valuer.rs:150:25
   1: app::handlers::user::load::{{closure}}
             at ./src/handlers/user.rs:42:9
      app::handlers::user::load
             at ./src/handlers/user.rs:40:5
   2: <app::Server as app::Handler>::handle::h0123456789abcdef
             at /home/dev/app/src/server.rs:88:13
   3: std::rt::lang_start::{{closure}}
             at /rustc/abc/library/std/src/rt.rs:166:18
";

    fn resolve(mut field: Field, site: CallSite<'static>, depth: usize) -> FieldValue {
        let record = Record {
            name: "",
            time: Utc::now(),
            depth,
            level: Level::INFO,
            message: "",
            site,
            fields: &[],
        };
        field.resolve(&record);
        field.value().into_owned()
    }

    #[test]
    fn test_parse_backtrace() {
        let frames = parse_backtrace(SAMPLE);
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[1].symbol, "app::handlers::user::load::{{closure}}");
        assert_eq!(frames[2].symbol, "app::handlers::user::load");
        assert_eq!(frames[2].file.as_deref(), Some("./src/handlers/user.rs"));
        assert_eq!(frames[2].line, 40);
        assert_eq!(frames[3].symbol, "<app::Server as app::Handler>::handle");
        assert!(frames[4].is_runtime());
    }

    #[test]
    fn test_locate_site() {
        let frames = parse_backtrace(SAMPLE);
        let site = CallSite::new("src/handlers/user.rs", 40, 5);
        assert_eq!(locate_site(&frames, &site), Some(2));
        assert_eq!(frames[3].short_file(), Some("server.rs"));
        assert_eq!(locate_site(&frames, &CallSite::new("src/other.rs", 40, 1)), None);
    }

    #[test]
    fn test_symbol_segments() {
        assert_eq!(
            function_path("app::handlers::user::load::{{closure}}"),
            vec!["app", "handlers", "user", "load"]
        );
        assert_eq!(
            segments("<app::Server as app::Handler>::handle"),
            vec!["<app::Server as app::Handler>", "handle"]
        );
        assert_eq!(strip_hash("a::b::h0123456789abcdef"), "a::b");
        assert_eq!(strip_hash("a::helper"), "a::helper");
    }

    #[test]
    fn test_split_location() {
        assert_eq!(split_location("./src/a.rs:12:5"), ("./src/a.rs", 12));
        assert_eq!(split_location("C:\\src\\a.rs:7:1"), ("C:\\src\\a.rs", 7));
        assert_eq!(split_location("src/a.rs:3"), ("src/a.rs", 3));
    }

    #[test]
    fn test_depth_zero_uses_call_site() {
        let site = CallSite::new("src/api/handler.rs", 27, 9);
        assert_eq!(resolve(caller("c"), site, 0).to_string(), "handler.rs:27");
        assert_eq!(
            resolve(caller_full("c"), site, 0).to_string(),
            "src/api/handler.rs:27"
        );
        assert_eq!(resolve(line_no("l"), site, 0).to_string(), "27");
        assert_eq!(resolve(line_no_as_int("l"), site, 0), FieldValue::Uint(27));
        assert_eq!(resolve(file_name("f"), site, 0).to_string(), "handler.rs");
        assert_eq!(
            resolve(file_long_name("f"), site, 0).to_string(),
            "src/api/handler.rs"
        );
    }

    #[test]
    fn test_unknown_site_has_no_function() {
        let site = CallSite::new("does/not/exist.rs", 1, 1);
        assert_eq!(resolve(func_name("fn"), site, 0).to_string(), "???");
        assert_eq!(resolve(package("pkg"), site, 0).to_string(), "???");
        assert_eq!(resolve(caller("c"), site, 0).to_string(), "exist.rs:1");
    }

    #[test]
    fn test_unknown_site_above_depth_zero_is_missing() {
        let site = CallSite::new("does/not/exist.rs", 1, 1);
        assert_eq!(resolve(caller("c"), site, 3).to_string(), "???:0");
        assert_eq!(resolve(caller_full("c"), site, 1).to_string(), "???:0");
        assert_eq!(resolve(line_no_as_int("l"), site, 1), FieldValue::Uint(0));
        assert_eq!(resolve(file_name("f"), site, 2).to_string(), "???");
        assert_eq!(resolve(caller_stack("s"), site, 1).to_string(), "");
    }

    #[test]
    fn test_valuers_are_deferred() {
        let field = caller_stack("stack");
        assert!(field.is_deferred());
        assert_eq!(field.key(), "stack");
        assert_eq!(*field.value(), FieldValue::Null);
    }
}
