// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stack trace parsing for V8-style stack strings.
//!
//! Parsing is total: malformed lines degrade to best-effort frames and never
//! produce an error. Other engine formats are an extension point; any line
//! that does not match the `at fn (file:line:col)` shape becomes a fallback
//! frame carrying the raw line as its function name.

use crate::event::{Frame, Stacktrace};

/// Path markers indicating third-party/vendor code.
const VENDOR_MARKERS: &[&str] = &[
	"node_modules",
	"/vendor/",
	"extension://",
	"cdn.",
];

/// Parse a raw stack string into an ordered stack trace.
///
/// Empty input yields an empty trace.
pub fn parse_stack(raw: &str) -> Stacktrace {
	let frames = raw
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.enumerate()
		.filter_map(|(idx, line)| parse_stack_line(line, idx == 0))
		.collect();
	Stacktrace { frames }
}

/// Parse a single stack line into a frame.
///
/// Returns `None` only for a leading `Error: message` header line; every
/// other non-matching line, including `word: text` lines deeper in the
/// input, produces a best-effort fallback frame.
fn parse_stack_line(line: &str, first_line: bool) -> Option<Frame> {
	if let Some(rest) = line.strip_prefix("at ") {
		let rest = rest.trim();

		// "at fn (file:line:col)"
		if let Some(open) = rest.rfind('(') {
			if let Some(close) = rest.rfind(')') {
				if close > open {
					let function = rest[..open].trim();
					let location = &rest[open + 1..close];
					if let Some((filename, lineno, colno)) = split_location(location) {
						return Some(make_frame(
							non_empty(function),
							Some(filename),
							Some(lineno),
							Some(colno),
						));
					}
				}
			}
		}

		// "at file:line:col" (no enclosing function)
		if let Some((filename, lineno, colno)) = split_location(rest) {
			return Some(make_frame(None, Some(filename), Some(lineno), Some(colno)));
		}

		// Malformed "at" line: keep what we have.
		return Some(make_frame(non_empty(rest), None, None, None));
	}

	// A leading "TypeError: x is not a function" header carries no frame.
	// Only the first line qualifies; the same shape later in the input is
	// treated as an unrecognized line.
	if first_line && looks_like_header(line) {
		return None;
	}

	// Best-effort fallback frame for unrecognized lines.
	Some(make_frame(Some(line.to_string()), None, None, None))
}

fn make_frame(
	function: Option<String>,
	filename: Option<String>,
	lineno: Option<u32>,
	colno: Option<u32>,
) -> Frame {
	let in_app = filename
		.as_deref()
		.map(|f| !VENDOR_MARKERS.iter().any(|m| f.contains(m)))
		.unwrap_or(true);
	Frame {
		function,
		abs_path: filename.clone(),
		filename,
		lineno,
		colno,
		in_app,
	}
}

/// Split a `file:line:col` location into its parts.
fn split_location(location: &str) -> Option<(String, u32, u32)> {
	let (rest, colno) = location.rsplit_once(':')?;
	let colno: u32 = colno.parse().ok()?;
	let (filename, lineno) = rest.rsplit_once(':')?;
	let lineno: u32 = lineno.parse().ok()?;
	if filename.is_empty() {
		return None;
	}
	Some((filename.to_string(), lineno, colno))
}

fn non_empty(s: &str) -> Option<String> {
	if s.is_empty() {
		None
	} else {
		Some(s.to_string())
	}
}

/// Heuristic for the `Type: message` header line of a stack string.
fn looks_like_header(line: &str) -> bool {
	match line.split_once(':') {
		Some((prefix, _)) => {
			!prefix.is_empty()
				&& prefix
					.chars()
					.all(|c| c.is_ascii_alphanumeric() || c == '_')
		}
		None => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_v8_frame_with_function() {
		let trace = parse_stack("Error: boom\n    at handleClick (https://app.example.com/static/js/main.js:10:5)");
		assert_eq!(trace.frames.len(), 1);
		let frame = &trace.frames[0];
		assert_eq!(frame.function.as_deref(), Some("handleClick"));
		assert_eq!(
			frame.filename.as_deref(),
			Some("https://app.example.com/static/js/main.js")
		);
		assert_eq!(frame.lineno, Some(10));
		assert_eq!(frame.colno, Some(5));
		assert!(frame.in_app);
	}

	#[test]
	fn parses_anonymous_frame() {
		let trace = parse_stack("    at https://app.example.com/main.js:3:14");
		assert_eq!(trace.frames.len(), 1);
		assert_eq!(trace.frames[0].function, None);
		assert_eq!(trace.frames[0].lineno, Some(3));
	}

	#[test]
	fn vendor_path_is_not_in_app() {
		let trace = parse_stack("    at dispatch (/app/node_modules/react-dom/index.js:100:20)");
		assert_eq!(trace.frames.len(), 1);
		assert!(!trace.frames[0].in_app);
	}

	#[test]
	fn empty_input_yields_empty_trace() {
		assert!(parse_stack("").is_empty());
		assert!(parse_stack("   \n  \n").is_empty());
	}

	#[test]
	fn malformed_line_becomes_fallback_frame() {
		let trace = parse_stack("some random garbage line");
		assert_eq!(trace.frames.len(), 1);
		let frame = &trace.frames[0];
		assert_eq!(frame.function.as_deref(), Some("some random garbage line"));
		assert_eq!(frame.filename, None);
		assert_eq!(frame.lineno, None);
		assert!(frame.in_app);
	}

	#[test]
	fn header_line_is_skipped() {
		let trace = parse_stack("TypeError: x is not a function\n    at f (a.js:1:2)");
		assert_eq!(trace.frames.len(), 1);
		assert_eq!(trace.frames[0].function.as_deref(), Some("f"));
	}

	#[test]
	fn header_shape_past_first_line_becomes_fallback_frame() {
		let raw = "Error: boom\n    at f (a.js:1:2)\nwarning: deprecated";
		let trace = parse_stack(raw);
		assert_eq!(trace.frames.len(), 2);
		assert_eq!(trace.frames[1].function.as_deref(), Some("warning: deprecated"));
		assert_eq!(trace.frames[1].filename, None);

		// Without a header, a "word: text" first line is still skipped only
		// in first position.
		let trace = parse_stack("note: context\nnote: context");
		assert_eq!(trace.frames.len(), 1);
	}

	#[test]
	fn frame_order_is_preserved() {
		let raw = "    at inner (a.js:1:1)\n    at outer (b.js:2:2)";
		let trace = parse_stack(raw);
		assert_eq!(trace.frames[0].function.as_deref(), Some("inner"));
		assert_eq!(trace.frames[1].function.as_deref(), Some("outer"));
	}

	#[test]
	fn never_panics_on_odd_input() {
		for raw in [
			"at ",
			"at (::)",
			"at f (file:notanumber:3)",
			"at f (:1:2)",
			"::::::",
		] {
			let _ = parse_stack(raw);
		}
	}
}
