//! Pure per-line output cleanup.
//!
//! Raw PTY output is full of terminal noise a chat-style client cannot
//! render: ANSI control sequences, the shell prompt, and the echo of the
//! command that was just typed. Each line goes through, in order:
//!
//! 1. strip terminal control sequences (CSI via the ESC introducer and the
//!    single-byte C1 equivalent),
//! 2. trim surrounding whitespace,
//! 3. strip one leading `user@host:path$ ` prompt, trim again,
//! 4. wrap echoed shell built-ins in `<small>…</small>` so clients can
//!    de-emphasize them.
//!
//! The transform is idempotent: sanitizing its own output is a no-op.

use regex::Regex;
use std::sync::LazyLock;

/// Leading shell prompt: word chars / `@` / `.` / `-`, a `:`, `~`, or
/// whitespace separator, anything up to the first `$ `.
static PROMPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w@.\-]+[:~\s].*?\$(\s|$)").expect("prompt regex"));

/// Echoed command: a `$` then one of the common shell built-ins.
static ECHO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$\s*(cd|ls|pwd|mkdir|rm|touch|echo|cat|nano)\b").expect("echo regex")
});

/// Sanitize one raw output line. May return an empty string — callers drop
/// those instead of forwarding them.
pub fn sanitize_line(raw: &str) -> String {
    // The single-byte C1 CSI reaches us as U+009B once the stream has been
    // decoded; normalize it to the two-byte ESC form before stripping.
    let normalized = raw.replace('\u{9b}', "\u{1b}[");
    let stripped = strip_ansi_escapes::strip(normalized.as_bytes());
    let text = String::from_utf8_lossy(&stripped);
    let trimmed = text.trim();

    let without_prompt = PROMPT_RE.replace(trimmed, "");
    let line = without_prompt.trim();

    if line.is_empty() {
        return String::new();
    }
    if ECHO_RE.is_match(line) {
        return format!("<small>{line}</small>");
    }
    line.to_string()
}
