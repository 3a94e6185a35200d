//! Thread view rendered to the terminal.
//!
//! Operator and user bubbles share the same header layout (display name +
//! formatted date) and differ in marker and color. The terminal scrolls
//! with its own output, so the newest bubble is always in view and
//! `scroll_to_latest` has nothing to do here.

use std::io::Write;

use async_trait::async_trait;

use scw_core::render::{Bubble, ConnectionStatus, RenderSink, Role};
use scw_core::Result;

const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

pub struct TerminalView {
    use_color: bool,
}

impl TerminalView {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.use_color {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    fn render_bubble(&self, b: &Bubble) -> String {
        let (marker, color) = match b.role {
            Role::Operator => ("◆", CYAN),
            Role::User => ("●", GREEN),
        };
        let header = format!("{marker} {}  {}", b.display_name, b.timestamp);
        let body = b
            .body
            .lines()
            .map(|l| format!("  {l}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n{}\n", self.paint(color, &header), body)
    }
}

#[async_trait]
impl RenderSink for TerminalView {
    async fn append(&self, bubbles: &[Bubble]) -> Result<()> {
        let mut out = std::io::stdout().lock();
        for b in bubbles {
            writeln!(out, "{}", self.render_bubble(b))?;
        }
        out.flush()?;
        Ok(())
    }

    async fn scroll_to_latest(&self) -> Result<()> {
        Ok(())
    }

    async fn set_status(&self, status: ConnectionStatus) -> Result<()> {
        let line = match status {
            ConnectionStatus::Live => "· reconnected".to_string(),
            ConnectionStatus::Reconnecting { attempt } => {
                format!("· reconnecting (attempt {attempt})…")
            }
        };
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", self.paint(DIM, &line))?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bubble(role: Role, body: &str) -> Bubble {
        Bubble {
            role,
            display_name: "alice".to_string(),
            timestamp: "22:13:20, Tue Nov 14 2023".to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn bubble_shows_header_and_indented_body() {
        let view = TerminalView::new(false);
        let s = view.render_bubble(&bubble(Role::User, "hi"));
        assert_eq!(s, "● alice  22:13:20, Tue Nov 14 2023\n  hi\n");
    }

    #[test]
    fn operator_and_user_markers_differ() {
        let view = TerminalView::new(false);
        let op = view.render_bubble(&bubble(Role::Operator, "hi"));
        let user = view.render_bubble(&bubble(Role::User, "hi"));
        assert!(op.starts_with("◆"));
        assert!(user.starts_with("●"));
        assert_ne!(op, user);
    }

    #[test]
    fn multiline_bodies_stay_indented() {
        let view = TerminalView::new(false);
        let s = view.render_bubble(&bubble(Role::User, "one\ntwo"));
        assert!(s.contains("\n  one\n  two\n"));
    }

    #[test]
    fn color_codes_only_appear_when_enabled() {
        let plain = TerminalView::new(false).render_bubble(&bubble(Role::User, "hi"));
        assert!(!plain.contains('\x1b'));
        let colored = TerminalView::new(true).render_bubble(&bubble(Role::User, "hi"));
        assert!(colored.starts_with(GREEN));
        assert!(colored.contains(RESET));
    }
}
