use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use console::style;
use llmchat::models::conversation::Conversation;
use llmchat::stream::accumulator::StreamSnapshot;

/// Prints only what each cumulative snapshot adds to the previous one
pub struct StreamPrinter<W: Write> {
    out: W,
    reasoning_len: usize,
    content_len: usize,
}

impl<W: Write> StreamPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            reasoning_len: 0,
            content_len: 0,
        }
    }

    pub fn print(&mut self, snapshot: &StreamSnapshot) -> io::Result<()> {
        if let Some(reasoning) = snapshot.reasoning_content.get(self.reasoning_len..) {
            if !reasoning.is_empty() {
                write!(self.out, "{}", style(reasoning).dim())?;
                self.reasoning_len = snapshot.reasoning_content.len();
            }
        }

        if let Some(content) = snapshot.content.get(self.content_len..) {
            if !content.is_empty() {
                if self.content_len == 0 && self.reasoning_len > 0 {
                    writeln!(self.out, "\n")?;
                }
                write!(self.out, "{}", content)?;
                self.content_len = snapshot.content.len();
            }
        }
        self.out.flush()
    }

    pub fn has_output(&self) -> bool {
        self.reasoning_len > 0 || self.content_len > 0
    }
}

pub fn print_markdown(content: &str) -> Result<()> {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme("zenburn")
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()?;
    Ok(())
}

pub fn stats_line(snapshot: &StreamSnapshot) -> String {
    format!(
        "{} tokens · {} tokens/s",
        snapshot.completion_tokens,
        snapshot.speed_display()
    )
}

pub fn conversation_line(conversation: &Conversation, active: bool) -> String {
    let marker = if active { "*" } else { " " };
    format!(
        "{} {}  {}  ({} messages)",
        marker,
        conversation.id,
        conversation.title,
        conversation.messages.len()
    )
}
