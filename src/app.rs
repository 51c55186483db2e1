use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::gemini::{CompletionRequest, CompletionService};

/// Fixed answer text for a failed completion call.
pub const ERROR_ANSWER: &str = "Error fetching answer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the transcript. Turns are append-only and never mutated.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub is_error: bool,
}

impl Turn {
    fn user(content: String) -> Self {
        Self {
            role: Role::User,
            content,
            is_error: false,
        }
    }

    fn assistant(content: String) -> Self {
        Self {
            role: Role::Assistant,
            content,
            is_error: false,
        }
    }

    fn error() -> Self {
        Self {
            role: Role::Assistant,
            content: ERROR_ANSWER.to_string(),
            is_error: true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Please enter a question or prompt")]
    EmptyPrompt,
    #[error("an answer is still being generated")]
    Busy,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,

    // Conversation state
    pub transcript: Vec<Turn>,
    pub busy: bool,

    // Input state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars
    pub alert: Option<String>,

    // Transcript viewport
    pub scroll: u16,
    pub chat_height: u16, // inner height of the chat area, set during render
    pub chat_width: u16,  // inner width, used for wrap estimates

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub model: String,

    service: Arc<dyn CompletionService>,
    pending: Option<JoinHandle<Result<String>>>,
}

impl App {
    pub fn new(service: Arc<dyn CompletionService>, model: String) -> Self {
        Self {
            should_quit: false,
            transcript: Vec::new(),
            busy: false,
            input: String::new(),
            cursor: 0,
            alert: None,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            model,
            service,
            pending: None,
        }
    }

    /// Dispatches the current input as a completion call. The user turn is
    /// appended immediately; the answer lands via [`App::resolve`]. Only one
    /// call may be in flight at a time.
    pub fn submit(&mut self) -> Result<(), SubmitError> {
        if self.busy {
            return Err(SubmitError::Busy);
        }
        if self.input.trim().is_empty() {
            return Err(SubmitError::EmptyPrompt);
        }

        let text = self.input.clone();
        self.transcript.push(Turn::user(text.clone()));
        self.busy = true;

        let service = Arc::clone(&self.service);
        self.pending = Some(tokio::spawn(async move {
            service.complete(CompletionRequest { text }).await
        }));

        self.scroll_to_bottom();
        Ok(())
    }

    /// True once the in-flight call has settled and `resolve` won't block.
    pub fn answer_ready(&self) -> bool {
        self.pending.as_ref().is_some_and(JoinHandle::is_finished)
    }

    /// Joins the completion call and appends the assistant turn. On failure
    /// the input buffer is left untouched so the prompt can be resubmitted.
    pub async fn resolve(&mut self) {
        let Some(task) = self.pending.take() else {
            return;
        };

        let outcome = match task.await {
            Ok(result) => result,
            Err(join_error) => Err(anyhow::Error::new(join_error)),
        };

        match outcome {
            Ok(answer) => {
                self.transcript.push(Turn::assistant(answer));
                self.input.clear();
                self.cursor = 0;
            }
            Err(_) => {
                self.transcript.push(Turn::error());
            }
        }

        self.busy = false;
        self.scroll_to_bottom();
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // Transcript viewport

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1).min(self.max_scroll());
    }

    /// Scroll so the newest turn (or the loading indicator) is visible.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        let visible = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.transcript_line_estimate().saturating_sub(visible)
    }

    /// Estimate of rendered transcript lines, mirroring the wrap arithmetic
    /// of the paragraph widget. Char counts stand in for display width.
    fn transcript_line_estimate(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for turn in &self.transcript {
            total_lines += 1; // Role label line
            for line in turn.content.lines() {
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after each turn
        }

        if self.busy {
            total_lines += 2; // Label + "Generating..."
        }

        total_lines
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.busy {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
