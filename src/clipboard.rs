//! Clipboard access for the copy action

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("Clipboard write failed: {0}")]
    Write(String),
}

/// Something that can receive a label's text
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard, opened on first use so headless sessions only fail
/// when a copy is actually attempted
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(clipboard);
        }

        match self.inner.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_string())
                .map_err(|e| ClipboardError::Write(e.to_string())),
            None => Err(ClipboardError::Unavailable("not initialized".to_string())),
        }
    }
}

/// In-memory clipboard used by tests
#[cfg(test)]
#[derive(Default)]
pub struct MemoryClipboard {
    pub contents: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    pub fail: bool,
}

#[cfg(test)]
impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Write("no display".to_string()));
        }
        self.contents.borrow_mut().push(text.to_string());
        Ok(())
    }
}
