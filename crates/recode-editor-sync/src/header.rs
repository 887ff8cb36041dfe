//! Name and description text bindings.
//!
//! Each binding tracks one header field of the transform being edited.
//! Focus pauses global shortcuts, blur resumes them and yields the partial
//! update to push, Escape discards the edit and restores the stored text.

use recode_editor_core::{EditorConfig, FocusSuspension, Key};

use crate::store::{TransformRecord, TransformValues};

/// Which header field a binding edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    Name,
    Description,
}

impl HeaderField {
    /// The field's text in a stored record.
    pub fn read(self, record: &TransformRecord) -> &str {
        match self {
            Self::Name => &record.name,
            Self::Description => &record.description,
        }
    }
}

/// What the host should do after a key press in a header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderKeydown {
    /// Blur the field; the blur commits it.
    Commit,
    /// Put this text back into the field, then blur it.
    Revert(String),
    /// Not ours, let the platform handle it.
    NotHandled,
}

impl HeaderKeydown {
    pub fn prevents_default(&self) -> bool {
        !matches!(self, Self::NotHandled)
    }
}

/// Commit/revert state for one header field.
#[derive(Debug, Clone)]
pub struct HeaderBinding {
    field: HeaderField,
    apply_on_blur: bool,
    max_len: Option<usize>,
    context: String,
}

impl HeaderBinding {
    pub fn new(field: HeaderField, config: &EditorConfig) -> Self {
        let max_len = match field {
            HeaderField::Name => Some(config.max_name_len),
            HeaderField::Description => None,
        };
        Self {
            field,
            apply_on_blur: true,
            max_len,
            context: config.shortcut_context.clone(),
        }
    }

    pub fn field(&self) -> HeaderField {
        self.field
    }

    /// Clamp text to the field's maximum length in characters.
    pub fn clamp<'a>(&self, text: &'a str) -> &'a str {
        match self.max_len {
            Some(max) => match text.char_indices().nth(max) {
                Some((end, _)) => &text[..end],
                None => text,
            },
            None => text,
        }
    }

    pub fn focus<F: FocusSuspension>(&mut self, focus: &mut F) {
        focus.pause(Some(&self.context));
        tracing::debug!(field = ?self.field, "Header field focused");
    }

    /// The field lost focus holding `text`.
    ///
    /// Shortcuts resume on every blur. Returns the update to push unless
    /// Escape discarded the edit.
    pub fn blur<F: FocusSuspension>(
        &mut self,
        text: &str,
        focus: &mut F,
    ) -> Option<TransformValues> {
        focus.resume();
        if !std::mem::replace(&mut self.apply_on_blur, true) {
            tracing::debug!(field = ?self.field, "Header edit discarded");
            return None;
        }
        let text = self.clamp(text).to_owned();
        Some(match self.field {
            HeaderField::Name => TransformValues::name(text),
            HeaderField::Description => TransformValues::description(text),
        })
    }

    /// Handle a key press. `record` is the store's current record, used to
    /// restore the field on Escape.
    pub fn keydown(&mut self, key: &Key, record: Option<&TransformRecord>) -> HeaderKeydown {
        match key {
            Key::Enter => HeaderKeydown::Commit,
            Key::Escape => {
                self.apply_on_blur = false;
                let text = record
                    .map(|record| self.field.read(record).to_owned())
                    .unwrap_or_default();
                HeaderKeydown::Revert(text)
            }
            _ => HeaderKeydown::NotHandled,
        }
    }
}
