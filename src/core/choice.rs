//! Overridable-choice fields.
//!
//! A choice field lets the user pick from a curated list or type any other value after
//! selecting [`OTHER`]. Storage keeps a single string column and no "is custom" flag, so
//! the editable state is always re-derived from the stored string by checking membership
//! in the option list ([`ChoiceFieldValue::render`]). All transitions take `self` by value
//! and return the next state.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Sentinel selection that reveals the free-text input.
pub const OTHER: &str = "OTHER";

/// What the select box currently shows
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Selection {
    /// Nothing chosen yet (`""`)
    #[default]
    Unset,
    /// A member of the option list
    Option(String),
    /// The [`OTHER`] sentinel; the value comes from the custom text
    Other,
}

impl Selection {
    /// Parses a raw select value as submitted by the form.
    ///
    /// # Errors
    /// Returns a validation error when `raw` is neither empty, [`OTHER`], nor one of `options`.
    pub fn parse<S: AsRef<str>>(raw: &str, options: &[S]) -> Result<Self> {
        if raw.is_empty() {
            Ok(Self::Unset)
        } else if raw == OTHER {
            Ok(Self::Other)
        } else if is_member(raw, options) {
            Ok(Self::Option(raw.to_string()))
        } else {
            Err(Error::validation(
                "selection",
                format!("'{raw}' is not one of the available options"),
            ))
        }
    }

    /// The raw select value (`""`, the option text, or [`OTHER`]).
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unset => "",
            Self::Option(option) => option,
            Self::Other => OTHER,
        }
    }
}

fn is_member<S: AsRef<str>>(value: &str, options: &[S]) -> bool {
    options.iter().any(|option| option.as_ref() == value)
}

/// Editable state of one overridable-choice field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChoiceFieldValue {
    selection: Selection,
    custom_text: String,
}

impl ChoiceFieldValue {
    /// Fresh state for a new record: nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the editable state from a stored value.
    ///
    /// Membership is exact and case-sensitive. Any non-empty value outside `options` comes
    /// back as [`Selection::Other`] with the value as custom text, including a stored value
    /// that happens to read `"OTHER"`. A custom value that equals an option is
    /// indistinguishable from choosing that option.
    #[must_use]
    pub fn render<S: AsRef<str>>(stored: &str, options: &[S]) -> Self {
        if stored.is_empty() {
            Self::default()
        } else if is_member(stored, options) {
            Self {
                selection: Selection::Option(stored.to_string()),
                custom_text: String::new(),
            }
        } else {
            Self {
                selection: Selection::Other,
                custom_text: stored.to_string(),
            }
        }
    }

    /// Applies a new select value.
    ///
    /// Leaving [`OTHER`] clears the custom text so it cannot resurface later. Entering
    /// [`OTHER`] from anywhere else starts with empty text; re-selecting [`OTHER`] while
    /// already on it keeps what was typed.
    #[must_use]
    pub fn on_selection_change(self, selection: Selection) -> Self {
        match selection {
            Selection::Other if self.selection == Selection::Other => self,
            selection => Self {
                selection,
                custom_text: String::new(),
            },
        }
    }

    /// Replaces the custom text. The text is taken verbatim, even if it matches an option.
    ///
    /// # Errors
    /// Returns a validation error unless [`OTHER`] is selected.
    pub fn on_custom_text_change(self, text: impl Into<String>) -> Result<Self> {
        if self.selection != Selection::Other {
            return Err(Error::validation(
                "custom_text",
                format!("custom text requires the {OTHER} option to be selected"),
            ));
        }
        Ok(Self {
            custom_text: text.into(),
            ..self
        })
    }

    #[must_use]
    /// What the select box shows.
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Free text typed under [`OTHER`]; empty otherwise.
    #[must_use]
    pub fn custom_text(&self) -> &str {
        &self.custom_text
    }

    /// Whether the free-text input is visible.
    #[must_use]
    pub const fn show_custom_input(&self) -> bool {
        matches!(self.selection, Selection::Other)
    }

    /// The single string that gets stored.
    #[must_use]
    pub fn to_persisted_value(&self) -> String {
        match &self.selection {
            Selection::Unset => String::new(),
            Selection::Option(option) => option.clone(),
            Selection::Other => self.custom_text.clone(),
        }
    }
}
