//! Validated text primitives shared by the casualty engine crates.
//!
//! Free-text clinical fields stay as plain `String`s; these wrappers are only used where the
//! engine needs a guarantee, such as the label of a treatment action that will be written into
//! the treatment log as a single tagged line.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input text spans more than one line
    #[error("Text must fit on a single line")]
    Multiline,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Label of a treatment action as written into a log line.
///
/// A label is non-empty, trimmed and contains no line breaks, so that
/// `"<label> [HH:MM]"` always occupies exactly one line of the treatment log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionLabel(NonEmptyText);

impl ActionLabel {
    /// Creates a new `ActionLabel`.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` for blank input and `TextError::Multiline` if the input
    /// contains `\n` or `\r`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let text = NonEmptyText::new(input)?;
        if text.as_str().contains(['\n', '\r']) {
            return Err(TextError::Multiline);
        }
        Ok(Self(text))
    }

    /// Returns the label as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ActionLabel {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::str::FromStr for ActionLabel {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionLabel::new(s)
    }
}

impl serde::Serialize for ActionLabel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for ActionLabel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ActionLabel::new(&s).map_err(serde::de::Error::custom)
    }
}
