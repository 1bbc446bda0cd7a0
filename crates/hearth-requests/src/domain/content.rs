//! Type-specific request content.

use hearth_core::error::DomainError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::fields::{FieldSpec, RequestKind};

/// Title placeholder used before a character has a name.
pub const UNNAMED: &str = "Unnamed";

/// Content of a character application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterApplicationContent {
    /// The character's name.
    pub name: String,
    /// The character's gender.
    pub gender: String,
    /// Third-person short description.
    pub short_description: String,
    /// Long description shown when examined.
    pub description: String,
    /// Private backstory.
    pub backstory: String,
}

/// The structured payload of a request, tagged by request kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestContent {
    /// Character application content.
    CharacterApplication(CharacterApplicationContent),
}

impl RequestContent {
    /// Creates empty content for a request kind.
    #[must_use]
    pub fn empty(kind: RequestKind) -> Self {
        match kind {
            RequestKind::CharacterApplication => {
                Self::CharacterApplication(CharacterApplicationContent::default())
            }
        }
    }

    /// Returns the request kind this content belongs to.
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::CharacterApplication(_) => RequestKind::CharacterApplication,
        }
    }

    /// Returns the current value of a field, or `None` for unknown keys.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        match self {
            Self::CharacterApplication(c) => match key {
                "name" => Some(&c.name),
                "gender" => Some(&c.gender),
                "short_description" => Some(&c.short_description),
                "description" => Some(&c.description),
                "backstory" => Some(&c.backstory),
                _ => None,
            },
        }
    }

    /// Overwrites a field value.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the key is not a field of this
    /// content's kind.
    pub fn set(&mut self, key: &str, value: String) -> Result<(), DomainError> {
        let kind = self.kind();
        let slot = match self {
            Self::CharacterApplication(c) => match key {
                "name" => &mut c.name,
                "gender" => &mut c.gender,
                "short_description" => &mut c.short_description,
                "description" => &mut c.description,
                "backstory" => &mut c.backstory,
                _ => {
                    return Err(DomainError::Validation(format!(
                        "unknown field {key:?} for {kind}"
                    )));
                }
            },
        };
        *slot = value;
        Ok(())
    }

    /// Returns the first field, in declared order, whose value is invalid.
    #[must_use]
    pub fn next_incomplete_field(&self) -> Option<&'static FieldSpec> {
        self.kind()
            .fields()
            .iter()
            .find(|field| !field.is_valid(self.value(field.key).unwrap_or_default()))
    }

    /// Returns `true` when every field passes its validity predicate.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.next_incomplete_field().is_none()
    }

    /// Returns the display title derived from the content.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::CharacterApplication(c) => {
                let name = if c.name.is_empty() { UNNAMED } else { &c.name };
                format!("Character Application ({name})")
            }
        }
    }

    /// Returns the lowercase hex SHA-256 of the content's JSON encoding.
    #[must_use]
    pub fn content_hash(&self) -> String {
        // Serialization of derived Serialize types to bytes is infallible.
        let bytes = serde_json::to_vec(self).expect("RequestContent serialization is infallible");
        format!("{:x}", Sha256::digest(&bytes))
    }
}
