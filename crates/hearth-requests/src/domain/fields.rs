//! Field registry for request types.
//!
//! Each request type declares an ordered list of fields. A field carries a
//! sanitizer (strip every character outside its allowed set) and a validity
//! predicate (length bounds in bytes, no disallowed characters, and for
//! enumerated fields an exact match against the options).

use std::fmt;
use std::sync::LazyLock;

use hearth_core::error::DomainError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Capability that lets an actor review character applications.
pub const REVIEW_CHARACTER_APPLICATIONS: &str = "review-character-applications";

/// Accepted values for the character application gender field.
pub const GENDER_OPTIONS: [&str; 3] = ["Male", "Female", "NonBinary"];

static NAME_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z'\-]+").expect("valid regex"));

static NON_LETTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z]+").expect("valid regex"));

static SHORT_DESCRIPTION_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z, \-]+").expect("valid regex"));

static DESCRIPTION_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z, '\-.!()]+").expect("valid regex"));

/// Free-form prose: backstories and review comments.
pub(crate) static PROSE_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^a-zA-Z, "'\-.?!()\r\n]+"#).expect("valid regex"));

/// Sanitizer and validity predicate shared by fields and comment text.
#[derive(Debug, Clone, Copy)]
pub struct TextRule {
    min_len: usize,
    max_len: usize,
    disallowed: &'static LazyLock<Regex>,
    options: &'static [&'static str],
}

impl TextRule {
    /// A rule that bounds length and restricts the character set.
    #[must_use]
    pub(crate) const fn new(
        min_len: usize,
        max_len: usize,
        disallowed: &'static LazyLock<Regex>,
    ) -> Self {
        Self {
            min_len,
            max_len,
            disallowed,
            options: &[],
        }
    }

    /// Strips every character outside the allowed set.
    #[must_use]
    pub fn sanitize(&self, raw: &str) -> String {
        self.disallowed.replace_all(raw, "").into_owned()
    }

    /// Returns `true` if `value` satisfies the rule.
    #[must_use]
    pub fn is_valid(&self, value: &str) -> bool {
        self.check(value).is_none()
    }

    /// Returns the minimum length in bytes.
    #[must_use]
    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Returns the maximum length in bytes.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    fn check(&self, value: &str) -> Option<String> {
        if !self.options.is_empty() {
            if self.options.contains(&value) {
                return None;
            }
            return Some(format!("must be one of {}", self.options.join(", ")));
        }
        if value.len() < self.min_len || value.len() > self.max_len {
            return Some(format!(
                "must be between {} and {} characters",
                self.min_len, self.max_len
            ));
        }
        if self.disallowed.is_match(value) {
            return Some("contains disallowed characters".to_owned());
        }
        None
    }
}

/// A single editable field of a request type.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Stable field key used in commands, comments, and content.
    pub key: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Guidance shown to the author.
    pub description: &'static str,
    /// Sanitizer and validity predicate.
    pub rule: TextRule,
}

impl FieldSpec {
    /// Strips characters this field does not allow.
    #[must_use]
    pub fn sanitize(&self, raw: &str) -> String {
        self.rule.sanitize(raw)
    }

    /// Returns `true` if `value` is an acceptable value for this field.
    #[must_use]
    pub fn is_valid(&self, value: &str) -> bool {
        self.rule.is_valid(value)
    }

    /// Validates an already-sanitized value.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the field and the failed bound.
    pub fn validate(&self, value: &str) -> Result<(), DomainError> {
        match self.rule.check(value) {
            None => Ok(()),
            Some(reason) => Err(DomainError::Validation(format!("{} {reason}", self.key))),
        }
    }
}

static CHARACTER_APPLICATION_FIELDS: [FieldSpec; 5] = [
    FieldSpec {
        key: "name",
        label: "Name",
        description: "Your character's name",
        rule: TextRule::new(4, 16, &NAME_DISALLOWED),
    },
    FieldSpec {
        key: "gender",
        label: "Gender",
        description: "Determines the pronouns used in third-person descriptions",
        rule: TextRule {
            min_len: 4,
            max_len: 9,
            disallowed: &NON_LETTERS,
            options: &GENDER_OPTIONS,
        },
    },
    FieldSpec {
        key: "short_description",
        label: "Short Description",
        description: "How your character appears in third-person descriptions",
        rule: TextRule::new(8, 300, &SHORT_DESCRIPTION_DISALLOWED),
    },
    FieldSpec {
        key: "description",
        label: "Description",
        description: "How your character appears when examined",
        rule: TextRule::new(32, 2000, &DESCRIPTION_DISALLOWED),
    },
    FieldSpec {
        key: "backstory",
        label: "Backstory",
        description: "Your character's private backstory",
        rule: TextRule::new(500, 10_000, &PROSE_DISALLOWED),
    },
];

/// The closed set of request types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// A player's application for a new character.
    CharacterApplication,
}

impl RequestKind {
    /// Every request kind.
    pub const ALL: &'static [Self] = &[Self::CharacterApplication];

    /// Returns the wire name of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CharacterApplication => "character_application",
        }
    }

    /// Returns the ordered field list for this kind.
    #[must_use]
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::CharacterApplication => &CHARACTER_APPLICATION_FIELDS,
        }
    }

    /// Looks up a field by key.
    #[must_use]
    pub fn field(self, key: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.key == key)
    }

    /// Looks up a field by key, failing for keys the kind does not declare.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the field is unknown.
    pub fn require_field(self, key: &str) -> Result<&'static FieldSpec, DomainError> {
        self.field(key).ok_or_else(|| {
            DomainError::Validation(format!("unknown field {key:?} for {}", self.as_str()))
        })
    }

    /// Returns the capability a reviewer of this kind must hold.
    #[must_use]
    pub fn reviewer_capability(self) -> &'static str {
        match self {
            Self::CharacterApplication => REVIEW_CHARACTER_APPLICATIONS,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
