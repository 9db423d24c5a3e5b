use thiserror::Error;

/// Raised when a stored or user-supplied string is not part of a closed
/// vocabulary (statuses, collection kinds, dependency kinds, item types).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{value}': expected one of {expected}")]
pub struct ParseVocabularyError {
    kind: &'static str,
    value: String,
    expected: String,
}

impl ParseVocabularyError {
    pub fn new<'a>(
        kind: &'static str,
        value: &str,
        expected: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected: expected.into_iter().collect::<Vec<_>>().join(", "),
        }
    }
}

/// Implements the string plumbing shared by every closed vocabulary: the
/// canonical spelling, `Display`/`FromStr`, serde as a plain string, and
/// SQLite column conversion. Parsing ignores ASCII case and accepts `-` for `_`.
macro_rules! closed_vocabulary {
    ($name:ident, $kind:literal, [$($variant:ident => $text:literal),+ $(,)?]) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::ParseVocabularyError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let normalized = value.trim().replace('-', "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(&normalized))
                    .ok_or_else(|| {
                        $crate::domain::ParseVocabularyError::new(
                            $kind,
                            value,
                            $name::ALL.iter().map(|candidate| candidate.as_str()),
                        )
                    })
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|err| rusqlite::types::FromSqlError::Other(Box::new(err)))
            }
        }
    };
}

pub mod collection_kind;
pub mod dependency_kind;
pub mod item_ref;
pub mod metadata;
pub mod status;
pub mod timestamp;

pub use collection_kind::{CollectionSubType, CollectionType};
pub use dependency_kind::{CreatedBy, DependencyType};
pub use item_ref::{ItemKind, ItemRef, TemplateRef, TrackedItem};
pub use metadata::Metadata;
pub use status::ItemStatus;
