/// Errors that can occur when creating validated identifier and code types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypesError {
    /// The input text was empty or contained only whitespace
    #[error("subject identifier cannot be empty")]
    EmptySubjectId,
}

/// A subject identifier taken from a diagnoses table.
///
/// The input is trimmed of leading and trailing whitespace during construction, so
/// `" 10001 "` and `"10001"` name the same subject.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a new `SubjectId` from the given input.
    ///
    /// # Returns
    ///
    /// Returns `Ok(SubjectId)` if the trimmed input is non-empty,
    /// or `Err(TypesError::EmptySubjectId)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::EmptySubjectId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SubjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for SubjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for SubjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SubjectId::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A normalised ICD diagnosis code.
///
/// Codes are trimmed and upper-cased. Blank cells and the literal `NAN` (how missing values
/// come out of spreadsheet exports) are treated as absent rather than as codes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IcdCode(String);

impl IcdCode {
    /// Normalises a raw code cell.
    ///
    /// # Returns
    ///
    /// `None` when the cell is missing, otherwise the trimmed, upper-cased code. No check is
    /// made against any vocabulary here; whitelisting is the caller's concern.
    pub fn normalise(raw: impl AsRef<str>) -> Option<Self> {
        let code = raw.as_ref().trim().to_uppercase();
        if code.is_empty() || code == "NAN" {
            return None;
        }
        Some(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this code appears in `set`.
    pub fn is_in(&self, set: &[&str]) -> bool {
        set.contains(&self.0.as_str())
    }
}

impl std::fmt::Display for IcdCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IcdCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for IcdCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}
