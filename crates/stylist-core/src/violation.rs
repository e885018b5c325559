//! Violation records handed to whatever displays them

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kinds of discrepancy, each with a stable numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum ViolationCode {
    /// A style document has the wrong shape
    InvalidStyle,
    /// A style could not be fetched or parsed; nothing else ran
    StyleUnavailable,
    /// A style needs a newer stylist
    MinimumVersion,
    /// A style describes a file no adapter handles
    UnknownFile,
    FileShouldExist,
    FileShouldNotExist,
    /// A described file was missing and is created from the style
    FileCreated,
    /// The target file could not be parsed in its own format
    TargetParse,
    MissingValues,
    DifferentValues,
    /// Records matched by unique key need adding or updating
    RecordsUpdate,
    /// A comma-joined set lacks members
    CommaMembers,
}

impl ViolationCode {
    pub const ALL: [ViolationCode; 12] = [
        Self::InvalidStyle,
        Self::StyleUnavailable,
        Self::MinimumVersion,
        Self::UnknownFile,
        Self::FileShouldExist,
        Self::FileShouldNotExist,
        Self::FileCreated,
        Self::TargetParse,
        Self::MissingValues,
        Self::DifferentValues,
        Self::RecordsUpdate,
        Self::CommaMembers,
    ];

    pub fn as_u16(self) -> u16 {
        match self {
            Self::InvalidStyle => 1,
            Self::StyleUnavailable => 2,
            Self::MinimumVersion => 3,
            Self::UnknownFile => 4,
            Self::FileShouldExist => 103,
            Self::FileShouldNotExist => 104,
            Self::FileCreated => 301,
            Self::TargetParse => 302,
            Self::MissingValues => 308,
            Self::DifferentValues => 309,
            Self::RecordsUpdate => 310,
            Self::CommaMembers => 322,
        }
    }

    /// Whether the violation concerns the style rather than a target file
    pub fn is_style_problem(self) -> bool {
        self.as_u16() < 100
    }
}

impl From<ViolationCode> for u16 {
    fn from(code: ViolationCode) -> Self {
        code.as_u16()
    }
}

impl TryFrom<u16> for ViolationCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_u16() == value)
            .ok_or_else(|| format!("unknown violation code {value}"))
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "STY{:03}", self.as_u16())
    }
}

/// A single detected problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Target file name, or the style reference for style problems
    pub file: String,
    pub code: ViolationCode,
    pub message: String,
    /// What the file should contain, rendered in the file's own format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Whether fix mode already resolved it
    #[serde(default)]
    pub fixed: bool,
}

impl Violation {
    pub fn new(file: impl Into<String>, code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            code,
            message: message.into(),
            suggestion: None,
            fixed: false,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        let suggestion = suggestion.into();
        if !suggestion.trim().is_empty() {
            self.suggestion = Some(suggestion);
        }
        self
    }

    pub fn with_fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.file, self.code, self.message)?;
        if self.fixed {
            write!(f, " (fixed)")?;
        }
        Ok(())
    }
}
