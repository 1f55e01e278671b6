//! Language codes understood by the WebAPI

use std::fmt;

use serde::{Deserialize, Serialize};

/// Locale identifier (LCID) used to pick localized values.
///
/// Any numeric code is accepted; the constants cover the languages a stock
/// installation ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(pub u32);

impl LanguageCode {
    /// 2052, the default.
    pub const SIMPLIFIED_CHINESE: Self = Self(2052);
    /// 1033.
    pub const ENGLISH: Self = Self(1033);
    /// 3076.
    pub const TRADITIONAL_CHINESE: Self = Self(3076);

    /// Numeric LCID.
    pub fn code(self) -> u32 {
        self.0
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self::SIMPLIFIED_CHINESE
    }
}

impl From<u32> for LanguageCode {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
