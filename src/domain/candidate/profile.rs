//! Matching profile and preference value objects.
//!
//! The profile is the slice of a user's account that the scorer needs:
//! which languages they speak natively, which they are learning and at
//! what level, their interests and their UTC offset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Lowest and highest UTC offsets in use, in minutes.
pub const MIN_UTC_OFFSET_MINUTES: i32 = -12 * 60;
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Default cap on the CEFR distance between partners.
pub const DEFAULT_MAX_LEVEL_DIFFERENCE: u8 = 2;

// ════════════════════════════════════════════════════════════════════════════
// LanguageCode
// ════════════════════════════════════════════════════════════════════════════

/// Lower-case ISO 639 language code ("en", "es", "yue").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Creates a language code, normalizing to lower case.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the code is blank
    /// - `InvalidFormat` unless it is 2 or 3 ASCII letters
    pub fn new(code: impl AsRef<str>) -> Result<Self, ValidationError> {
        let code = code.as_ref().trim();
        if code.is_empty() {
            return Err(ValidationError::empty_field("language"));
        }
        if !(2..=3).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "language",
                format!("'{}' is not an ISO 639 code", code),
            ));
        }
        Ok(Self(code.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LanguageCode::new(value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl FromStr for LanguageCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageCode::new(s)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CefrLevel
// ════════════════════════════════════════════════════════════════════════════

/// Common European Framework proficiency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// Position on the scale, A1 = 0 through C2 = 5.
    pub fn rank(&self) -> u8 {
        match self {
            CefrLevel::A1 => 0,
            CefrLevel::A2 => 1,
            CefrLevel::B1 => 2,
            CefrLevel::B2 => 3,
            CefrLevel::C1 => 4,
            CefrLevel::C2 => 5,
        }
    }

    /// Number of steps between two levels.
    pub fn distance(&self, other: &CefrLevel) -> u8 {
        self.rank().abs_diff(other.rank())
    }
}

impl FromStr for CefrLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(CefrLevel::A1),
            "A2" => Ok(CefrLevel::A2),
            "B1" => Ok(CefrLevel::B1),
            "B2" => Ok(CefrLevel::B2),
            "C1" => Ok(CefrLevel::C1),
            "C2" => Ok(CefrLevel::C2),
            other => Err(ValidationError::invalid_format(
                "level",
                format!("'{}' is not a CEFR level", other),
            )),
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MatchingProfile
// ════════════════════════════════════════════════════════════════════════════

/// A language being learned and the learner's current level in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetLanguage {
    pub language: LanguageCode,
    pub level: CefrLevel,
}

impl TargetLanguage {
    pub fn new(language: LanguageCode, level: CefrLevel) -> Self {
        Self { language, level }
    }
}

/// Inputs the compatibility scorer reads from a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingProfile {
    native_languages: Vec<LanguageCode>,
    target_languages: Vec<TargetLanguage>,
    interests: BTreeSet<String>,
    utc_offset_minutes: i32,
}

impl MatchingProfile {
    /// Creates a validated profile.
    ///
    /// Interests are trimmed, lower-cased and de-duplicated.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if no native or no target language is given
    /// - `InvalidFormat` if a language is both native and a target
    /// - `OutOfRange` if the UTC offset is outside -12h..+14h
    pub fn new(
        native_languages: Vec<LanguageCode>,
        target_languages: Vec<TargetLanguage>,
        interests: impl IntoIterator<Item = impl AsRef<str>>,
        utc_offset_minutes: i32,
    ) -> Result<Self, ValidationError> {
        if native_languages.is_empty() {
            return Err(ValidationError::empty_field("native_languages"));
        }
        if target_languages.is_empty() {
            return Err(ValidationError::empty_field("target_languages"));
        }
        if let Some(overlap) = target_languages
            .iter()
            .find(|t| native_languages.contains(&t.language))
        {
            return Err(ValidationError::invalid_format(
                "target_languages",
                format!("'{}' is already a native language", overlap.language),
            ));
        }
        if !(MIN_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&utc_offset_minutes) {
            return Err(ValidationError::out_of_range(
                "utc_offset_minutes",
                f64::from(MIN_UTC_OFFSET_MINUTES),
                f64::from(MAX_UTC_OFFSET_MINUTES),
                f64::from(utc_offset_minutes),
            ));
        }

        let interests = interests
            .into_iter()
            .map(|i| i.as_ref().trim().to_lowercase())
            .filter(|i| !i.is_empty())
            .collect();

        Ok(Self {
            native_languages,
            target_languages,
            interests,
            utc_offset_minutes,
        })
    }

    pub fn native_languages(&self) -> &[LanguageCode] {
        &self.native_languages
    }

    pub fn target_languages(&self) -> &[TargetLanguage] {
        &self.target_languages
    }

    pub fn interests(&self) -> &BTreeSet<String> {
        &self.interests
    }

    pub fn utc_offset_minutes(&self) -> i32 {
        self.utc_offset_minutes
    }

    pub fn is_native_speaker(&self, language: &LanguageCode) -> bool {
        self.native_languages.contains(language)
    }

    /// Level in a language being learned, if it is a target.
    pub fn level_in(&self, language: &LanguageCode) -> Option<CefrLevel> {
        self.target_languages
            .iter()
            .find(|t| &t.language == language)
            .map(|t| t.level)
    }

    /// First target language of ours that `other` speaks natively.
    pub fn learnable_from(&self, other: &MatchingProfile) -> Option<&TargetLanguage> {
        self.target_languages
            .iter()
            .find(|t| other.is_native_speaker(&t.language))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MatchingPreferences
// ════════════════════════════════════════════════════════════════════════════

/// Per-candidate overrides of the matchmaking defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingPreferences {
    /// Planned session length; the configured default applies when unset.
    pub preferred_session_minutes: Option<u32>,
    pub max_level_difference: u8,
    pub same_timezone_only: bool,
}

impl Default for MatchingPreferences {
    fn default() -> Self {
        Self {
            preferred_session_minutes: None,
            max_level_difference: DEFAULT_MAX_LEVEL_DIFFERENCE,
            same_timezone_only: false,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn lang(code: &str) -> LanguageCode {
        LanguageCode::new(code).unwrap()
    }

    /// Native `native`, learning `target` at `level`, UTC.
    pub fn profile(native: &str, target: &str, level: CefrLevel) -> MatchingProfile {
        MatchingProfile::new(
            vec![lang(native)],
            vec![TargetLanguage::new(lang(target), level)],
            ["travel", "music"],
            0,
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn language_code_normalizes_case() {
        assert_eq!(LanguageCode::new(" EN ").unwrap().as_str(), "en");
    }

    #[test]
    fn language_code_rejects_bad_format() {
        assert!(matches!(
            LanguageCode::new("english"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            LanguageCode::new(""),
            Err(ValidationError::EmptyField { .. })
        ));
    }

    #[test]
    fn cefr_distance_is_symmetric() {
        assert_eq!(CefrLevel::A2.distance(&CefrLevel::C1), 3);
        assert_eq!(CefrLevel::C1.distance(&CefrLevel::A2), 3);
    }

    #[test]
    fn cefr_parses_case_insensitively() {
        assert_eq!("b2".parse::<CefrLevel>().unwrap(), CefrLevel::B2);
        assert!("D1".parse::<CefrLevel>().is_err());
    }

    #[test]
    fn profile_requires_native_and_target() {
        let err = MatchingProfile::new(vec![], vec![], Vec::<String>::new(), 0).unwrap_err();
        assert_eq!(err, ValidationError::empty_field("native_languages"));
    }

    #[test]
    fn profile_rejects_native_language_as_target() {
        let result = MatchingProfile::new(
            vec![lang("en")],
            vec![TargetLanguage::new(lang("en"), CefrLevel::B1)],
            Vec::<String>::new(),
            0,
        );
        assert!(matches!(result, Err(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn profile_rejects_impossible_offset() {
        let result = MatchingProfile::new(
            vec![lang("en")],
            vec![TargetLanguage::new(lang("es"), CefrLevel::B1)],
            Vec::<String>::new(),
            15 * 60,
        );
        assert!(matches!(result, Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn interests_are_normalized() {
        let p = MatchingProfile::new(
            vec![lang("en")],
            vec![TargetLanguage::new(lang("es"), CefrLevel::B1)],
            [" Music", "music", "", "Film"],
            0,
        )
        .unwrap();
        let interests: Vec<_> = p.interests().iter().cloned().collect();
        assert_eq!(interests, vec!["film".to_string(), "music".to_string()]);
    }

    #[test]
    fn learnable_from_finds_partner_native_language() {
        let en = profile("en", "es", CefrLevel::B1);
        let es = profile("es", "en", CefrLevel::A2);
        assert_eq!(en.learnable_from(&es).unwrap().language, lang("es"));
        assert_eq!(es.level_in(&lang("en")), Some(CefrLevel::A2));
    }

    #[test]
    fn default_preferences_allow_two_levels() {
        let prefs = MatchingPreferences::default();
        assert_eq!(prefs.max_level_difference, 2);
        assert!(!prefs.same_timezone_only);
    }
}
