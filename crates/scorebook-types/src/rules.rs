use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Wickets that end a regular innings.
pub const ALL_OUT_WICKETS: u32 = 10;

/// Wickets that end a super-over innings.
pub const SUPER_OVER_ALL_OUT_WICKETS: u32 = 2;

/// Overs available to each side in a super over.
pub const SUPER_OVER_OVERS: u32 = 1;

/// Playing conditions for one match format.
///
/// Rules are immutable once a match references them: a match keeps its own
/// copy, so changing the registry never alters a match in progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    /// Registry key, e.g. `T20` or `TEST`.
    pub code: String,
    /// Human-readable name.
    pub name: String,
    pub balls_per_over: u32,
    /// `None` means unlimited overs (the longest format).
    pub max_overs: Option<u32>,
    /// Regular innings in a match (2 for limited overs, 4 for Tests).
    pub max_innings: u32,
    pub follow_on_allowed: bool,
    pub super_over_allowed: bool,
}

impl Rules {
    pub fn t20() -> Self {
        Self::limited("T20", "Twenty20", 6, 20)
    }

    pub fn odi() -> Self {
        Self::limited("ODI", "One Day International", 6, 50)
    }

    pub fn t10() -> Self {
        Self::limited("T10", "Ten10", 6, 10)
    }

    /// The Hundred: five-ball overs, one hundred balls per side.
    pub fn hundred() -> Self {
        Self::limited("HUNDRED", "The Hundred", 5, 20)
    }

    pub fn test() -> Self {
        Self {
            code: "TEST".into(),
            name: "Test".into(),
            balls_per_over: 6,
            max_overs: None,
            max_innings: 4,
            follow_on_allowed: true,
            super_over_allowed: false,
        }
    }

    fn limited(code: &str, name: &str, balls_per_over: u32, max_overs: u32) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            balls_per_over,
            max_overs: Some(max_overs),
            max_innings: 2,
            follow_on_allowed: false,
            super_over_allowed: true,
        }
    }

    /// Returns `true` for the unlimited-overs format (Tests).
    pub fn is_longest_format(&self) -> bool {
        self.max_overs.is_none()
    }

    /// Limits that bound a single innings of this format.
    pub fn innings_limits(&self, is_super_over: bool) -> InningsLimits {
        if is_super_over {
            InningsLimits {
                max_overs: Some(SUPER_OVER_OVERS),
                all_out_wickets: SUPER_OVER_ALL_OUT_WICKETS,
            }
        } else {
            InningsLimits {
                max_overs: self.max_overs,
                all_out_wickets: ALL_OUT_WICKETS,
            }
        }
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), TypeError> {
        let invalid = |reason: &str| TypeError::InvalidRules {
            code: self.code.clone(),
            reason: reason.into(),
        };

        if self.code.trim().is_empty() {
            return Err(invalid("code must not be empty"));
        }
        if self.balls_per_over == 0 {
            return Err(invalid("balls_per_over must be positive"));
        }
        if self.max_overs == Some(0) {
            return Err(invalid("max_overs must be positive when set"));
        }
        match (self.is_longest_format(), self.max_innings) {
            (true, 4) | (false, 2) => {}
            _ => {
                return Err(invalid(
                    "max_innings must be 4 for unlimited overs and 2 for limited overs",
                ))
            }
        }
        if self.follow_on_allowed && !self.is_longest_format() {
            return Err(invalid("follow-on is only possible in the longest format"));
        }
        if self.super_over_allowed && self.is_longest_format() {
            return Err(invalid("super overs are not possible in the longest format"));
        }
        Ok(())
    }
}

impl fmt::Display for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_overs {
            Some(overs) => write!(
                f,
                "{} ({} overs, {}-ball overs)",
                self.code, overs, self.balls_per_over
            ),
            None => write!(f, "{} (unlimited overs)", self.code),
        }
    }
}

/// Bounds for one innings, derived from the format and the innings kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InningsLimits {
    pub max_overs: Option<u32>,
    pub all_out_wickets: u32,
}

/// Static registry of match formats keyed by code.
#[derive(Clone, Debug)]
pub struct RulesRegistry {
    formats: BTreeMap<String, Rules>,
}

impl RulesRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            formats: BTreeMap::new(),
        }
    }

    /// A registry holding the built-in formats.
    pub fn builtin() -> Self {
        let mut formats = BTreeMap::new();
        for rules in [
            Rules::t20(),
            Rules::odi(),
            Rules::t10(),
            Rules::hundred(),
            Rules::test(),
        ] {
            formats.insert(rules.code.clone(), rules);
        }
        Self { formats }
    }

    /// Register a custom format. Codes are case-insensitive and unique.
    pub fn register(&mut self, mut rules: Rules) -> Result<(), TypeError> {
        rules.code = rules.code.trim().to_ascii_uppercase();
        rules.validate()?;
        if self.formats.contains_key(&rules.code) {
            return Err(TypeError::DuplicateFormat(rules.code));
        }
        self.formats.insert(rules.code.clone(), rules);
        Ok(())
    }

    /// Look up a format by code.
    pub fn get(&self, code: &str) -> Result<&Rules, TypeError> {
        let key = code.trim().to_ascii_uppercase();
        self.formats
            .get(&key)
            .ok_or(TypeError::UnknownFormat(code.to_string()))
    }

    /// All registered formats, ordered by code.
    pub fn iter(&self) -> impl Iterator<Item = &Rules> {
        self.formats.values()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

impl Default for RulesRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_formats_are_valid() {
        let registry = RulesRegistry::builtin();
        assert_eq!(registry.len(), 5);
        for rules in registry.iter() {
            rules.validate().unwrap();
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = RulesRegistry::builtin();
        assert_eq!(registry.get("t20").unwrap().max_overs, Some(20));
        assert_eq!(registry.get(" Test ").unwrap().max_innings, 4);
    }

    #[test]
    fn unknown_format() {
        let registry = RulesRegistry::builtin();
        assert_eq!(
            registry.get("BEACH").unwrap_err(),
            TypeError::UnknownFormat("BEACH".into())
        );
    }

    #[test]
    fn test_is_longest_format() {
        assert!(Rules::test().is_longest_format());
        assert!(!Rules::odi().is_longest_format());
    }

    #[test]
    fn hundred_uses_five_ball_overs() {
        let rules = Rules::hundred();
        assert_eq!(rules.balls_per_over, 5);
        assert_eq!(rules.max_overs.unwrap() * rules.balls_per_over, 100);
    }

    #[test]
    fn super_over_limits() {
        let limits = Rules::t20().innings_limits(true);
        assert_eq!(limits.max_overs, Some(1));
        assert_eq!(limits.all_out_wickets, 2);

        let regular = Rules::t20().innings_limits(false);
        assert_eq!(regular.max_overs, Some(20));
        assert_eq!(regular.all_out_wickets, 10);
    }

    #[test]
    fn register_custom_format() {
        let mut registry = RulesRegistry::builtin();
        let mut rules = Rules::t20();
        rules.code = "t15".into();
        rules.name = "Fifteen".into();
        rules.max_overs = Some(15);
        registry.register(rules).unwrap();
        assert_eq!(registry.get("T15").unwrap().max_overs, Some(15));
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut registry = RulesRegistry::builtin();
        let err = registry.register(Rules::odi()).unwrap_err();
        assert_eq!(err, TypeError::DuplicateFormat("ODI".into()));
    }

    #[test]
    fn validate_rejects_zero_ball_overs() {
        let mut rules = Rules::t20();
        rules.balls_per_over = 0;
        assert!(matches!(
            rules.validate(),
            Err(TypeError::InvalidRules { .. })
        ));
    }

    #[test]
    fn validate_rejects_limited_overs_follow_on() {
        let mut rules = Rules::odi();
        rules.follow_on_allowed = true;
        assert!(rules.validate().is_err());
    }

    #[test]
    fn validate_rejects_four_innings_limited_overs() {
        let mut rules = Rules::odi();
        rules.max_innings = 4;
        assert!(rules.validate().is_err());
    }

    #[test]
    fn display_format() {
        assert_eq!(Rules::t20().to_string(), "T20 (20 overs, 6-ball overs)");
        assert_eq!(Rules::test().to_string(), "TEST (unlimited overs)");
    }
}
