//! Eligibility policy deciding which cached summaries are written out.

use std::collections::HashSet;
use std::hash::Hash;

use regex::Regex;

use crate::error::CacheError;
use crate::model::ProgramModel;

/// Outcome of the eligibility check for one store entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// The entry should be serialized.
    Eligible,
    /// The unit was invalidated by a later decision of the driver.
    Skipped,
    /// The unit's qualified name does not match the configured pattern.
    FilteredOut,
}

/// Name-pattern filter combined with the driver's skip set.
///
/// The pattern must match the whole qualified name of a unit, not a substring.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    source: String,
    pattern: Regex,
}

impl EligibilityFilter {
    /// Compiles `pattern` into a filter.
    pub fn new(pattern: &str) -> Result<Self, CacheError> {
        let invalid = |e: regex::Error| CacheError::InvalidFilter {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        };
        // The bare pattern must compile on its own, or an unbalanced `)` could
        // close the anchoring group early.
        Regex::new(pattern).map_err(invalid)?;
        let anchored = Regex::new(&format!("^(?:{pattern})$")).map_err(invalid)?;
        Ok(Self {
            source: pattern.to_string(),
            pattern: anchored,
        })
    }

    /// The pattern as configured, without anchoring.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// Returns `true` if `qualified_name` matches the pattern in full.
    pub fn matches(&self, qualified_name: &str) -> bool {
        self.pattern.is_match(qualified_name)
    }

    /// Decides whether `unit`, named `qualified_name`, should be persisted.
    ///
    /// Membership in `skip` wins over a name match.
    pub fn check<U: Eq + Hash>(
        &self,
        unit: &U,
        qualified_name: &str,
        skip: &HashSet<U>,
    ) -> Eligibility {
        if skip.contains(unit) {
            Eligibility::Skipped
        } else if self.matches(qualified_name) {
            Eligibility::Eligible
        } else {
            Eligibility::FilteredOut
        }
    }
}

/// Source of units whose handed-out summary was later invalidated.
///
/// The driver reports units whose cached summary stopped reflecting what the
/// analysis actually used (for example because the unit was specialized or
/// inlined differently after the summary was returned). Such units are never
/// persisted.
pub trait SummaryInvalidator<P: ProgramModel> {
    /// Units whose summaries must not be written.
    fn summaries_to_skip(&self) -> HashSet<P::Unit>;
}
