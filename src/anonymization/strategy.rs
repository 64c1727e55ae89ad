//! Category to substitution strategy dispatch
//!
//! A column flagged with several categories is substituted with exactly one
//! strategy: the first entry of [`STRATEGY_PRIORITY`] whose category the column
//! carries. Columns carrying none of them fall back to masking domain terms
//! inside the text.

use crate::anonymization::synth::SyntheticKind;
use crate::detection::Category;
use serde::{Deserialize, Serialize};

/// How the values of a sensitive column are replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Shift every parseable date by the store's day offset
    ShiftDate,
    /// Replace with a prefixed truncated SHA-256 digest
    HashIdentifier,
    SubstituteName,
    SubstitutePlace,
    SubstituteEmail,
    SubstitutePhone,
    SubstituteOrganization,
    /// Replace flagged spans inside free text with masked terms
    MaskDomainTerms,
}

/// Ordered category -> strategy table; first match wins
pub const STRATEGY_PRIORITY: &[(Category, Strategy)] = &[
    (Category::Date, Strategy::ShiftDate),
    (Category::Identifier, Strategy::HashIdentifier),
    (Category::Person, Strategy::SubstituteName),
    (Category::Location, Strategy::SubstitutePlace),
    (Category::Email, Strategy::SubstituteEmail),
    (Category::Phone, Strategy::SubstitutePhone),
    (Category::Organization, Strategy::SubstituteOrganization),
];

impl Strategy {
    /// Strategy for a column carrying `categories`
    pub fn for_categories(categories: &[Category]) -> Self {
        STRATEGY_PRIORITY
            .iter()
            .find(|(category, _)| categories.contains(category))
            .map(|(_, strategy)| *strategy)
            .unwrap_or(Strategy::MaskDomainTerms)
    }

    /// Synthetic value kind for whole-value substitutions
    pub fn synthetic_kind(&self) -> Option<SyntheticKind> {
        match self {
            Strategy::SubstituteName => Some(SyntheticKind::Name),
            Strategy::SubstitutePlace => Some(SyntheticKind::City),
            Strategy::SubstituteEmail => Some(SyntheticKind::Email),
            Strategy::SubstitutePhone => Some(SyntheticKind::Phone),
            Strategy::SubstituteOrganization => Some(SyntheticKind::Company),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ShiftDate => "shift_date",
            Strategy::HashIdentifier => "hash_identifier",
            Strategy::SubstituteName => "substitute_name",
            Strategy::SubstitutePlace => "substitute_place",
            Strategy::SubstituteEmail => "substitute_email",
            Strategy::SubstitutePhone => "substitute_phone",
            Strategy::SubstituteOrganization => "substitute_organization",
            Strategy::MaskDomainTerms => "mask_domain_terms",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
