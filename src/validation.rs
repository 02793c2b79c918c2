// ABOUTME: Write-time validation of submitted ingredient representations
// ABOUTME: Enforces natural-key uniqueness and the single-default-variant invariant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Validation of submitted ingredient drafts.
//!
//! These checks run before any reconciliation or persistence is attempted, so
//! the matcher never sees a draft with ambiguous natural keys through the
//! aggregate endpoints. The checks are pure and side-effect free; referential
//! and format concerns belong to the HTTP boundary.

use std::collections::HashSet;

use crate::errors::{AppError, AppResult};
use crate::models::IngredientDraft;

/// Validate a submitted ingredient draft against the write-time invariants:
/// variant descriptions pairwise distinct, custom-unit names pairwise
/// distinct, at most one default variant.
pub fn validate_ingredient(draft: &IngredientDraft) -> AppResult<()> {
    let mut descriptions = HashSet::new();
    for variant in &draft.variants {
        if !descriptions.insert(variant.description.as_str()) {
            return Err(AppError::invalid_input(
                "Duplicate ingredient variants found",
            ));
        }
    }

    let mut names = HashSet::new();
    for unit in &draft.custom_units {
        if !names.insert(unit.name.as_str()) {
            return Err(AppError::invalid_input("Duplicate custom units found"));
        }
    }

    if draft.variants.iter().filter(|variant| variant.is_default).count() > 1 {
        return Err(AppError::invalid_input(
            "More than one default ingredient variant found",
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::models::{CustomUnitDraft, VariantDraft};

    fn variant(description: &str, is_default: bool) -> VariantDraft {
        VariantDraft {
            id: None,
            description: description.to_owned(),
            is_default,
            unit: None,
            serving_size: None,
            calories: None,
            carbohydrate: None,
            fat: None,
            protein: None,
            saturated_fat: None,
            sodium: None,
            sugar: None,
        }
    }

    fn custom_unit(name: &str) -> CustomUnitDraft {
        CustomUnitDraft {
            id: None,
            name: name.to_owned(),
            conversion_factor: None,
            conversion_unit: None,
        }
    }

    fn draft(variants: Vec<VariantDraft>, custom_units: Vec<CustomUnitDraft>) -> IngredientDraft {
        IngredientDraft {
            id: None,
            name: "Butter".to_owned(),
            weight_to_volume_factor: None,
            conversion_weight_unit: None,
            conversion_volume_unit: None,
            variants,
            custom_units,
        }
    }

    #[test]
    fn accepts_distinct_keys_and_a_single_default() {
        let draft = draft(
            vec![variant("slice", true), variant("stick", false)],
            vec![custom_unit("knob")],
        );

        assert!(validate_ingredient(&draft).is_ok());
    }

    #[test]
    fn rejects_duplicate_variant_descriptions() {
        let draft = draft(vec![variant("slice", false), variant("slice", false)], vec![]);

        let error = validate_ingredient(&draft).unwrap_err();
        assert_eq!(error.code, ErrorCode::InvalidInput);
        assert_eq!(error.message, "Duplicate ingredient variants found");
    }

    #[test]
    fn rejects_duplicate_custom_unit_names() {
        let draft = draft(vec![], vec![custom_unit("knob"), custom_unit("knob")]);

        let error = validate_ingredient(&draft).unwrap_err();
        assert_eq!(error.code, ErrorCode::InvalidInput);
        assert_eq!(error.message, "Duplicate custom units found");
    }

    #[test]
    fn rejects_more_than_one_default_variant() {
        let draft = draft(vec![variant("slice", true), variant("stick", true)], vec![]);

        let error = validate_ingredient(&draft).unwrap_err();
        assert_eq!(error.code, ErrorCode::InvalidInput);
        assert_eq!(error.message, "More than one default ingredient variant found");
    }

    #[test]
    fn empty_draft_is_valid() {
        assert!(validate_ingredient(&draft(vec![], vec![])).is_ok());
    }
}
