// ABOUTME: Aggregate reconciler merging a submitted ingredient representation into the persisted one
// ABOUTME: Applies the key matcher per nested collection and copies fields in place
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Aggregate reconciliation.
//!
//! A whole-ingredient update replaces the scalar fields and reconciles both
//! nested collections against the submitted draft: persisted items whose
//! natural key disappeared are dropped, items whose key matched are updated in
//! place (surrogate id and parent link preserved), and the rest are created
//! fresh, bound to the persisted parent. The draft is validated first and is
//! never mutated; on a validation error the persisted aggregate is untouched.

use std::mem;

use crate::errors::AppResult;
use crate::matcher::match_by_key;
use crate::models::{
    CustomUnit, CustomUnitDraft, Ingredient, IngredientDraft, IngredientVariant, VariantDraft,
};
use crate::validation::validate_ingredient;

/// Merge a submitted draft into the persisted aggregate.
///
/// After a successful call the nested collections contain exactly one item per
/// distinct key in the draft, with pre-existing identity preserved wherever
/// the key matched. The caller is responsible for persisting the result.
///
/// # Errors
///
/// Returns the validation error when the draft violates a write-time
/// invariant; the aggregate is left unchanged in that case.
pub fn reconcile(ingredient: &mut Ingredient, draft: &IngredientDraft) -> AppResult<()> {
    validate_ingredient(draft)?;

    apply_ingredient(ingredient, draft);

    let persisted_variants = mem::take(&mut ingredient.variants);
    let matched = match_by_key(
        persisted_variants,
        |variant| variant.description.clone(),
        draft.variants.clone(),
        |submitted| submitted.description.clone(),
    );
    let mut variants = Vec::with_capacity(matched.to_update.len() + matched.to_create.len());
    for (mut variant, submitted) in matched.to_update {
        apply_variant(&mut variant, &submitted);
        variants.push(variant);
    }
    for submitted in matched.to_create {
        variants.push(IngredientVariant::from_draft(&submitted, ingredient.id));
    }
    ingredient.variants = variants;

    let persisted_units = mem::take(&mut ingredient.custom_units);
    let matched = match_by_key(
        persisted_units,
        |unit| unit.name.clone(),
        draft.custom_units.clone(),
        |submitted| submitted.name.clone(),
    );
    let mut custom_units = Vec::with_capacity(matched.to_update.len() + matched.to_create.len());
    for (mut unit, submitted) in matched.to_update {
        apply_custom_unit(&mut unit, &submitted);
        custom_units.push(unit);
    }
    for submitted in matched.to_create {
        custom_units.push(CustomUnit::from_draft(&submitted, ingredient.id));
    }
    ingredient.custom_units = custom_units;

    Ok(())
}

/// Copy the submitted scalar fields onto the persisted ingredient.
fn apply_ingredient(ingredient: &mut Ingredient, draft: &IngredientDraft) {
    ingredient.name = draft.name.clone();
    ingredient.weight_to_volume_factor = draft.weight_to_volume_factor;
    ingredient.conversion_weight_unit = draft.conversion_weight_unit;
    ingredient.conversion_volume_unit = draft.conversion_volume_unit;
}

/// Copy all submitted fields of a variant onto the persisted one, keeping its
/// surrogate id and parent link.
pub fn apply_variant(variant: &mut IngredientVariant, draft: &VariantDraft) {
    variant.description = draft.description.clone();
    variant.is_default = draft.is_default;
    variant.unit = draft.unit;
    variant.serving_size = draft.serving_size;
    variant.calories = draft.calories;
    variant.carbohydrate = draft.carbohydrate;
    variant.fat = draft.fat;
    variant.protein = draft.protein;
    variant.saturated_fat = draft.saturated_fat;
    variant.sodium = draft.sodium;
    variant.sugar = draft.sugar;
}

/// Copy all submitted fields of a custom unit onto the persisted one, keeping
/// its surrogate id and parent link.
pub fn apply_custom_unit(unit: &mut CustomUnit, draft: &CustomUnitDraft) {
    unit.name = draft.name.clone();
    unit.conversion_factor = draft.conversion_factor;
    unit.conversion_unit = draft.conversion_unit;
}
