// ABOUTME: Unit tests for the aggregate reconciler
// ABOUTME: Tests key-based merging of submitted representations onto persisted ingredients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::Utc;
use pantry_server::errors::ErrorCode;
use pantry_server::models::{
    CustomUnit, CustomUnitDraft, Ingredient, IngredientDraft, IngredientVariant, MassUnit, Unit,
    VariantDraft, VolumeUnit,
};
use pantry_server::reconcile::reconcile;
use uuid::Uuid;

// ============================================================================
// Test Helpers
// ============================================================================

fn persisted_ingredient(name: &str) -> Ingredient {
    let now = Utc::now();
    Ingredient {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        weight_to_volume_factor: None,
        conversion_weight_unit: None,
        conversion_volume_unit: None,
        variants: Vec::new(),
        custom_units: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

fn persisted_variant(ingredient_id: Uuid, description: &str, is_default: bool) -> IngredientVariant {
    IngredientVariant {
        id: Uuid::new_v4(),
        ingredient_id,
        description: description.to_owned(),
        is_default,
        unit: Some(Unit::Mass(MassUnit::Gram)),
        serving_size: Some(100.0),
        calories: Some(150.0),
        carbohydrate: None,
        fat: None,
        protein: None,
        saturated_fat: None,
        sodium: None,
        sugar: None,
    }
}

fn persisted_custom_unit(ingredient_id: Uuid, name: &str) -> CustomUnit {
    CustomUnit {
        id: Uuid::new_v4(),
        ingredient_id,
        name: name.to_owned(),
        conversion_factor: Some(2.5),
        conversion_unit: Some(Unit::Volume(VolumeUnit::Tablespoon)),
    }
}

fn variant_draft(description: &str) -> VariantDraft {
    VariantDraft {
        id: None,
        description: description.to_owned(),
        is_default: false,
        unit: Some(Unit::Mass(MassUnit::Gram)),
        serving_size: Some(100.0),
        calories: Some(150.0),
        carbohydrate: None,
        fat: None,
        protein: None,
        saturated_fat: None,
        sodium: None,
        sugar: None,
    }
}

fn custom_unit_draft(name: &str) -> CustomUnitDraft {
    CustomUnitDraft {
        id: None,
        name: name.to_owned(),
        conversion_factor: Some(2.5),
        conversion_unit: Some(Unit::Volume(VolumeUnit::Tablespoon)),
    }
}

fn draft_for(ingredient: &Ingredient) -> IngredientDraft {
    IngredientDraft {
        id: None,
        name: ingredient.name.clone(),
        weight_to_volume_factor: ingredient.weight_to_volume_factor,
        conversion_weight_unit: ingredient.conversion_weight_unit,
        conversion_volume_unit: ingredient.conversion_volume_unit,
        variants: ingredient
            .variants
            .iter()
            .map(|variant| VariantDraft {
                id: None,
                description: variant.description.clone(),
                is_default: variant.is_default,
                unit: variant.unit,
                serving_size: variant.serving_size,
                calories: variant.calories,
                carbohydrate: variant.carbohydrate,
                fat: variant.fat,
                protein: variant.protein,
                saturated_fat: variant.saturated_fat,
                sodium: variant.sodium,
                sugar: variant.sugar,
            })
            .collect(),
        custom_units: ingredient
            .custom_units
            .iter()
            .map(|unit| CustomUnitDraft {
                id: None,
                name: unit.name.clone(),
                conversion_factor: unit.conversion_factor,
                conversion_unit: unit.conversion_unit,
            })
            .collect(),
    }
}

// ============================================================================
// Scalar Fields
// ============================================================================

#[test]
fn copies_scalar_fields_onto_the_persisted_ingredient() {
    let mut ingredient = persisted_ingredient("Buttr");
    let original_id = ingredient.id;

    let draft = IngredientDraft {
        id: None,
        name: "Butter".to_owned(),
        weight_to_volume_factor: Some(0.96),
        conversion_weight_unit: Some(MassUnit::Gram),
        conversion_volume_unit: Some(VolumeUnit::Milliliter),
        variants: Vec::new(),
        custom_units: Vec::new(),
    };

    reconcile(&mut ingredient, &draft).unwrap();

    assert_eq!(ingredient.id, original_id);
    assert_eq!(ingredient.name, "Butter");
    assert_eq!(ingredient.weight_to_volume_factor, Some(0.96));
    assert_eq!(ingredient.conversion_weight_unit, Some(MassUnit::Gram));
    assert_eq!(ingredient.conversion_volume_unit, Some(VolumeUnit::Milliliter));
}

#[test]
fn clears_scalar_fields_absent_from_the_submission() {
    let mut ingredient = persisted_ingredient("Butter");
    ingredient.weight_to_volume_factor = Some(0.96);
    ingredient.conversion_weight_unit = Some(MassUnit::Gram);

    let draft = IngredientDraft {
        id: None,
        name: "Butter".to_owned(),
        weight_to_volume_factor: None,
        conversion_weight_unit: None,
        conversion_volume_unit: None,
        variants: Vec::new(),
        custom_units: Vec::new(),
    };

    reconcile(&mut ingredient, &draft).unwrap();

    assert_eq!(ingredient.weight_to_volume_factor, None);
    assert_eq!(ingredient.conversion_weight_unit, None);
}

// ============================================================================
// Variant Reconciliation
// ============================================================================

#[test]
fn merges_variants_by_description() {
    // Persisted: A (default) and B. Submitted: B with changed calories, plus new C.
    let mut ingredient = persisted_ingredient("Cheese");
    let variant_a = persisted_variant(ingredient.id, "block", true);
    let variant_b = persisted_variant(ingredient.id, "slice", false);
    let b_id = variant_b.id;
    ingredient.variants = vec![variant_a, variant_b];

    let mut updated_b = variant_draft("slice");
    updated_b.calories = Some(42.0);
    let draft = IngredientDraft {
        variants: vec![updated_b, variant_draft("cube")],
        ..draft_for(&persisted_ingredient("Cheese"))
    };

    reconcile(&mut ingredient, &draft).unwrap();

    assert_eq!(ingredient.variants.len(), 2);

    let slice = ingredient
        .variants
        .iter()
        .find(|v| v.description == "slice")
        .expect("updated variant survives");
    assert_eq!(slice.id, b_id, "matched variant keeps its surrogate id");
    assert_eq!(slice.calories, Some(42.0));

    let cube = ingredient
        .variants
        .iter()
        .find(|v| v.description == "cube")
        .expect("new variant created");
    assert_ne!(cube.id, b_id);
    assert_eq!(cube.ingredient_id, ingredient.id, "new variant bound to parent");

    assert!(
        !ingredient.variants.iter().any(|v| v.description == "block"),
        "unmatched persisted variant is deleted"
    );
}

#[test]
fn empty_submission_deletes_all_variants() {
    let mut ingredient = persisted_ingredient("Milk");
    ingredient.variants = vec![
        persisted_variant(ingredient.id, "cup", false),
        persisted_variant(ingredient.id, "glass", false),
        persisted_variant(ingredient.id, "splash", false),
    ];

    let draft = draft_for(&persisted_ingredient("Milk"));
    reconcile(&mut ingredient, &draft).unwrap();

    assert!(ingredient.variants.is_empty());
}

#[test]
fn submitted_ids_are_ignored_for_matching() {
    let mut ingredient = persisted_ingredient("Flour");
    let variant = persisted_variant(ingredient.id, "scoop", false);
    let persisted_id = variant.id;
    ingredient.variants = vec![variant];

    let mut submitted = variant_draft("scoop");
    submitted.id = Some(Uuid::new_v4());
    submitted.serving_size = Some(30.0);
    let draft = IngredientDraft {
        variants: vec![submitted],
        ..draft_for(&persisted_ingredient("Flour"))
    };

    reconcile(&mut ingredient, &draft).unwrap();

    assert_eq!(ingredient.variants.len(), 1);
    assert_eq!(ingredient.variants[0].id, persisted_id);
    assert_eq!(ingredient.variants[0].serving_size, Some(30.0));
}

// ============================================================================
// Custom Unit Reconciliation
// ============================================================================

#[test]
fn merges_custom_units_by_name() {
    let mut ingredient = persisted_ingredient("Butter");
    let knob = persisted_custom_unit(ingredient.id, "knob");
    let pat = persisted_custom_unit(ingredient.id, "pat");
    let knob_id = knob.id;
    ingredient.custom_units = vec![knob, pat];

    let mut updated_knob = custom_unit_draft("knob");
    updated_knob.conversion_factor = Some(3.0);
    let draft = IngredientDraft {
        custom_units: vec![updated_knob, custom_unit_draft("stick")],
        ..draft_for(&persisted_ingredient("Butter"))
    };

    reconcile(&mut ingredient, &draft).unwrap();

    assert_eq!(ingredient.custom_units.len(), 2);

    let knob = ingredient
        .custom_units
        .iter()
        .find(|u| u.name == "knob")
        .expect("updated unit survives");
    assert_eq!(knob.id, knob_id);
    assert_eq!(knob.conversion_factor, Some(3.0));

    let stick = ingredient
        .custom_units
        .iter()
        .find(|u| u.name == "stick")
        .expect("new unit created");
    assert_eq!(stick.ingredient_id, ingredient.id);

    assert!(!ingredient.custom_units.iter().any(|u| u.name == "pat"));
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn identical_submission_is_a_noop() {
    let mut ingredient = persisted_ingredient("Yoghurt");
    ingredient.variants = vec![
        persisted_variant(ingredient.id, "pot", true),
        persisted_variant(ingredient.id, "spoonful", false),
    ];
    ingredient.custom_units = vec![persisted_custom_unit(ingredient.id, "dollop")];

    let draft = draft_for(&ingredient);
    let before = ingredient.clone();

    reconcile(&mut ingredient, &draft).unwrap();

    assert_eq!(ingredient, before);
}

#[test]
fn second_pass_with_the_same_submission_changes_nothing() {
    let mut ingredient = persisted_ingredient("Cream");
    ingredient.variants = vec![persisted_variant(ingredient.id, "splash", false)];

    let mut submitted = variant_draft("splash");
    submitted.calories = Some(55.0);
    let draft = IngredientDraft {
        variants: vec![submitted, variant_draft("dash")],
        ..draft_for(&persisted_ingredient("Cream"))
    };

    reconcile(&mut ingredient, &draft).unwrap();
    let after_first = ingredient.clone();

    reconcile(&mut ingredient, &draft).unwrap();

    assert_eq!(ingredient, after_first, "ids and fields survive a second pass");
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn validation_failure_leaves_the_aggregate_untouched() {
    let mut ingredient = persisted_ingredient("Eggs");
    ingredient.variants = vec![persisted_variant(ingredient.id, "large", true)];
    let before = ingredient.clone();

    let draft = IngredientDraft {
        variants: vec![variant_draft("slice"), variant_draft("slice")],
        ..draft_for(&persisted_ingredient("Eggs"))
    };

    let error = reconcile(&mut ingredient, &draft).unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidInput);
    assert_eq!(error.message, "Duplicate ingredient variants found");
    assert_eq!(ingredient, before);
}

#[test]
fn multiple_default_variants_are_rejected() {
    let mut ingredient = persisted_ingredient("Bread");

    let mut first = variant_draft("slice");
    first.is_default = true;
    let mut second = variant_draft("loaf");
    second.is_default = true;
    let draft = IngredientDraft {
        variants: vec![first, second],
        ..draft_for(&persisted_ingredient("Bread"))
    };

    let error = reconcile(&mut ingredient, &draft).unwrap_err();
    assert_eq!(error.message, "More than one default ingredient variant found");
}
