// ABOUTME: Domain model for the ingredient catalog
// ABOUTME: Defines ingredients, nutrition variants, custom units and the closed unit enumeration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Data Models
//!
//! Core data structures for the ingredient catalog: the persisted aggregate
//! (`Ingredient` with its `IngredientVariant` and `CustomUnit` collections),
//! the submitted representations (`IngredientDraft` and friends) accepted at
//! the API boundary, and the closed set of measurement units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Mass units an ingredient quantity can be expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassUnit {
    Gram,
    Milligram,
    Kilogram,
    Ounce,
    Pound,
}

impl MassUnit {
    /// Symbolic name stored in the database and used on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gram => "gram",
            Self::Milligram => "milligram",
            Self::Kilogram => "kilogram",
            Self::Ounce => "ounce",
            Self::Pound => "pound",
        }
    }

    /// Parse from the symbolic name, `None` for anything outside the closed set
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gram" => Some(Self::Gram),
            "milligram" => Some(Self::Milligram),
            "kilogram" => Some(Self::Kilogram),
            "ounce" => Some(Self::Ounce),
            "pound" => Some(Self::Pound),
            _ => None,
        }
    }
}

/// Volume units an ingredient quantity can be expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeUnit {
    Milliliter,
    Liter,
    FluidOunce,
    Teaspoon,
    Tablespoon,
    Cup,
}

impl VolumeUnit {
    /// Symbolic name stored in the database and used on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Milliliter => "milliliter",
            Self::Liter => "liter",
            Self::FluidOunce => "fluid_ounce",
            Self::Teaspoon => "teaspoon",
            Self::Tablespoon => "tablespoon",
            Self::Cup => "cup",
        }
    }

    /// Parse from the symbolic name, `None` for anything outside the closed set
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "milliliter" => Some(Self::Milliliter),
            "liter" => Some(Self::Liter),
            "fluid_ounce" => Some(Self::FluidOunce),
            "teaspoon" => Some(Self::Teaspoon),
            "tablespoon" => Some(Self::Tablespoon),
            "cup" => Some(Self::Cup),
            _ => None,
        }
    }
}

/// The full closed unit set as a tagged union over its mass and volume halves.
///
/// Every unit is either a mass or a volume unit; match exhaustiveness keeps the
/// two halves and the combined set in sync without a manual reverse mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// A unit of mass (gram, ounce, ...)
    Mass(MassUnit),
    /// A unit of volume (liter, cup, ...)
    Volume(VolumeUnit),
}

impl Unit {
    /// Symbolic name stored in the database and used on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mass(unit) => unit.as_str(),
            Self::Volume(unit) => unit.as_str(),
        }
    }

    /// Parse from the symbolic name, `None` for anything outside the closed set
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        MassUnit::parse(s)
            .map(Self::Mass)
            .or_else(|| VolumeUnit::parse(s).map(Self::Volume))
    }
}

// Units travel as flat strings ("gram", "cup"), not as tagged objects.
impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::parse(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown unit: {name}")))
    }
}

/// A catalog ingredient together with its owned nested collections
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    /// Surrogate identifier, assigned on creation and immutable thereafter
    pub id: Uuid,
    /// Unique display name
    pub name: String,
    /// Optional factor converting between the weight and volume units below
    pub weight_to_volume_factor: Option<f64>,
    /// Weight unit the conversion factor is expressed in
    pub conversion_weight_unit: Option<MassUnit>,
    /// Volume unit the conversion factor is expressed in
    pub conversion_volume_unit: Option<VolumeUnit>,
    /// Nutrition variants owned by this ingredient
    pub variants: Vec<IngredientVariant>,
    /// Custom units owned by this ingredient
    pub custom_units: Vec<CustomUnit>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Serving-size specific nutrition facts for one ingredient
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientVariant {
    /// Surrogate identifier
    pub id: Uuid,
    /// Owning ingredient
    pub ingredient_id: Uuid,
    /// Natural key, unique within the owning ingredient
    pub description: String,
    /// Whether this is the ingredient's default variant (at most one per ingredient)
    pub is_default: bool,
    /// Unit the serving size is expressed in
    pub unit: Option<Unit>,
    /// Serving size magnitude
    pub serving_size: Option<f64>,
    /// Calories per serving
    pub calories: Option<f64>,
    /// Carbohydrate per serving
    pub carbohydrate: Option<f64>,
    /// Fat per serving
    pub fat: Option<f64>,
    /// Protein per serving
    pub protein: Option<f64>,
    /// Saturated fat per serving
    pub saturated_fat: Option<f64>,
    /// Sodium per serving
    pub sodium: Option<f64>,
    /// Sugar per serving
    pub sugar: Option<f64>,
}

/// Ingredient-specific conversion from a standard unit to a custom one
#[derive(Debug, Clone, PartialEq)]
pub struct CustomUnit {
    /// Surrogate identifier
    pub id: Uuid,
    /// Owning ingredient
    pub ingredient_id: Uuid,
    /// Natural key, unique within the owning ingredient
    pub name: String,
    /// Factor converting the standard unit to this custom unit
    pub conversion_factor: Option<f64>,
    /// The standard unit the factor converts from
    pub conversion_unit: Option<Unit>,
}

/// Submitted representation of an ingredient, as accepted at the API boundary.
///
/// Ids are optional: they are ignored on create, and ignored for matching on
/// update (nested items are matched by natural key, never by id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientDraft {
    /// Surrogate id, ignored by the server
    pub id: Option<Uuid>,
    /// Display name
    pub name: String,
    /// Optional weight/volume conversion factor
    pub weight_to_volume_factor: Option<f64>,
    /// Weight unit for the conversion factor
    pub conversion_weight_unit: Option<MassUnit>,
    /// Volume unit for the conversion factor
    pub conversion_volume_unit: Option<VolumeUnit>,
    /// Submitted replacement set of variants
    #[serde(default)]
    pub variants: Vec<VariantDraft>,
    /// Submitted replacement set of custom units
    #[serde(default)]
    pub custom_units: Vec<CustomUnitDraft>,
}

/// Submitted representation of a nutrition variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantDraft {
    /// Surrogate id, ignored by the server
    pub id: Option<Uuid>,
    /// Natural key within the parent ingredient
    pub description: String,
    /// Default-variant flag
    #[serde(default)]
    pub is_default: bool,
    /// Unit the serving size is expressed in
    pub unit: Option<Unit>,
    /// Serving size magnitude
    pub serving_size: Option<f64>,
    /// Calories per serving
    pub calories: Option<f64>,
    /// Carbohydrate per serving
    pub carbohydrate: Option<f64>,
    /// Fat per serving
    pub fat: Option<f64>,
    /// Protein per serving
    pub protein: Option<f64>,
    /// Saturated fat per serving
    pub saturated_fat: Option<f64>,
    /// Sodium per serving
    pub sodium: Option<f64>,
    /// Sugar per serving
    pub sugar: Option<f64>,
}

/// Submitted representation of a custom unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomUnitDraft {
    /// Surrogate id, ignored by the server
    pub id: Option<Uuid>,
    /// Natural key within the parent ingredient
    pub name: String,
    /// Factor converting the standard unit to this custom unit
    pub conversion_factor: Option<f64>,
    /// The standard unit the factor converts from
    pub conversion_unit: Option<Unit>,
}

impl Ingredient {
    /// Build a brand-new aggregate from a submitted draft, assigning fresh ids
    /// to the ingredient and every nested item.
    #[must_use]
    pub fn from_draft(draft: &IngredientDraft) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Self {
            id,
            name: draft.name.clone(),
            weight_to_volume_factor: draft.weight_to_volume_factor,
            conversion_weight_unit: draft.conversion_weight_unit,
            conversion_volume_unit: draft.conversion_volume_unit,
            variants: draft
                .variants
                .iter()
                .map(|variant| IngredientVariant::from_draft(variant, id))
                .collect(),
            custom_units: draft
                .custom_units
                .iter()
                .map(|unit| CustomUnit::from_draft(unit, id))
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl IngredientVariant {
    /// Build a new variant from a submitted draft, bound to the given parent.
    ///
    /// Any id carried by the draft is discarded; the variant gets a fresh one.
    #[must_use]
    pub fn from_draft(draft: &VariantDraft, ingredient_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            ingredient_id,
            description: draft.description.clone(),
            is_default: draft.is_default,
            unit: draft.unit,
            serving_size: draft.serving_size,
            calories: draft.calories,
            carbohydrate: draft.carbohydrate,
            fat: draft.fat,
            protein: draft.protein,
            saturated_fat: draft.saturated_fat,
            sodium: draft.sodium,
            sugar: draft.sugar,
        }
    }
}

impl CustomUnit {
    /// Build a new custom unit from a submitted draft, bound to the given parent.
    #[must_use]
    pub fn from_draft(draft: &CustomUnitDraft, ingredient_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            ingredient_id,
            name: draft.name.clone(),
            conversion_factor: draft.conversion_factor,
            conversion_unit: draft.conversion_unit,
        }
    }
}
