// ABOUTME: Route handlers for the ingredient catalog REST API
// ABOUTME: Provides CRUD endpoints for ingredients, nutrition variants and custom units
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Ingredient routes
//!
//! This module handles the ingredient catalog endpoints. Whole-ingredient
//! updates go through the aggregate reconciler: the submitted representation
//! is validated, merged onto the persisted aggregate by natural key, and the
//! result is saved in one transaction. Nested-item endpoints check the parent
//! ingredient first so a missing id is reported against the right entity.

use crate::{
    database::{IngredientsManager, ListIngredientsFilter},
    errors::AppError,
    models::{
        CustomUnit, CustomUnitDraft, Ingredient, IngredientDraft, IngredientVariant, MassUnit,
        Unit, VariantDraft, VolumeUnit,
    },
    reconcile::{apply_custom_unit, apply_variant, reconcile},
    server::ServerResources,
    validation::validate_ingredient,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Response for an ingredient with its nested collections
#[derive(Debug, Serialize, Deserialize)]
pub struct IngredientResponse {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Optional weight/volume conversion factor
    pub weight_to_volume_factor: Option<f64>,
    /// Weight unit for the conversion factor
    pub conversion_weight_unit: Option<MassUnit>,
    /// Volume unit for the conversion factor
    pub conversion_volume_unit: Option<VolumeUnit>,
    /// Nutrition variants
    pub variants: Vec<VariantResponse>,
    /// Custom units
    pub custom_units: Vec<CustomUnitResponse>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// Response for a nutrition variant
#[derive(Debug, Serialize, Deserialize)]
pub struct VariantResponse {
    /// Unique identifier
    pub id: Uuid,
    /// Natural key within the parent ingredient
    pub description: String,
    /// Default-variant flag
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

/// Response for a custom unit
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomUnitResponse {
    /// Unique identifier
    pub id: Uuid,
    /// Natural key within the parent ingredient
    pub name: String,
    /// Factor converting the standard unit to this custom unit
    pub conversion_factor: Option<f64>,
    /// The standard unit the factor converts from
    pub conversion_unit: Option<Unit>,
}

impl From<Ingredient> for IngredientResponse {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
            weight_to_volume_factor: ingredient.weight_to_volume_factor,
            conversion_weight_unit: ingredient.conversion_weight_unit,
            conversion_volume_unit: ingredient.conversion_volume_unit,
            variants: ingredient.variants.into_iter().map(Into::into).collect(),
            custom_units: ingredient.custom_units.into_iter().map(Into::into).collect(),
            created_at: ingredient.created_at.to_rfc3339(),
            updated_at: ingredient.updated_at.to_rfc3339(),
        }
    }
}

impl From<IngredientVariant> for VariantResponse {
    fn from(variant: IngredientVariant) -> Self {
        Self {
            id: variant.id,
            description: variant.description,
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
        }
    }
}

impl From<CustomUnit> for CustomUnitResponse {
    fn from(unit: CustomUnit) -> Self {
        Self {
            id: unit.id,
            name: unit.name,
            conversion_factor: unit.conversion_factor,
            conversion_unit: unit.conversion_unit,
        }
    }
}

/// Response for listing ingredients
#[derive(Debug, Serialize, Deserialize)]
pub struct ListIngredientsResponse {
    /// Ingredients on this page
    pub ingredients: Vec<IngredientResponse>,
    /// Total count of ingredients matching the filter
    pub total: u32,
}

/// Query parameters for listing ingredients
#[derive(Debug, Deserialize, Default)]
pub struct ListIngredientsQuery {
    /// Case-insensitive substring to match against the name
    pub q: Option<String>,
    /// Maximum results to return
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

/// Ingredient routes handler
pub struct IngredientRoutes;

impl IngredientRoutes {
    /// Create all ingredient catalog routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/ingredients", get(Self::handle_list))
            .route("/api/ingredients", post(Self::handle_create))
            .route("/api/ingredients/:id", get(Self::handle_get))
            .route("/api/ingredients/:id", put(Self::handle_update))
            .route("/api/ingredients/:id", delete(Self::handle_delete))
            .route(
                "/api/ingredients/:id/variants",
                get(Self::handle_list_variants),
            )
            .route(
                "/api/ingredients/:id/variants",
                post(Self::handle_add_variant),
            )
            .route(
                "/api/ingredients/:id/variants/:variant_id",
                get(Self::handle_get_variant),
            )
            .route(
                "/api/ingredients/:id/variants/:variant_id",
                put(Self::handle_update_variant),
            )
            .route(
                "/api/ingredients/:id/variants/:variant_id",
                delete(Self::handle_delete_variant),
            )
            .route(
                "/api/ingredients/:id/custom-units",
                get(Self::handle_list_custom_units),
            )
            .route(
                "/api/ingredients/:id/custom-units",
                post(Self::handle_add_custom_unit),
            )
            .route(
                "/api/ingredients/:id/custom-units/:unit_id",
                get(Self::handle_get_custom_unit),
            )
            .route(
                "/api/ingredients/:id/custom-units/:unit_id",
                put(Self::handle_update_custom_unit),
            )
            .route(
                "/api/ingredients/:id/custom-units/:unit_id",
                delete(Self::handle_delete_custom_unit),
            )
            .with_state(resources)
    }

    /// Get the ingredients manager from the shared resources
    fn manager(resources: &Arc<ServerResources>) -> IngredientsManager {
        resources.database.ingredients()
    }

    /// Fail with a not-found naming the ingredient unless it exists
    async fn ensure_ingredient(manager: &IngredientsManager, id: Uuid) -> Result<(), AppError> {
        if manager.exists(id).await? {
            Ok(())
        } else {
            Err(AppError::not_found(format!("Ingredient {id}")))
        }
    }

    /// Handle GET /api/ingredients - List ingredients
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ListIngredientsQuery>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);

        let filter = ListIngredientsFilter {
            q: query.q,
            limit: query.limit,
            offset: query.offset,
        };

        let ingredients = manager.list(&filter).await?;
        let total = manager.count(filter.q.as_deref()).await?;

        let response = ListIngredientsResponse {
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            total,
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/ingredients - Create a new ingredient
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        Json(draft): Json<IngredientDraft>,
    ) -> Result<Response, AppError> {
        validate_ingredient(&draft)?;

        let manager = Self::manager(&resources);
        let ingredient = manager.create(&draft).await?;

        let response: IngredientResponse = ingredient.into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/ingredients/:id - Get a specific ingredient
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);
        let ingredient = manager
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Ingredient {id}")))?;

        let response: IngredientResponse = ingredient.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle PUT /api/ingredients/:id - Update an ingredient as a whole.
    ///
    /// The persisted aggregate is loaded, the submitted representation is
    /// reconciled onto it, and the result is saved atomically.
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<Uuid>,
        Json(draft): Json<IngredientDraft>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);
        let mut ingredient = manager
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Ingredient {id}")))?;

        reconcile(&mut ingredient, &draft)?;
        let saved = manager.save(&ingredient).await?;

        let response: IngredientResponse = saved.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /api/ingredients/:id - Delete an ingredient and its nested items
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);
        let deleted = manager.delete(id).await?;

        if !deleted {
            return Err(AppError::not_found(format!("Ingredient {id}")));
        }

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    /// Handle GET /api/ingredients/:id/variants - List an ingredient's variants
    async fn handle_list_variants(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);
        Self::ensure_ingredient(&manager, id).await?;

        let variants = manager.variants_for_ingredient(id).await?;
        let response: Vec<VariantResponse> = variants.into_iter().map(Into::into).collect();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/ingredients/:id/variants - Add a variant to an ingredient
    async fn handle_add_variant(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<Uuid>,
        Json(draft): Json<VariantDraft>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);
        Self::ensure_ingredient(&manager, id).await?;

        let variant = IngredientVariant::from_draft(&draft, id);
        manager.insert_variant(&variant).await?;

        let response: VariantResponse = variant.into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/ingredients/:id/variants/:variant_id - Get a variant
    async fn handle_get_variant(
        State(resources): State<Arc<ServerResources>>,
        Path((id, variant_id)): Path<(Uuid, Uuid)>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);
        Self::ensure_ingredient(&manager, id).await?;

        let variant = manager
            .variant(variant_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Ingredient variant {variant_id}")))?;

        let response: VariantResponse = variant.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle PUT /api/ingredients/:id/variants/:variant_id - Update a variant in place
    async fn handle_update_variant(
        State(resources): State<Arc<ServerResources>>,
        Path((id, variant_id)): Path<(Uuid, Uuid)>,
        Json(draft): Json<VariantDraft>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);
        Self::ensure_ingredient(&manager, id).await?;

        let mut variant = manager
            .variant(variant_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Ingredient variant {variant_id}")))?;

        apply_variant(&mut variant, &draft);
        manager.update_variant(&variant).await?;

        let response: VariantResponse = variant.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /api/ingredients/:id/variants/:variant_id - Remove a variant
    /// from its parent's collection and re-persist the parent
    async fn handle_delete_variant(
        State(resources): State<Arc<ServerResources>>,
        Path((id, variant_id)): Path<(Uuid, Uuid)>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);
        let mut ingredient = manager
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Ingredient {id}")))?;

        if !ingredient.variants.iter().any(|v| v.id == variant_id) {
            return Err(AppError::not_found(format!(
                "Ingredient variant {variant_id}"
            )));
        }

        ingredient.variants.retain(|v| v.id != variant_id);
        manager.save(&ingredient).await?;

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    /// Handle GET /api/ingredients/:id/custom-units - List an ingredient's custom units
    async fn handle_list_custom_units(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);
        Self::ensure_ingredient(&manager, id).await?;

        let units = manager.custom_units_for_ingredient(id).await?;
        let response: Vec<CustomUnitResponse> = units.into_iter().map(Into::into).collect();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/ingredients/:id/custom-units - Add a custom unit
    async fn handle_add_custom_unit(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<Uuid>,
        Json(draft): Json<CustomUnitDraft>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);
        Self::ensure_ingredient(&manager, id).await?;

        let unit = CustomUnit::from_draft(&draft, id);
        manager.insert_custom_unit(&unit).await?;

        let response: CustomUnitResponse = unit.into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/ingredients/:id/custom-units/:unit_id - Get a custom unit
    async fn handle_get_custom_unit(
        State(resources): State<Arc<ServerResources>>,
        Path((id, unit_id)): Path<(Uuid, Uuid)>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);
        Self::ensure_ingredient(&manager, id).await?;

        let unit = manager
            .custom_unit(unit_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Custom unit {unit_id}")))?;

        let response: CustomUnitResponse = unit.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle PUT /api/ingredients/:id/custom-units/:unit_id - Update a custom unit in place
    async fn handle_update_custom_unit(
        State(resources): State<Arc<ServerResources>>,
        Path((id, unit_id)): Path<(Uuid, Uuid)>,
        Json(draft): Json<CustomUnitDraft>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);
        Self::ensure_ingredient(&manager, id).await?;

        let mut unit = manager
            .custom_unit(unit_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Custom unit {unit_id}")))?;

        apply_custom_unit(&mut unit, &draft);
        manager.update_custom_unit(&unit).await?;

        let response: CustomUnitResponse = unit.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /api/ingredients/:id/custom-units/:unit_id - Remove a custom
    /// unit from its parent's collection and re-persist the parent
    async fn handle_delete_custom_unit(
        State(resources): State<Arc<ServerResources>>,
        Path((id, unit_id)): Path<(Uuid, Uuid)>,
    ) -> Result<Response, AppError> {
        let manager = Self::manager(&resources);
        let mut ingredient = manager
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Ingredient {id}")))?;

        if !ingredient.custom_units.iter().any(|u| u.id == unit_id) {
            return Err(AppError::not_found(format!("Custom unit {unit_id}")));
        }

        ingredient.custom_units.retain(|u| u.id != unit_id);
        manager.save(&ingredient).await?;

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }
}
