// ABOUTME: Ingredient aggregate store over SQLite
// ABOUTME: Loads ingredients with their nested collections and persists whole aggregates atomically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Ingredient aggregate persistence.
//!
//! The manager exposes the two aggregate capabilities the service core needs,
//! load-with-nested-collections and save-the-whole-aggregate, next to the
//! simple indexed lookups for nested items. Saving re-implements the cascade
//! explicitly: inside one transaction the parent row is updated, nested rows
//! whose ids are no longer part of the aggregate are deleted, and the rest
//! are upserted. Schema-level unique constraints back the request validation;
//! violations surface as conflicts.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool, Transaction};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{CustomUnit, Ingredient, IngredientDraft, IngredientVariant, MassUnit, Unit, VolumeUnit};

/// Filter for listing ingredients
#[derive(Debug, Clone, Default)]
pub struct ListIngredientsFilter {
    /// Case-insensitive substring to match against the ingredient name
    pub q: Option<String>,
    /// Maximum results to return
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

const INGREDIENT_COLUMNS: &str = "id, name, weight_to_volume_factor, conversion_weight_unit, \
                                  conversion_volume_unit, created_at, updated_at";
const VARIANT_COLUMNS: &str = "id, ingredient_id, description, is_default, unit, serving_size, \
                               calories, carbohydrate, fat, protein, saturated_fat, sodium, sugar";
const CUSTOM_UNIT_COLUMNS: &str = "id, ingredient_id, name, conversion_factor, conversion_unit";

/// Ingredient database operations manager
pub struct IngredientsManager {
    pool: SqlitePool,
}

impl IngredientsManager {
    /// Create a new ingredients manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new ingredient aggregate from a submitted draft.
    ///
    /// Fresh ids are assigned to the ingredient and every nested item; any
    /// ids carried by the draft are ignored.
    ///
    /// # Errors
    ///
    /// Returns a conflict when the name or a nested natural key collides with
    /// a durable constraint, a database error otherwise.
    pub async fn create(&self, draft: &IngredientDraft) -> AppResult<Ingredient> {
        let ingredient = Ingredient::from_draft(draft);

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r"
            INSERT INTO ingredients (
                id, name, weight_to_volume_factor, conversion_weight_unit,
                conversion_volume_unit, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(ingredient.id.to_string())
        .bind(&ingredient.name)
        .bind(ingredient.weight_to_volume_factor)
        .bind(ingredient.conversion_weight_unit.map(MassUnit::as_str))
        .bind(ingredient.conversion_volume_unit.map(VolumeUnit::as_str))
        .bind(ingredient.created_at.to_rfc3339())
        .bind(ingredient.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for variant in &ingredient.variants {
            Self::upsert_variant_row(&mut tx, variant).await?;
        }
        for unit in &ingredient.custom_units {
            Self::upsert_custom_unit_row(&mut tx, unit).await?;
        }
        tx.commit().await?;

        Ok(ingredient)
    }

    /// Load an ingredient together with its nested collections
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get(&self, id: Uuid) -> AppResult<Option<Ingredient>> {
        let query = format!("SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut ingredient = row_to_ingredient(&row)?;
        ingredient.variants = self.variants_for_ingredient(id).await?;
        ingredient.custom_units = self.custom_units_for_ingredient(id).await?;
        Ok(Some(ingredient))
    }

    /// Check whether an ingredient exists
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn exists(&self, id: Uuid) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM ingredients WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// List ingredients with optional substring filtering and pagination
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list(&self, filter: &ListIngredientsFilter) -> AppResult<Vec<Ingredient>> {
        let limit = i64::from(filter.limit.unwrap_or(50));
        let offset = i64::from(filter.offset.unwrap_or(0));

        let rows = if let Some(q) = filter.q.as_deref() {
            let query = format!(
                "SELECT {INGREDIENT_COLUMNS} FROM ingredients \
                 WHERE name LIKE $1 ORDER BY name COLLATE NOCASE LIMIT $2 OFFSET $3"
            );
            sqlx::query(&query)
                .bind(format!("%{q}%"))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
        } else {
            let query = format!(
                "SELECT {INGREDIENT_COLUMNS} FROM ingredients \
                 ORDER BY name COLLATE NOCASE LIMIT $1 OFFSET $2"
            );
            sqlx::query(&query)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
        };

        let mut ingredients = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut ingredient = row_to_ingredient(row)?;
            ingredient.variants = self.variants_for_ingredient(ingredient.id).await?;
            ingredient.custom_units = self.custom_units_for_ingredient(ingredient.id).await?;
            ingredients.push(ingredient);
        }
        Ok(ingredients)
    }

    /// Count ingredients matching the optional substring filter
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn count(&self, q: Option<&str>) -> AppResult<u32> {
        let row = if let Some(q) = q {
            sqlx::query("SELECT COUNT(*) as total FROM ingredients WHERE name LIKE $1")
                .bind(format!("%{q}%"))
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query("SELECT COUNT(*) as total FROM ingredients")
                .fetch_one(&self.pool)
                .await?
        };
        let total: i64 = row.get("total");
        Ok(total as u32)
    }

    /// Persist a reconciled aggregate.
    ///
    /// One transaction updates the parent row, deletes nested rows whose ids
    /// left the aggregate, and upserts the rest. The freshly persisted
    /// aggregate is read back and returned.
    ///
    /// # Errors
    ///
    /// Returns not-found when the ingredient row is gone, a conflict when a
    /// durable constraint rejects the write, a database error otherwise.
    pub async fn save(&self, ingredient: &Ingredient) -> AppResult<Ingredient> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE ingredients
            SET name = $1, weight_to_volume_factor = $2, conversion_weight_unit = $3,
                conversion_volume_unit = $4, updated_at = $5
            WHERE id = $6
            ",
        )
        .bind(&ingredient.name)
        .bind(ingredient.weight_to_volume_factor)
        .bind(ingredient.conversion_weight_unit.map(MassUnit::as_str))
        .bind(ingredient.conversion_volume_unit.map(VolumeUnit::as_str))
        .bind(Utc::now().to_rfc3339())
        .bind(ingredient.id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Ingredient {}", ingredient.id)));
        }

        Self::prune_rows(
            &mut tx,
            "ingredient_variants",
            ingredient.id,
            &ingredient.variants.iter().map(|v| v.id).collect::<Vec<_>>(),
        )
        .await?;
        for variant in &ingredient.variants {
            Self::upsert_variant_row(&mut tx, variant).await?;
        }

        Self::prune_rows(
            &mut tx,
            "custom_units",
            ingredient.id,
            &ingredient.custom_units.iter().map(|u| u.id).collect::<Vec<_>>(),
        )
        .await?;
        for unit in &ingredient.custom_units {
            Self::upsert_custom_unit_row(&mut tx, unit).await?;
        }

        tx.commit().await?;

        self.get(ingredient.id)
            .await?
            .ok_or_else(|| AppError::internal("Ingredient disappeared during save"))
    }

    /// Delete an ingredient; nested rows go with it via the schema cascade.
    ///
    /// Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List the variants of one ingredient
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn variants_for_ingredient(&self, id: Uuid) -> AppResult<Vec<IngredientVariant>> {
        let query = format!(
            "SELECT {VARIANT_COLUMNS} FROM ingredient_variants \
             WHERE ingredient_id = $1 ORDER BY description"
        );
        let rows = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_variant).collect()
    }

    /// Find a variant by its id
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn variant(&self, variant_id: Uuid) -> AppResult<Option<IngredientVariant>> {
        let query = format!("SELECT {VARIANT_COLUMNS} FROM ingredient_variants WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(variant_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_variant).transpose()
    }

    /// Insert a single variant row
    ///
    /// # Errors
    ///
    /// Returns a conflict when the description or default flag collides with
    /// a durable constraint, a database error otherwise.
    pub async fn insert_variant(&self, variant: &IngredientVariant) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::upsert_variant_row(&mut tx, variant).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Update a single variant row in place
    ///
    /// # Errors
    ///
    /// Returns a conflict when a durable constraint rejects the write, a
    /// database error otherwise.
    pub async fn update_variant(&self, variant: &IngredientVariant) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE ingredient_variants
            SET description = $1, is_default = $2, unit = $3, serving_size = $4,
                calories = $5, carbohydrate = $6, fat = $7, protein = $8,
                saturated_fat = $9, sodium = $10, sugar = $11
            WHERE id = $12
            ",
        )
        .bind(&variant.description)
        .bind(i64::from(variant.is_default))
        .bind(variant.unit.map(Unit::as_str))
        .bind(variant.serving_size)
        .bind(variant.calories)
        .bind(variant.carbohydrate)
        .bind(variant.fat)
        .bind(variant.protein)
        .bind(variant.saturated_fat)
        .bind(variant.sodium)
        .bind(variant.sugar)
        .bind(variant.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// List the custom units of one ingredient
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn custom_units_for_ingredient(&self, id: Uuid) -> AppResult<Vec<CustomUnit>> {
        let query = format!(
            "SELECT {CUSTOM_UNIT_COLUMNS} FROM custom_units \
             WHERE ingredient_id = $1 ORDER BY name"
        );
        let rows = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_custom_unit).collect()
    }

    /// Find a custom unit by its id
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn custom_unit(&self, unit_id: Uuid) -> AppResult<Option<CustomUnit>> {
        let query = format!("SELECT {CUSTOM_UNIT_COLUMNS} FROM custom_units WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(unit_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_custom_unit).transpose()
    }

    /// Insert a single custom unit row
    ///
    /// # Errors
    ///
    /// Returns a conflict when the name collides with a durable constraint, a
    /// database error otherwise.
    pub async fn insert_custom_unit(&self, unit: &CustomUnit) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::upsert_custom_unit_row(&mut tx, unit).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Update a single custom unit row in place
    ///
    /// # Errors
    ///
    /// Returns a conflict when a durable constraint rejects the write, a
    /// database error otherwise.
    pub async fn update_custom_unit(&self, unit: &CustomUnit) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE custom_units
            SET name = $1, conversion_factor = $2, conversion_unit = $3
            WHERE id = $4
            ",
        )
        .bind(&unit.name)
        .bind(unit.conversion_factor)
        .bind(unit.conversion_unit.map(Unit::as_str))
        .bind(unit.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete nested rows whose ids are no longer part of the aggregate
    async fn prune_rows(
        tx: &mut Transaction<'_, sqlx::Sqlite>,
        table: &str,
        ingredient_id: Uuid,
        kept_ids: &[Uuid],
    ) -> AppResult<()> {
        if kept_ids.is_empty() {
            let query = format!("DELETE FROM {table} WHERE ingredient_id = $1");
            sqlx::query(&query)
                .bind(ingredient_id.to_string())
                .execute(&mut **tx)
                .await?;
            return Ok(());
        }

        let placeholders = (0..kept_ids.len())
            .map(|i| format!("${}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "DELETE FROM {table} WHERE ingredient_id = $1 AND id NOT IN ({placeholders})"
        );
        let mut statement = sqlx::query(&query).bind(ingredient_id.to_string());
        for id in kept_ids {
            statement = statement.bind(id.to_string());
        }
        statement.execute(&mut **tx).await?;
        Ok(())
    }

    async fn upsert_variant_row(
        tx: &mut Transaction<'_, sqlx::Sqlite>,
        variant: &IngredientVariant,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO ingredient_variants (
                id, ingredient_id, description, is_default, unit, serving_size,
                calories, carbohydrate, fat, protein, saturated_fat, sodium, sugar
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT(id) DO UPDATE SET
                description = excluded.description,
                is_default = excluded.is_default,
                unit = excluded.unit,
                serving_size = excluded.serving_size,
                calories = excluded.calories,
                carbohydrate = excluded.carbohydrate,
                fat = excluded.fat,
                protein = excluded.protein,
                saturated_fat = excluded.saturated_fat,
                sodium = excluded.sodium,
                sugar = excluded.sugar
            ",
        )
        .bind(variant.id.to_string())
        .bind(variant.ingredient_id.to_string())
        .bind(&variant.description)
        .bind(i64::from(variant.is_default))
        .bind(variant.unit.map(Unit::as_str))
        .bind(variant.serving_size)
        .bind(variant.calories)
        .bind(variant.carbohydrate)
        .bind(variant.fat)
        .bind(variant.protein)
        .bind(variant.saturated_fat)
        .bind(variant.sodium)
        .bind(variant.sugar)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn upsert_custom_unit_row(
        tx: &mut Transaction<'_, sqlx::Sqlite>,
        unit: &CustomUnit,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO custom_units (id, ingredient_id, name, conversion_factor, conversion_unit)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                conversion_factor = excluded.conversion_factor,
                conversion_unit = excluded.conversion_unit
            ",
        )
        .bind(unit.id.to_string())
        .bind(unit.ingredient_id.to_string())
        .bind(&unit.name)
        .bind(unit.conversion_factor)
        .bind(unit.conversion_unit.map(Unit::as_str))
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

/// Convert a database row to an `Ingredient` (nested collections not loaded)
fn row_to_ingredient(row: &SqliteRow) -> AppResult<Ingredient> {
    let id_str: String = row.get("id");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(Ingredient {
        id: parse_uuid(&id_str)?,
        name: row.get("name"),
        weight_to_volume_factor: row.get("weight_to_volume_factor"),
        conversion_weight_unit: parse_unit_column(row, "conversion_weight_unit", MassUnit::parse)?,
        conversion_volume_unit: parse_unit_column(row, "conversion_volume_unit", VolumeUnit::parse)?,
        variants: Vec::new(),
        custom_units: Vec::new(),
        created_at: parse_datetime(&created_at_str)?,
        updated_at: parse_datetime(&updated_at_str)?,
    })
}

/// Convert a database row to an `IngredientVariant`
fn row_to_variant(row: &SqliteRow) -> AppResult<IngredientVariant> {
    let id_str: String = row.get("id");
    let ingredient_id_str: String = row.get("ingredient_id");
    let is_default: i64 = row.get("is_default");

    Ok(IngredientVariant {
        id: parse_uuid(&id_str)?,
        ingredient_id: parse_uuid(&ingredient_id_str)?,
        description: row.get("description"),
        is_default: is_default == 1,
        unit: parse_unit_column(row, "unit", Unit::parse)?,
        serving_size: row.get("serving_size"),
        calories: row.get("calories"),
        carbohydrate: row.get("carbohydrate"),
        fat: row.get("fat"),
        protein: row.get("protein"),
        saturated_fat: row.get("saturated_fat"),
        sodium: row.get("sodium"),
        sugar: row.get("sugar"),
    })
}

/// Convert a database row to a `CustomUnit`
fn row_to_custom_unit(row: &SqliteRow) -> AppResult<CustomUnit> {
    let id_str: String = row.get("id");
    let ingredient_id_str: String = row.get("ingredient_id");

    Ok(CustomUnit {
        id: parse_uuid(&id_str)?,
        ingredient_id: parse_uuid(&ingredient_id_str)?,
        name: row.get("name"),
        conversion_factor: row.get("conversion_factor"),
        conversion_unit: parse_unit_column(row, "conversion_unit", Unit::parse)?,
    })
}

fn parse_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::internal(format!("Invalid UUID: {e}")))
}

fn parse_datetime(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_unit_column<U>(
    row: &SqliteRow,
    column: &str,
    parse: impl Fn(&str) -> Option<U>,
) -> AppResult<Option<U>> {
    let value: Option<String> = row.get(column);
    value
        .map(|name| {
            parse(&name).ok_or_else(|| AppError::internal(format!("Invalid unit: {name}")))
        })
        .transpose()
}
