//! Menu hierarchy rows
//!
//! Four flat row sets, each scoped to one restaurant through its category
//! chain. They are folded into a tree by `services::menu`.

use sqlx::PgPool;

use super::BoxError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub rank: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariationRow {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    /// Minor units
    pub price: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ModifierGroupRow {
    pub id: i64,
    pub variation_id: i64,
    /// Name of the ingredient category the group draws from
    pub category_name: String,
    pub min_select: i32,
    pub max_select: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ModifierRow {
    pub modifier_group_id: i64,
    pub ingredient_name: String,
    pub is_available: bool,
    /// Minor units
    pub price_extra: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub is_available: bool,
}

pub async fn categories(pool: &PgPool, restaurant_id: &str) -> Result<Vec<CategoryRow>, BoxError> {
    let rows = sqlx::query_as(
        "SELECT id, name, rank FROM categories WHERE restaurant_id = $1 ORDER BY rank, id",
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn variations(pool: &PgPool, restaurant_id: &str) -> Result<Vec<VariationRow>, BoxError> {
    let rows = sqlx::query_as(
        r#"
        SELECT v.id, v.category_id, v.name, v.price
        FROM product_variations v
        JOIN categories c ON c.id = v.category_id
        WHERE c.restaurant_id = $1
        ORDER BY v.id
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn modifier_groups(
    pool: &PgPool,
    restaurant_id: &str,
) -> Result<Vec<ModifierGroupRow>, BoxError> {
    let rows = sqlx::query_as(
        r#"
        SELECT mg.id, mg.variation_id, ic.name AS category_name,
               mg.min_select, mg.max_select
        FROM modifier_groups mg
        JOIN ingredient_categories ic ON ic.id = mg.ingredient_category_id
        JOIN product_variations v ON v.id = mg.variation_id
        JOIN categories c ON c.id = v.category_id
        WHERE c.restaurant_id = $1
        ORDER BY mg.id
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Modifiers whose ingredient belongs to the group's ingredient category.
/// Rows breaking that rule are left out.
pub async fn modifiers(pool: &PgPool, restaurant_id: &str) -> Result<Vec<ModifierRow>, BoxError> {
    let rows = sqlx::query_as(
        r#"
        SELECT m.modifier_group_id, i.name AS ingredient_name,
               i.is_available, m.price_extra
        FROM modifiers m
        JOIN modifier_groups mg ON mg.id = m.modifier_group_id
        JOIN ingredients i
          ON i.id = m.ingredient_id
         AND i.ingredient_category_id = mg.ingredient_category_id
        JOIN product_variations v ON v.id = mg.variation_id
        JOIN categories c ON c.id = v.category_id
        WHERE c.restaurant_id = $1 AND i.restaurant_id = $1
        ORDER BY m.id
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_ingredients(
    pool: &PgPool,
    restaurant_id: &str,
) -> Result<Vec<IngredientRow>, BoxError> {
    let rows = sqlx::query_as(
        r#"
        SELECT i.id, i.name, ic.name AS category, i.is_available
        FROM ingredients i
        JOIN ingredient_categories ic ON ic.id = i.ingredient_category_id
        WHERE i.restaurant_id = $1
        ORDER BY ic.name, i.name
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns `false` when the ingredient does not belong to the restaurant.
pub async fn set_ingredient_availability(
    pool: &PgPool,
    restaurant_id: &str,
    ingredient_id: i64,
    is_available: bool,
) -> Result<bool, BoxError> {
    let result = sqlx::query(
        "UPDATE ingredients SET is_available = $1 WHERE id = $2 AND restaurant_id = $3",
    )
    .bind(is_available)
    .bind(ingredient_id)
    .bind(restaurant_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
