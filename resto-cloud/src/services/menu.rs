//! Menu assembly for the dashboard and the voice assistant
//!
//! The four row sets are fetched concurrently, folded top-down into
//! category → item → modifier group → option, then rendered either as the
//! pricing JSON or as the assistant's system prompt.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::{MenuCategory, MenuItem, MenuModifierGroup, MenuOption};
use shared::util::minor_to_major;
use sqlx::PgPool;

use crate::db;
use crate::db::menu::{CategoryRow, ModifierGroupRow, ModifierRow, VariationRow};
use crate::db::restaurants::Restaurant;
use crate::error::ServiceResult;

/// Shown in place of the schedule when none is stored.
pub const HOURS_NOT_CONFIGURED: &str = "Non configuré";

#[derive(Debug, Default)]
pub struct MenuRows {
    pub categories: Vec<CategoryRow>,
    pub variations: Vec<VariationRow>,
    pub modifier_groups: Vec<ModifierGroupRow>,
    pub modifiers: Vec<ModifierRow>,
}

pub async fn load_rows(pool: &PgPool, restaurant_id: &str) -> ServiceResult<MenuRows> {
    let (categories, variations, modifier_groups, modifiers) = tokio::try_join!(
        db::menu::categories(pool, restaurant_id),
        db::menu::variations(pool, restaurant_id),
        db::menu::modifier_groups(pool, restaurant_id),
        db::menu::modifiers(pool, restaurant_id),
    )?;

    Ok(MenuRows {
        categories,
        variations,
        modifier_groups,
        modifiers,
    })
}

/// Assembled menu of a restaurant that must exist.
pub async fn load_menu(pool: &PgPool, restaurant_id: &str) -> ServiceResult<Vec<MenuCategory>> {
    Ok(assemble(load_rows(pool, restaurant_id).await?))
}

/// Fold flat rows into the tree, categories by ascending rank.
///
/// Rows whose parent is not part of `rows` are dropped.
pub fn assemble(rows: MenuRows) -> Vec<MenuCategory> {
    let mut options: HashMap<i64, Vec<MenuOption>> = HashMap::new();
    for m in rows.modifiers {
        options
            .entry(m.modifier_group_id)
            .or_default()
            .push(MenuOption {
                name: m.ingredient_name,
                price_extra: minor_to_major(m.price_extra),
                is_available: m.is_available,
            });
    }

    let mut groups: HashMap<i64, Vec<MenuModifierGroup>> = HashMap::new();
    for g in rows.modifier_groups {
        groups.entry(g.variation_id).or_default().push(MenuModifierGroup {
            category: g.category_name,
            min_select: g.min_select,
            max_select: g.max_select,
            options: options.remove(&g.id).unwrap_or_default(),
        });
    }

    let mut items: HashMap<i64, Vec<MenuItem>> = HashMap::new();
    for v in rows.variations {
        items.entry(v.category_id).or_default().push(MenuItem {
            name: v.name,
            price: minor_to_major(v.price),
            modifier_groups: groups.remove(&v.id).unwrap_or_default(),
        });
    }

    let mut categories = rows.categories;
    categories.sort_by_key(|c| (c.rank, c.id));
    categories
        .into_iter()
        .map(|c| MenuCategory {
            items: items.remove(&c.id).unwrap_or_default(),
            category: c.name,
        })
        .collect()
}

pub fn pricing_json(menu: &[MenuCategory]) -> serde_json::Result<String> {
    serde_json::to_string(menu)
}

// Prompt views: the pricing shape without availability flags.

#[derive(Serialize)]
struct PromptCategory<'a> {
    category: &'a str,
    items: Vec<PromptItem<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptItem<'a> {
    name: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    modifier_groups: Vec<PromptGroup<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptGroup<'a> {
    category: &'a str,
    min_select: i32,
    max_select: i32,
    options: Vec<PromptOption<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptOption<'a> {
    name: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    price_extra: Decimal,
}

fn prompt_menu(menu: &[MenuCategory]) -> Vec<PromptCategory<'_>> {
    menu.iter()
        .map(|c| PromptCategory {
            category: &c.category,
            items: c
                .items
                .iter()
                .map(|i| PromptItem {
                    name: &i.name,
                    price: i.price,
                    modifier_groups: i
                        .modifier_groups
                        .iter()
                        .map(|g| PromptGroup {
                            category: &g.category,
                            min_select: g.min_select,
                            max_select: g.max_select,
                            options: g
                                .options
                                .iter()
                                .map(|o| PromptOption {
                                    name: &o.name,
                                    price_extra: o.price_extra,
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

pub struct PromptInput<'a> {
    pub restaurant_name: &'a str,
    pub menu: &'a [MenuCategory],
    /// Raw stored schedule
    pub business_hours: Option<&'a Value>,
    pub transfer_phone: &'a str,
}

pub fn system_prompt(input: &PromptInput<'_>) -> serde_json::Result<String> {
    let menu_json = serde_json::to_string_pretty(&prompt_menu(input.menu))?;
    let hours = match input.business_hours {
        Some(value) if !value.is_null() => serde_json::to_string(value)?,
        _ => HOURS_NOT_CONFIGURED.to_string(),
    };
    let name = input.restaurant_name;
    let phone = input.transfer_phone;

    Ok(format!(
        "Tu es l'assistant vocal qui prend les commandes par téléphone pour le restaurant « {name} ».\n\
         Tu parles français, avec des phrases courtes et polies.\n\
         \n\
         RÈGLES\n\
         - Ne saute jamais un groupe d'options obligatoire (minSelect supérieur à 0) : le client doit toujours choisir.\n\
         - Respecte le nombre de choix minSelect et maxSelect de chaque groupe d'options.\n\
         - Demande toujours le nom du client avant de terminer l'appel.\n\
         - Ne répète pas la commande complète avant la confirmation finale.\n\
         - Ne propose que les articles et options du menu ci-dessous. Les prix sont en euros.\n\
         - Si tu ne peux pas traiter une demande, propose de transférer l'appel au {phone}.\n\
         \n\
         MENU (JSON)\n\
         {menu_json}\n\
         \n\
         HORAIRES D'OUVERTURE\n\
         {hours}\n\
         \n\
         NUMÉRO DE TRANSFERT\n\
         {phone}\n"
    ))
}

async fn restaurant_with_menu(
    pool: &PgPool,
    restaurant_id: &str,
) -> ServiceResult<(Restaurant, Vec<MenuCategory>)> {
    let restaurant = db::restaurants::find_by_id(pool, restaurant_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;
    let menu = load_menu(pool, restaurant_id).await?;
    Ok((restaurant, menu))
}

/// Pricing JSON of one restaurant, by id.
pub async fn menu_json_for(pool: &PgPool, restaurant_id: &str) -> ServiceResult<String> {
    let (_, menu) = restaurant_with_menu(pool, restaurant_id).await?;
    Ok(pricing_json(&menu)?)
}

/// System prompt of one restaurant, by id. The restaurant's own phone is the
/// transfer number when it has one.
pub async fn system_prompt_for(
    pool: &PgPool,
    restaurant_id: &str,
    default_transfer_phone: &str,
) -> ServiceResult<String> {
    let (restaurant, menu) = restaurant_with_menu(pool, restaurant_id).await?;
    let transfer_phone = restaurant
        .phone
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(default_transfer_phone);

    Ok(system_prompt(&PromptInput {
        restaurant_name: &restaurant.name,
        menu: &menu,
        business_hours: restaurant.business_hours.as_ref(),
        transfer_phone,
    })?)
}
