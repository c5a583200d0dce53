use std::collections::HashSet;

use diesel::prelude::*;

use crate::error::{ServiceError, StoreError};
use crate::models::{GroceryItem, GroceryItemChanges, Ingredient, NewGroceryItem, NewRecipeIngredient, Recipe};
use crate::payload::{
    CreateGroceryItem, CreateRecipe, IngredientDetail, IngredientLine, RecipeDetail, RecipeLine, UpdateGroceryItem,
};
use crate::query;

const INGREDIENT_NAME_MAX: usize = 120;
const RECIPE_TITLE_MAX: usize = 160;
const GROCERY_NAME_MAX: usize = 120;
const QUANTITY_MAX: usize = 60;
const UNIT_MAX: usize = 30;
const CATEGORY_MAX: usize = 60;

// lookup + insert rounds before giving up on a contended name
const MAX_CREATE_ATTEMPTS: usize = 3;

type ServiceResult<T> = Result<T, ServiceError>;

/// Returns the ingredient called `raw_name` (trimmed), creating it if needed.
///
/// Repeated calls with the same name never create a second row and never
/// modify the existing one. Concurrent callers may both miss the lookup;
/// the loser's insert hits the unique index and it re-reads the winner's row.
pub fn create_or_get_ingredient(conn: &mut SqliteConnection, raw_name: &str) -> ServiceResult<Ingredient> {
    let name = required("Ingredient name", raw_name, INGREDIENT_NAME_MAX)?;

    for _ in 0..MAX_CREATE_ATTEMPTS {
        if let Some(existing) = query::find_ingredient_by_name(conn, name)? {
            log::debug!("ingredient {:?} already exists with id {}", name, existing.id);
            return Ok(existing);
        }
        match query::insert_ingredient(conn, name) {
            Ok(created) => {
                log::info!("created ingredient {} {:?}", created.id, created.name);
                return Ok(created);
            }
            Err(StoreError::ConstraintViolation(reason)) => {
                log::warn!("insert of ingredient {:?} lost a race ({}), re-reading", name, reason);
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(ServiceError::Conflict(format!("Ingredient {:?} could not be created", name)))
}

pub fn ingredient_detail(conn: &mut SqliteConnection, ingredient: Ingredient) -> ServiceResult<IngredientDetail> {
    let recipe_links = query::links_for_ingredient(conn, ingredient.id)?;
    Ok(IngredientDetail {
        ingredient,
        recipe_links,
    })
}

pub fn get_ingredient(conn: &mut SqliteConnection, ingredient_id: i32) -> ServiceResult<IngredientDetail> {
    let ingredient = query::find_ingredient(conn, ingredient_id)?.ok_or(StoreError::NotFound("ingredient"))?;
    ingredient_detail(conn, ingredient)
}

pub fn list_ingredients(conn: &mut SqliteConnection) -> ServiceResult<Vec<Ingredient>> {
    Ok(query::list_ingredients(conn)?)
}

pub fn delete_ingredient(conn: &mut SqliteConnection, ingredient_id: i32) -> ServiceResult<()> {
    query::delete_ingredient(conn, ingredient_id)?;
    log::info!("deleted ingredient {}", ingredient_id);
    Ok(())
}

/// Creates a recipe and its ingredient list in one transaction. Unknown
/// ingredient names are created on the way.
pub fn create_recipe(conn: &mut SqliteConnection, request: &CreateRecipe) -> ServiceResult<RecipeDetail> {
    let title = required("Recipe title", &request.title, RECIPE_TITLE_MAX)?;
    let instructions = request.instructions.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let lines = validate_lines(&request.ingredients)?;

    // BEGIN IMMEDIATE: the write lock is taken up front, where busy_timeout applies
    conn.immediate_transaction::<_, ServiceError, _>(|conn| {
        let recipe = query::insert_recipe(conn, title, instructions)?;
        for line in &lines {
            let ingredient = create_or_get_ingredient(conn, line.name)?;
            query::insert_recipe_ingredient(conn, &line.link(recipe.id, ingredient.id))?;
        }
        log::info!("created recipe {} {:?} with {} ingredients", recipe.id, recipe.title, lines.len());
        recipe_detail(conn, recipe)
    })
}

pub fn get_recipe(conn: &mut SqliteConnection, recipe_id: i32) -> ServiceResult<RecipeDetail> {
    let recipe = existing_recipe(conn, recipe_id)?;
    recipe_detail(conn, recipe)
}

pub fn list_recipes(conn: &mut SqliteConnection) -> ServiceResult<Vec<Recipe>> {
    Ok(query::list_recipes(conn)?)
}

pub fn delete_recipe(conn: &mut SqliteConnection, recipe_id: i32) -> ServiceResult<()> {
    query::delete_recipe(conn, recipe_id)?;
    log::info!("deleted recipe {}", recipe_id);
    Ok(())
}

/// Adds an ingredient to a recipe, or replaces its quantity and unit if the
/// recipe already lists it.
pub fn set_recipe_ingredient(
    conn: &mut SqliteConnection,
    recipe_id: i32,
    line: &IngredientLine,
) -> ServiceResult<RecipeDetail> {
    let line = validate_line(line)?;

    conn.immediate_transaction::<_, ServiceError, _>(|conn| {
        let recipe = existing_recipe(conn, recipe_id)?;
        let ingredient = create_or_get_ingredient(conn, line.name)?;
        query::upsert_recipe_ingredient(conn, &line.link(recipe.id, ingredient.id))?;
        recipe_detail(conn, recipe)
    })
}

pub fn remove_recipe_ingredient(conn: &mut SqliteConnection, recipe_id: i32, ingredient_id: i32) -> ServiceResult<()> {
    query::delete_recipe_ingredient(conn, recipe_id, ingredient_id)?;
    Ok(())
}

pub fn list_grocery_items(conn: &mut SqliteConnection) -> ServiceResult<Vec<GroceryItem>> {
    Ok(query::list_grocery_items(conn)?)
}

pub fn add_grocery_item(conn: &mut SqliteConnection, request: &CreateGroceryItem) -> ServiceResult<GroceryItem> {
    let item = NewGroceryItem {
        ingredient_id: request.ingredient_id,
        name: required("Grocery item name", &request.name, GROCERY_NAME_MAX)?.to_string(),
        quantity: optional("Quantity", request.quantity.as_deref(), QUANTITY_MAX)?.map(str::to_string),
        unit: optional("Unit", request.unit.as_deref(), UNIT_MAX)?.map(str::to_string),
        category: optional("Category", request.category.as_deref(), CATEGORY_MAX)?.map(str::to_string),
    };

    if let Some(ingredient_id) = item.ingredient_id {
        query::find_ingredient(conn, ingredient_id)?.ok_or(StoreError::NotFound("ingredient"))?;
    }

    let created = query::insert_grocery_item(conn, &item)?;
    log::info!("added grocery item {} {:?}", created.id, created.name);
    Ok(created)
}

/// Puts every ingredient of a recipe on the grocery list. Names are copied
/// so the list stays readable if the ingredient is later renamed or removed.
pub fn add_recipe_to_groceries(conn: &mut SqliteConnection, recipe_id: i32) -> ServiceResult<Vec<GroceryItem>> {
    conn.immediate_transaction::<_, ServiceError, _>(|conn| {
        let recipe = existing_recipe(conn, recipe_id)?;
        let mut added = Vec::new();
        for (link, ingredient) in query::recipe_lines(conn, recipe.id)? {
            let item = NewGroceryItem {
                ingredient_id: Some(ingredient.id),
                name: ingredient.name,
                quantity: link.quantity,
                unit: link.unit,
                category: None,
            };
            added.push(query::insert_grocery_item(conn, &item)?);
        }
        log::info!("added {} grocery items from recipe {}", added.len(), recipe.id);
        Ok(added)
    })
}

/// Applies the provided fields. Blank optional text is treated as absent.
pub fn update_grocery_item(
    conn: &mut SqliteConnection,
    item_id: i32,
    request: &UpdateGroceryItem,
) -> ServiceResult<GroceryItem> {
    let name = match request.name.as_deref() {
        Some(name) => Some(required("Grocery item name", name, GROCERY_NAME_MAX)?.to_string()),
        None => None,
    };
    let changes = GroceryItemChanges {
        name,
        quantity: optional("Quantity", request.quantity.as_deref(), QUANTITY_MAX)?.map(str::to_string),
        unit: optional("Unit", request.unit.as_deref(), UNIT_MAX)?.map(str::to_string),
        category: optional("Category", request.category.as_deref(), CATEGORY_MAX)?.map(str::to_string),
        is_checked: request.is_checked,
    };
    if changes.is_empty() {
        return Err(ServiceError::validation("No changes to apply"));
    }

    Ok(query::update_grocery_item(conn, item_id, &changes)?)
}

pub fn delete_grocery_item(conn: &mut SqliteConnection, item_id: i32) -> ServiceResult<()> {
    query::delete_grocery_item(conn, item_id)?;
    Ok(())
}

pub fn clear_checked_grocery_items(conn: &mut SqliteConnection) -> ServiceResult<usize> {
    let deleted = query::delete_checked_grocery_items(conn)?;
    log::info!("cleared {} checked grocery items", deleted);
    Ok(deleted)
}

fn existing_recipe(conn: &mut SqliteConnection, recipe_id: i32) -> ServiceResult<Recipe> {
    let recipe = query::find_recipe(conn, recipe_id)?.ok_or(StoreError::NotFound("recipe"))?;
    Ok(recipe)
}

fn recipe_detail(conn: &mut SqliteConnection, recipe: Recipe) -> ServiceResult<RecipeDetail> {
    let ingredients = query::recipe_lines(conn, recipe.id)?
        .into_iter()
        .map(RecipeLine::from)
        .collect();
    Ok(RecipeDetail { recipe, ingredients })
}

struct ValidLine<'a> {
    name: &'a str,
    quantity: Option<&'a str>,
    unit: Option<&'a str>,
}

impl<'a> ValidLine<'a> {
    fn link(&self, recipe_id: i32, ingredient_id: i32) -> NewRecipeIngredient<'a> {
        NewRecipeIngredient {
            recipe_id,
            ingredient_id,
            quantity: self.quantity,
            unit: self.unit,
        }
    }
}

fn validate_line(line: &IngredientLine) -> ServiceResult<ValidLine<'_>> {
    Ok(ValidLine {
        name: required("Ingredient name", &line.name, INGREDIENT_NAME_MAX)?,
        quantity: optional("Quantity", line.quantity.as_deref(), QUANTITY_MAX)?,
        unit: optional("Unit", line.unit.as_deref(), UNIT_MAX)?,
    })
}

fn validate_lines(lines: &[IngredientLine]) -> ServiceResult<Vec<ValidLine<'_>>> {
    let mut seen = HashSet::new();
    lines
        .iter()
        .map(|line| {
            let line = validate_line(line)?;
            if !seen.insert(line.name) {
                return Err(ServiceError::validation(format!(
                    "Ingredient {:?} is listed more than once",
                    line.name
                )));
            }
            Ok(line)
        })
        .collect()
}

fn required<'a>(label: &str, raw: &'a str, max: usize) -> ServiceResult<&'a str> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ServiceError::validation(format!("{} is empty", label)));
    }
    check_length(label, value, max)?;
    Ok(value)
}

fn optional<'a>(label: &str, raw: Option<&'a str>, max: usize) -> ServiceResult<Option<&'a str>> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => {
            check_length(label, value, max)?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

fn check_length(label: &str, value: &str, max: usize) -> ServiceResult<()> {
    if value.chars().count() > max {
        return Err(ServiceError::validation(format!("{} exceeds {} characters", label, max)));
    }
    Ok(())
}
