use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{grocery_items, ingredients, recipe_ingredients, recipes};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = ingredients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ingredients)]
pub struct NewIngredient<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = recipes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Recipe {
    pub id: i32,
    pub title: String,
    pub instructions: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = recipes)]
pub struct NewRecipe<'a> {
    pub title: &'a str,
    pub instructions: Option<&'a str>,
}

/// One row of a recipe's ingredient list: "this recipe uses this ingredient
/// in this amount". A recipe never lists the same ingredient twice.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = recipe_ingredients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RecipeIngredient {
    pub id: i32,
    pub recipe_id: i32,     //foreign key
    pub ingredient_id: i32, //foreign key
    pub quantity: Option<String>, //free-form, "2" or "a pinch"
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = recipe_ingredients)]
pub struct NewRecipeIngredient<'a> {
    pub recipe_id: i32,
    pub ingredient_id: i32,
    pub quantity: Option<&'a str>,
    pub unit: Option<&'a str>,
}

/// Shopping-list entry. `name` is a copy taken at creation time, so it
/// outlives renames or deletion of the linked ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = grocery_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GroceryItem {
    pub id: i32,
    pub ingredient_id: Option<i32>,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub is_checked: bool,
}

// is_checked is left to the column default
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = grocery_items)]
pub struct NewGroceryItem {
    pub ingredient_id: Option<i32>,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
}

/// Partial update of a grocery item; `None` fields are left untouched.
#[derive(Debug, Default, Clone, AsChangeset)]
#[diesel(table_name = grocery_items)]
pub struct GroceryItemChanges {
    pub name: Option<String>,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub is_checked: Option<bool>,
}

impl GroceryItemChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.quantity.is_none()
            && self.unit.is_none()
            && self.category.is_none()
            && self.is_checked.is_none()
    }
}
