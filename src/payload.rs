//! JSON bodies accepted and returned by the HTTP API.

use serde::{Deserialize, Serialize};

use crate::models::{Ingredient, Recipe, RecipeIngredient};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIngredient {
    pub name: String,
}

/// An ingredient with the recipe links that reference it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientDetail {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    #[serde(default)]
    pub recipe_links: Vec<RecipeIngredient>,
}

/// An ingredient named in a recipe request; created on the fly if unknown.
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientLine {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecipe {
    pub title: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub id: i32,
    pub ingredient_id: i32,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
}

impl From<(RecipeIngredient, Ingredient)> for RecipeLine {
    fn from((link, ingredient): (RecipeIngredient, Ingredient)) -> Self {
        RecipeLine {
            id: link.id,
            ingredient_id: ingredient.id,
            name: ingredient.name,
            quantity: link.quantity,
            unit: link.unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroceryItem {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub ingredient_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGroceryItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_checked: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub deleted: usize,
}
