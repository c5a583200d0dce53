use diesel::prelude::*;

use crate::error::StoreError;
use crate::models::{
    GroceryItem, GroceryItemChanges, Ingredient, NewGroceryItem, NewIngredient, NewRecipe,
    NewRecipeIngredient, Recipe, RecipeIngredient,
};
use crate::schema::{grocery_items, ingredients, recipe_ingredients, recipes};

type StoreResult<T> = Result<T, StoreError>;

// ingredients

pub fn find_ingredient_by_name(conn: &mut SqliteConnection, name: &str) -> StoreResult<Option<Ingredient>> {
    let found = ingredients::table
        .filter(ingredients::name.eq(name))
        .select(Ingredient::as_select())
        .first(conn)
        .optional()?;
    Ok(found)
}

/// Inserts a new ingredient. The unique index on `name` is the source of
/// truth: a duplicate name fails with [`StoreError::ConstraintViolation`].
pub fn insert_ingredient(conn: &mut SqliteConnection, name: &str) -> StoreResult<Ingredient> {
    let ingredient = diesel::insert_into(ingredients::table)
        .values(&NewIngredient { name })
        .returning(Ingredient::as_returning())
        .get_result(conn)?;
    Ok(ingredient)
}

pub fn find_ingredient(conn: &mut SqliteConnection, ingredient_id: i32) -> StoreResult<Option<Ingredient>> {
    let found = ingredients::table
        .find(ingredient_id)
        .select(Ingredient::as_select())
        .first(conn)
        .optional()?;
    Ok(found)
}

pub fn list_ingredients(conn: &mut SqliteConnection) -> StoreResult<Vec<Ingredient>> {
    let all = ingredients::table
        .order((ingredients::name.asc(), ingredients::id.asc()))
        .select(Ingredient::as_select())
        .load(conn)?;
    Ok(all)
}

/// Deletes an ingredient. Its recipe links go with it; grocery items that
/// pointed at it keep their row with `ingredient_id` set to NULL.
pub fn delete_ingredient(conn: &mut SqliteConnection, ingredient_id: i32) -> StoreResult<()> {
    let deleted = diesel::delete(ingredients::table.find(ingredient_id)).execute(conn)?;
    if deleted == 0 {
        return Err(StoreError::NotFound("ingredient"));
    }
    Ok(())
}

pub fn links_for_ingredient(conn: &mut SqliteConnection, ingredient_id: i32) -> StoreResult<Vec<RecipeIngredient>> {
    let links = recipe_ingredients::table
        .filter(recipe_ingredients::ingredient_id.eq(ingredient_id))
        .order(recipe_ingredients::id.asc())
        .select(RecipeIngredient::as_select())
        .load(conn)?;
    Ok(links)
}

// recipes

pub fn insert_recipe(conn: &mut SqliteConnection, title: &str, instructions: Option<&str>) -> StoreResult<Recipe> {
    let recipe = diesel::insert_into(recipes::table)
        .values(&NewRecipe { title, instructions })
        .returning(Recipe::as_returning())
        .get_result(conn)?;
    Ok(recipe)
}

pub fn find_recipe(conn: &mut SqliteConnection, recipe_id: i32) -> StoreResult<Option<Recipe>> {
    let found = recipes::table
        .find(recipe_id)
        .select(Recipe::as_select())
        .first(conn)
        .optional()?;
    Ok(found)
}

pub fn list_recipes(conn: &mut SqliteConnection) -> StoreResult<Vec<Recipe>> {
    let all = recipes::table
        .order((recipes::title.asc(), recipes::id.asc()))
        .select(Recipe::as_select())
        .load(conn)?;
    Ok(all)
}

/// Deletes a recipe together with its ingredient links.
pub fn delete_recipe(conn: &mut SqliteConnection, recipe_id: i32) -> StoreResult<()> {
    let deleted = diesel::delete(recipes::table.find(recipe_id)).execute(conn)?;
    if deleted == 0 {
        return Err(StoreError::NotFound("recipe"));
    }
    Ok(())
}

pub fn insert_recipe_ingredient(conn: &mut SqliteConnection, link: &NewRecipeIngredient) -> StoreResult<RecipeIngredient> {
    let inserted = diesel::insert_into(recipe_ingredients::table)
        .values(link)
        .returning(RecipeIngredient::as_returning())
        .get_result(conn)?;
    Ok(inserted)
}

/// Adds the ingredient to the recipe, or replaces quantity and unit when the
/// recipe already lists it.
pub fn upsert_recipe_ingredient(conn: &mut SqliteConnection, link: &NewRecipeIngredient) -> StoreResult<RecipeIngredient> {
    let saved = diesel::insert_into(recipe_ingredients::table)
        .values(link)
        .on_conflict((recipe_ingredients::recipe_id, recipe_ingredients::ingredient_id))
        .do_update()
        .set((
            recipe_ingredients::quantity.eq(link.quantity),
            recipe_ingredients::unit.eq(link.unit),
        ))
        .returning(RecipeIngredient::as_returning())
        .get_result(conn)?;
    Ok(saved)
}

pub fn delete_recipe_ingredient(conn: &mut SqliteConnection, recipe_id: i32, ingredient_id: i32) -> StoreResult<()> {
    let deleted = diesel::delete(
        recipe_ingredients::table
            .filter(recipe_ingredients::recipe_id.eq(recipe_id))
            .filter(recipe_ingredients::ingredient_id.eq(ingredient_id)),
    )
    .execute(conn)?;
    if deleted == 0 {
        return Err(StoreError::NotFound("recipe ingredient"));
    }
    Ok(())
}

/// The recipe's ingredient links joined with their ingredients, by name.
pub fn recipe_lines(conn: &mut SqliteConnection, recipe_id: i32) -> StoreResult<Vec<(RecipeIngredient, Ingredient)>> {
    let lines = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq(recipe_id))
        .order((ingredients::name.asc(), recipe_ingredients::id.asc()))
        .select((RecipeIngredient::as_select(), Ingredient::as_select()))
        .load(conn)?;
    Ok(lines)
}

// grocery items

pub fn insert_grocery_item(conn: &mut SqliteConnection, item: &NewGroceryItem) -> StoreResult<GroceryItem> {
    let inserted = diesel::insert_into(grocery_items::table)
        .values(item)
        .returning(GroceryItem::as_returning())
        .get_result(conn)?;
    Ok(inserted)
}

pub fn find_grocery_item(conn: &mut SqliteConnection, item_id: i32) -> StoreResult<Option<GroceryItem>> {
    let found = grocery_items::table
        .find(item_id)
        .select(GroceryItem::as_select())
        .first(conn)
        .optional()?;
    Ok(found)
}

/// Unchecked items first, then grouped by category.
pub fn list_grocery_items(conn: &mut SqliteConnection) -> StoreResult<Vec<GroceryItem>> {
    let all = grocery_items::table
        .order((
            grocery_items::is_checked.asc(),
            grocery_items::category.asc(),
            grocery_items::name.asc(),
            grocery_items::id.asc(),
        ))
        .select(GroceryItem::as_select())
        .load(conn)?;
    Ok(all)
}

pub fn update_grocery_item(
    conn: &mut SqliteConnection,
    item_id: i32,
    changes: &GroceryItemChanges,
) -> StoreResult<GroceryItem> {
    let updated = diesel::update(grocery_items::table.find(item_id))
        .set(changes)
        .returning(GroceryItem::as_returning())
        .get_result(conn)
        .optional()?;
    updated.ok_or(StoreError::NotFound("grocery item"))
}

pub fn delete_grocery_item(conn: &mut SqliteConnection, item_id: i32) -> StoreResult<()> {
    let deleted = diesel::delete(grocery_items::table.find(item_id)).execute(conn)?;
    if deleted == 0 {
        return Err(StoreError::NotFound("grocery item"));
    }
    Ok(())
}

pub fn delete_checked_grocery_items(conn: &mut SqliteConnection) -> StoreResult<usize> {
    let deleted = diesel::delete(grocery_items::table.filter(grocery_items::is_checked.eq(true))).execute(conn)?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;

    fn link(recipe_id: i32, ingredient_id: i32) -> NewRecipeIngredient<'static> {
        NewRecipeIngredient {
            recipe_id,
            ingredient_id,
            quantity: Some("2"),
            unit: Some("cups"),
        }
    }

    fn grocery(name: &str, ingredient_id: Option<i32>) -> NewGroceryItem {
        NewGroceryItem {
            ingredient_id,
            name: name.to_string(),
            quantity: None,
            unit: None,
            category: None,
        }
    }

    #[test]
    fn duplicate_ingredient_name_is_a_constraint_violation() {
        let mut conn = testing::connection();
        insert_ingredient(&mut conn, "Salt").unwrap();

        let err = insert_ingredient(&mut conn, "Salt").unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)), "{err:?}");
        assert_eq!(list_ingredients(&mut conn).unwrap().len(), 1);
    }

    #[test]
    fn ingredient_lookup_is_exact_and_case_sensitive() {
        let mut conn = testing::connection();
        let salt = insert_ingredient(&mut conn, "Salt").unwrap();

        assert_eq!(find_ingredient_by_name(&mut conn, "Salt").unwrap(), Some(salt));
        assert_eq!(find_ingredient_by_name(&mut conn, "salt").unwrap(), None);
        assert_eq!(find_ingredient_by_name(&mut conn, "Salt ").unwrap(), None);

        // differently-cased names are distinct rows
        insert_ingredient(&mut conn, "salt").unwrap();
        assert_eq!(list_ingredients(&mut conn).unwrap().len(), 2);
    }

    #[test]
    fn ids_are_assigned_from_one_and_not_reused() {
        let mut conn = testing::connection();
        let first = insert_ingredient(&mut conn, "Salt").unwrap();
        assert_eq!(first.id, 1);

        delete_ingredient(&mut conn, first.id).unwrap();
        let second = insert_ingredient(&mut conn, "Salt").unwrap();
        assert_eq!(second.id, 2);
    }

    #[test]
    fn overlong_name_is_rejected_by_the_store() {
        let mut conn = testing::connection();
        let name = "x".repeat(121);
        let err = insert_ingredient(&mut conn, &name).unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)), "{err:?}");
    }

    #[test]
    fn recipe_cannot_list_an_ingredient_twice() {
        let mut conn = testing::connection();
        let recipe = insert_recipe(&mut conn, "Bread", None).unwrap();
        let flour = insert_ingredient(&mut conn, "Flour").unwrap();

        insert_recipe_ingredient(&mut conn, &link(recipe.id, flour.id)).unwrap();
        let err = insert_recipe_ingredient(&mut conn, &link(recipe.id, flour.id)).unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)), "{err:?}");
    }

    #[test]
    fn link_to_missing_recipe_violates_foreign_key() {
        let mut conn = testing::connection();
        let flour = insert_ingredient(&mut conn, "Flour").unwrap();

        let err = insert_recipe_ingredient(&mut conn, &link(42, flour.id)).unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)), "{err:?}");
    }

    #[test]
    fn upsert_replaces_quantity_of_existing_link() {
        let mut conn = testing::connection();
        let recipe = insert_recipe(&mut conn, "Bread", None).unwrap();
        let flour = insert_ingredient(&mut conn, "Flour").unwrap();
        let first = insert_recipe_ingredient(&mut conn, &link(recipe.id, flour.id)).unwrap();

        let updated = upsert_recipe_ingredient(
            &mut conn,
            &NewRecipeIngredient {
                recipe_id: recipe.id,
                ingredient_id: flour.id,
                quantity: Some("500"),
                unit: None,
            },
        )
        .unwrap();

        assert_eq!(updated.id, first.id);
        assert_eq!(updated.quantity.as_deref(), Some("500"));
        assert_eq!(updated.unit, None);
        assert_eq!(recipe_lines(&mut conn, recipe.id).unwrap().len(), 1);
    }

    #[test]
    fn deleting_recipe_cascades_to_its_links() {
        let mut conn = testing::connection();
        let bread = insert_recipe(&mut conn, "Bread", Some("Knead.")).unwrap();
        let pizza = insert_recipe(&mut conn, "Pizza", None).unwrap();
        let flour = insert_ingredient(&mut conn, "Flour").unwrap();
        let water = insert_ingredient(&mut conn, "Water").unwrap();
        insert_recipe_ingredient(&mut conn, &link(bread.id, flour.id)).unwrap();
        insert_recipe_ingredient(&mut conn, &link(bread.id, water.id)).unwrap();
        insert_recipe_ingredient(&mut conn, &link(pizza.id, flour.id)).unwrap();

        delete_recipe(&mut conn, bread.id).unwrap();

        assert!(recipe_lines(&mut conn, bread.id).unwrap().is_empty());
        assert_eq!(recipe_lines(&mut conn, pizza.id).unwrap().len(), 1);
        // ingredients themselves survive
        assert_eq!(list_ingredients(&mut conn).unwrap().len(), 2);
    }

    #[test]
    fn deleting_ingredient_cascades_links_and_detaches_grocery_items() {
        let mut conn = testing::connection();
        let bread = insert_recipe(&mut conn, "Bread", None).unwrap();
        let flour = insert_ingredient(&mut conn, "Flour").unwrap();
        insert_recipe_ingredient(&mut conn, &link(bread.id, flour.id)).unwrap();
        let item = insert_grocery_item(&mut conn, &grocery("Flour", Some(flour.id))).unwrap();

        delete_ingredient(&mut conn, flour.id).unwrap();

        assert!(links_for_ingredient(&mut conn, flour.id).unwrap().is_empty());
        assert!(recipe_lines(&mut conn, bread.id).unwrap().is_empty());
        let kept = find_grocery_item(&mut conn, item.id).unwrap().unwrap();
        assert_eq!(kept.name, "Flour");
        assert_eq!(kept.ingredient_id, None);
    }

    #[test]
    fn deleting_missing_rows_reports_not_found() {
        let mut conn = testing::connection();
        assert!(matches!(delete_recipe(&mut conn, 7), Err(StoreError::NotFound("recipe"))));
        assert!(matches!(delete_ingredient(&mut conn, 7), Err(StoreError::NotFound("ingredient"))));
        assert!(matches!(delete_grocery_item(&mut conn, 7), Err(StoreError::NotFound("grocery item"))));
        assert!(matches!(
            delete_recipe_ingredient(&mut conn, 7, 7),
            Err(StoreError::NotFound("recipe ingredient"))
        ));
    }

    #[test]
    fn grocery_items_default_to_unchecked_and_list_unchecked_first() {
        let mut conn = testing::connection();
        let milk = insert_grocery_item(&mut conn, &grocery("Milk", None)).unwrap();
        let eggs = insert_grocery_item(&mut conn, &grocery("Eggs", None)).unwrap();
        assert!(!milk.is_checked);

        let changes = GroceryItemChanges {
            is_checked: Some(true),
            ..Default::default()
        };
        let eggs = update_grocery_item(&mut conn, eggs.id, &changes).unwrap();
        assert!(eggs.is_checked);

        let names: Vec<_> = list_grocery_items(&mut conn)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Milk", "Eggs"]);

        assert_eq!(delete_checked_grocery_items(&mut conn).unwrap(), 1);
        assert_eq!(list_grocery_items(&mut conn).unwrap(), vec![milk]);
    }

    #[test]
    fn updating_missing_grocery_item_is_not_found() {
        let mut conn = testing::connection();
        let changes = GroceryItemChanges {
            is_checked: Some(true),
            ..Default::default()
        };
        assert!(matches!(
            update_grocery_item(&mut conn, 99, &changes),
            Err(StoreError::NotFound("grocery item"))
        ));
    }
}
