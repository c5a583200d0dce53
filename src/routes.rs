use actix_web::{delete, get, patch, post, put, web, HttpRequest, HttpResponse};

use crate::db::Store;
use crate::error::ServiceError;
use crate::payload::{CreateGroceryItem, CreateIngredient, CreateRecipe, Deleted, IngredientLine, UpdateGroceryItem};
use crate::service;

type HandlerResult = Result<HttpResponse, ServiceError>;

/// Registers every endpoint plus the JSON and path extractor configs.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(create_ingredient)
        .service(list_ingredients)
        .service(get_ingredient)
        .service(delete_ingredient)
        .service(create_recipe)
        .service(list_recipes)
        .service(get_recipe)
        .service(delete_recipe)
        .service(set_recipe_ingredient)
        .service(remove_recipe_ingredient)
        .service(add_recipe_to_groceries)
        .service(list_grocery_items)
        .service(add_grocery_item)
        // before /{id} so "checked" is not taken for an id
        .service(clear_checked_grocery_items)
        .service(update_grocery_item)
        .service(delete_grocery_item);
}

/// Malformed bodies answer with the same `{"detail": ...}` shape as other errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req: &HttpRequest| ServiceError::InvalidPayload(err.to_string()).into())
}

/// Unparsable ids (`/api/recipes/abc`) are client errors with a `detail` body.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req: &HttpRequest| {
        ServiceError::validation(format!("Invalid path parameter: {}", err)).into()
    })
}

#[post("/api/ingredients")]
async fn create_ingredient(store: web::Data<Store>, payload: web::Json<CreateIngredient>) -> HandlerResult {
    let CreateIngredient { name } = payload.into_inner();
    let ingredient = store
        .run(move |conn| {
            let ingredient = service::create_or_get_ingredient(conn, &name)?;
            service::ingredient_detail(conn, ingredient)
        })
        .await?;
    Ok(HttpResponse::Ok().json(ingredient))
}

#[get("/api/ingredients")]
async fn list_ingredients(store: web::Data<Store>) -> HandlerResult {
    let ingredients = store.run(service::list_ingredients).await?;
    Ok(HttpResponse::Ok().json(ingredients))
}

#[get("/api/ingredients/{id}")]
async fn get_ingredient(store: web::Data<Store>, ingredient_id: web::Path<i32>) -> HandlerResult {
    let ingredient_id = ingredient_id.into_inner();
    let ingredient = store
        .run(move |conn| service::get_ingredient(conn, ingredient_id))
        .await?;
    Ok(HttpResponse::Ok().json(ingredient))
}

#[delete("/api/ingredients/{id}")]
async fn delete_ingredient(store: web::Data<Store>, ingredient_id: web::Path<i32>) -> HandlerResult {
    let ingredient_id = ingredient_id.into_inner();
    store
        .run(move |conn| service::delete_ingredient(conn, ingredient_id))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/api/recipes")]
async fn create_recipe(store: web::Data<Store>, payload: web::Json<CreateRecipe>) -> HandlerResult {
    let request = payload.into_inner();
    let recipe = store
        .run(move |conn| service::create_recipe(conn, &request))
        .await?;
    Ok(HttpResponse::Ok().json(recipe))
}

#[get("/api/recipes")]
async fn list_recipes(store: web::Data<Store>) -> HandlerResult {
    let recipes = store.run(service::list_recipes).await?;
    Ok(HttpResponse::Ok().json(recipes))
}

#[get("/api/recipes/{id}")]
async fn get_recipe(store: web::Data<Store>, recipe_id: web::Path<i32>) -> HandlerResult {
    let recipe_id = recipe_id.into_inner();
    let recipe = store
        .run(move |conn| service::get_recipe(conn, recipe_id))
        .await?;
    Ok(HttpResponse::Ok().json(recipe))
}

#[delete("/api/recipes/{id}")]
async fn delete_recipe(store: web::Data<Store>, recipe_id: web::Path<i32>) -> HandlerResult {
    let recipe_id = recipe_id.into_inner();
    store
        .run(move |conn| service::delete_recipe(conn, recipe_id))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[put("/api/recipes/{id}/ingredients")]
async fn set_recipe_ingredient(
    store: web::Data<Store>,
    recipe_id: web::Path<i32>,
    payload: web::Json<IngredientLine>,
) -> HandlerResult {
    let recipe_id = recipe_id.into_inner();
    let line = payload.into_inner();
    let recipe = store
        .run(move |conn| service::set_recipe_ingredient(conn, recipe_id, &line))
        .await?;
    Ok(HttpResponse::Ok().json(recipe))
}

#[delete("/api/recipes/{id}/ingredients/{ingredient_id}")]
async fn remove_recipe_ingredient(store: web::Data<Store>, path: web::Path<(i32, i32)>) -> HandlerResult {
    let (recipe_id, ingredient_id) = path.into_inner();
    store
        .run(move |conn| service::remove_recipe_ingredient(conn, recipe_id, ingredient_id))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/api/recipes/{id}/groceries")]
async fn add_recipe_to_groceries(store: web::Data<Store>, recipe_id: web::Path<i32>) -> HandlerResult {
    let recipe_id = recipe_id.into_inner();
    let items = store
        .run(move |conn| service::add_recipe_to_groceries(conn, recipe_id))
        .await?;
    Ok(HttpResponse::Ok().json(items))
}

#[get("/api/groceries")]
async fn list_grocery_items(store: web::Data<Store>) -> HandlerResult {
    let items = store.run(service::list_grocery_items).await?;
    Ok(HttpResponse::Ok().json(items))
}

#[post("/api/groceries")]
async fn add_grocery_item(store: web::Data<Store>, payload: web::Json<CreateGroceryItem>) -> HandlerResult {
    let request = payload.into_inner();
    let item = store
        .run(move |conn| service::add_grocery_item(conn, &request))
        .await?;
    Ok(HttpResponse::Ok().json(item))
}

#[delete("/api/groceries/checked")]
async fn clear_checked_grocery_items(store: web::Data<Store>) -> HandlerResult {
    let deleted = store.run(service::clear_checked_grocery_items).await?;
    Ok(HttpResponse::Ok().json(Deleted { deleted }))
}

#[patch("/api/groceries/{id}")]
async fn update_grocery_item(
    store: web::Data<Store>,
    item_id: web::Path<i32>,
    payload: web::Json<UpdateGroceryItem>,
) -> HandlerResult {
    let item_id = item_id.into_inner();
    let request = payload.into_inner();
    let item = store
        .run(move |conn| service::update_grocery_item(conn, item_id, &request))
        .await?;
    Ok(HttpResponse::Ok().json(item))
}

#[delete("/api/groceries/{id}")]
async fn delete_grocery_item(store: web::Data<Store>, item_id: web::Path<i32>) -> HandlerResult {
    let item_id = item_id.into_inner();
    store
        .run(move |conn| service::delete_grocery_item(conn, item_id))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
