diesel::table! {
    ingredients (id) {
        id -> Integer,
        #[max_length = 120]
        name -> Text,
    }
}

diesel::table! {
    recipes (id) {
        id -> Integer,
        #[max_length = 160]
        title -> Text,
        instructions -> Nullable<Text>,
    }
}

diesel::table! {
    recipe_ingredients (id) {
        id -> Integer,
        recipe_id -> Integer,
        ingredient_id -> Integer,
        #[max_length = 60]
        quantity -> Nullable<Text>,
        #[max_length = 30]
        unit -> Nullable<Text>,
    }
}

diesel::table! {
    grocery_items (id) {
        id -> Integer,
        ingredient_id -> Nullable<Integer>,
        #[max_length = 120]
        name -> Text,
        #[max_length = 60]
        quantity -> Nullable<Text>,
        #[max_length = 30]
        unit -> Nullable<Text>,
        #[max_length = 60]
        category -> Nullable<Text>,
        is_checked -> Bool,
    }
}

diesel::joinable!(recipe_ingredients -> recipes (recipe_id));
diesel::joinable!(recipe_ingredients -> ingredients (ingredient_id));
diesel::joinable!(grocery_items -> ingredients (ingredient_id));

diesel::allow_tables_to_appear_in_same_query!(
    ingredients,
    recipes,
    recipe_ingredients,
    grocery_items,
);
