//! Recipe CRUD, filtering and permission integration tests

mod common;

use common::{
    create_recipe, recipe_req, register, reject_writes, seed_catalog, stored_files, superuser,
    temp_media, GIF_DATA_URI, PNG_DATA_URI,
};
use foodgram::app::{
    collection_add, recipe_create, recipe_delete, recipe_get, recipe_list, recipe_short_link,
    recipe_update, PageReq, RecipeIngredientReq, RecipeListReq, RecipeUpdateReq,
};
use foodgram::domain::RecipeCollection;
use foodgram::infra::init_test_db;
use serde_json::json;

fn full_update(tags: Vec<i64>, ingredients: &[(i64, i64)]) -> RecipeUpdateReq {
    RecipeUpdateReq {
        tags: Some(tags),
        ingredients: Some(
            ingredients
                .iter()
                .map(|&(id, amount)| RecipeIngredientReq { id, amount })
                .collect(),
        ),
        ..Default::default()
    }
}

// ══════════════════════════════════════════════════════════
//  recipe_create
// ══════════════════════════════════════════════════════════

#[test]
fn create_recipe_returns_full_view() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");

    let recipe = create_recipe(
        &pool,
        &media,
        alice,
        "Pancakes",
        vec![c.breakfast],
        &[(c.milk, 300), (c.flour, 200)],
    );

    assert_eq!(recipe.name, "Pancakes");
    assert_eq!(recipe.author.id, alice.id);
    assert_eq!(recipe.cooking_time, 15);
    assert_eq!(recipe.tags.len(), 1);
    assert_eq!(recipe.tags[0].slug, "breakfast");
    let ingredients: Vec<(&str, &str, i64)> = recipe
        .ingredients
        .iter()
        .map(|i| (i.name.as_str(), i.measurement_unit.as_str(), i.amount))
        .collect();
    assert_eq!(ingredients, vec![("flour", "g", 200), ("milk", "ml", 300)]);
    assert!(!recipe.is_favorited);
    assert!(!recipe.is_in_shopping_cart);
    assert!(recipe.image.starts_with("/media/recipes/images/"));
    assert!(media.path_for(&recipe.image).unwrap().exists());
}

#[test]
fn create_recipe_validation_errors() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");

    let cases = vec![
        ("no ingredients", recipe_req("R", vec![c.dinner], &[])),
        ("no tags", recipe_req("R", vec![], &[(c.egg, 1)])),
        ("duplicate ingredient", recipe_req("R", vec![c.dinner], &[(c.egg, 1), (c.egg, 2)])),
        ("duplicate tag", recipe_req("R", vec![c.dinner, c.dinner], &[(c.egg, 1)])),
        ("unknown ingredient", recipe_req("R", vec![c.dinner], &[(9999, 1)])),
        ("unknown tag", recipe_req("R", vec![9999], &[(c.egg, 1)])),
        ("zero amount", recipe_req("R", vec![c.dinner], &[(c.egg, 0)])),
        ("huge amount", recipe_req("R", vec![c.dinner], &[(c.egg, 32_001)])),
        ("blank name", recipe_req("  ", vec![c.dinner], &[(c.egg, 1)])),
    ];
    for (label, req) in cases {
        let err = recipe_create(&pool, &media, alice, req).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR", "case: {}", label);
    }

    let mut req = recipe_req("R", vec![c.dinner], &[(c.egg, 1)]);
    req.cooking_time = 0;
    assert_eq!(
        recipe_create(&pool, &media, alice, req).unwrap_err().code(),
        "VALIDATION_ERROR"
    );

    let mut req = recipe_req("R", vec![c.dinner], &[(c.egg, 1)]);
    req.image = "data:image/png;base64,not-base64!".to_string();
    assert_eq!(
        recipe_create(&pool, &media, alice, req).unwrap_err().code(),
        "VALIDATION_ERROR"
    );

    let mut req = recipe_req("R", vec![c.dinner], &[(c.egg, 1)]);
    req.text = String::new();
    assert_eq!(
        recipe_create(&pool, &media, alice, req).unwrap_err().code(),
        "VALIDATION_ERROR"
    );

    let page = recipe_list(&pool, RecipeListReq::default(), PageReq::default(), None).unwrap();
    assert_eq!(page.total, 0);
}

#[test]
fn create_recipe_accepts_gif_image() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let mut req = recipe_req("Soup", vec![c.dinner], &[(c.milk, 1)]);
    req.image = GIF_DATA_URI.to_string();

    let recipe = recipe_create(&pool, &media, alice, req).unwrap();

    assert!(recipe.image.ends_with(".gif"));
}

// ══════════════════════════════════════════════════════════
//  recipe_get / recipe_list
// ══════════════════════════════════════════════════════════

#[test]
fn get_recipe_not_found() {
    let pool = init_test_db();

    let err = recipe_get(&pool, 1, None).unwrap_err();

    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn get_recipe_flags_follow_viewer() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let bob = register(&pool, "bob");
    let recipe = create_recipe(&pool, &media, alice, "Pancakes", vec![c.breakfast], &[(c.egg, 2)]);
    collection_add(&pool, RecipeCollection::Favorites, bob, recipe.id).unwrap();

    let for_bob = recipe_get(&pool, recipe.id, Some(bob.id)).unwrap();
    assert!(for_bob.is_favorited);
    assert!(!for_bob.is_in_shopping_cart);

    let for_alice = recipe_get(&pool, recipe.id, Some(alice.id)).unwrap();
    assert!(!for_alice.is_favorited);

    let anonymous = recipe_get(&pool, recipe.id, None).unwrap();
    assert!(!anonymous.is_favorited);
}

#[test]
fn list_recipes_newest_first_with_pagination() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let ids: Vec<i64> = (0..7)
        .map(|i| {
            create_recipe(&pool, &media, alice, &format!("R{}", i), vec![c.dinner], &[(c.egg, 1)]).id
        })
        .collect();

    let first = recipe_list(&pool, RecipeListReq::default(), PageReq::default(), None).unwrap();
    assert_eq!(first.total, 7);
    assert_eq!(first.items.len(), 6);
    assert_eq!(first.items[0].id, ids[6]);

    let second =
        recipe_list(&pool, RecipeListReq::default(), PageReq::new(Some(2), None), None).unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].id, ids[0]);

    let err =
        recipe_list(&pool, RecipeListReq::default(), PageReq::new(Some(3), None), None).unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn list_recipes_filter_by_author_and_tags() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let bob = register(&pool, "bob");
    let morning = create_recipe(&pool, &media, alice, "Porridge", vec![c.breakfast], &[(c.milk, 200)]);
    let both = create_recipe(
        &pool,
        &media,
        alice,
        "Eggs",
        vec![c.breakfast, c.dinner],
        &[(c.egg, 2)],
    );
    let evening = create_recipe(&pool, &media, bob, "Stew", vec![c.dinner], &[(c.flour, 10)]);

    let by_author = recipe_list(
        &pool,
        RecipeListReq {
            author: Some(bob.id),
            ..Default::default()
        },
        PageReq::default(),
        None,
    )
    .unwrap();
    assert_eq!(by_author.items.len(), 1);
    assert_eq!(by_author.items[0].id, evening.id);

    let breakfast = recipe_list(
        &pool,
        RecipeListReq {
            tags: vec!["breakfast".to_string()],
            ..Default::default()
        },
        PageReq::default(),
        None,
    )
    .unwrap();
    let ids: Vec<i64> = breakfast.items.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![both.id, morning.id]);

    // several tags match any of them, without duplicates
    let any = recipe_list(
        &pool,
        RecipeListReq {
            tags: vec!["breakfast".to_string(), "dinner".to_string()],
            ..Default::default()
        },
        PageReq::default(),
        None,
    )
    .unwrap();
    assert_eq!(any.total, 3);
}

#[test]
fn list_recipes_favorited_and_cart_filters() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let bob = register(&pool, "bob");
    let a = create_recipe(&pool, &media, alice, "A", vec![c.dinner], &[(c.egg, 1)]);
    let b = create_recipe(&pool, &media, alice, "B", vec![c.dinner], &[(c.egg, 1)]);
    collection_add(&pool, RecipeCollection::Favorites, bob, a.id).unwrap();
    collection_add(&pool, RecipeCollection::ShoppingCart, bob, b.id).unwrap();

    let favorited = RecipeListReq {
        is_favorited: true,
        ..Default::default()
    };
    let page = recipe_list(&pool, favorited.clone(), PageReq::default(), Some(bob.id)).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, a.id);
    assert!(page.items[0].is_favorited);

    let in_cart = RecipeListReq {
        is_in_shopping_cart: true,
        ..Default::default()
    };
    let page = recipe_list(&pool, in_cart, PageReq::default(), Some(bob.id)).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, b.id);

    // ignored for anonymous viewers
    let page = recipe_list(&pool, favorited, PageReq::default(), None).unwrap();
    assert_eq!(page.total, 2);
}

// ══════════════════════════════════════════════════════════
//  recipe_update
// ══════════════════════════════════════════════════════════

#[test]
fn update_recipe_replaces_tags_and_ingredients() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let recipe = create_recipe(&pool, &media, alice, "Pancakes", vec![c.breakfast], &[(c.flour, 200)]);

    let mut req = full_update(vec![c.dinner], &[(c.egg, 4)]);
    req.name = Some("Crepes".to_string());
    req.cooking_time = Some(30);
    let updated = recipe_update(&pool, &media, alice, recipe.id, req).unwrap();

    assert_eq!(updated.name, "Crepes");
    assert_eq!(updated.text, recipe.text);
    assert_eq!(updated.cooking_time, 30);
    assert_eq!(updated.image, recipe.image);
    assert_eq!(updated.tags.len(), 1);
    assert_eq!(updated.tags[0].id, c.dinner);
    assert_eq!(updated.ingredients.len(), 1);
    assert_eq!(updated.ingredients[0].id, c.egg);
    assert_eq!(updated.ingredients[0].amount, 4);
}

#[test]
fn update_recipe_new_image_removes_old_file() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let recipe = create_recipe(&pool, &media, alice, "Pancakes", vec![c.breakfast], &[(c.flour, 200)]);
    let old_path = media.path_for(&recipe.image).unwrap();

    let mut req = full_update(vec![c.breakfast], &[(c.flour, 200)]);
    req.image = Some(Some(PNG_DATA_URI.to_string()));
    let updated = recipe_update(&pool, &media, alice, recipe.id, req).unwrap();

    assert_ne!(updated.image, recipe.image);
    assert!(!old_path.exists());
    assert!(media.path_for(&updated.image).unwrap().exists());
}

#[test]
fn update_recipe_rejects_empty_or_null_image() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let recipe = create_recipe(&pool, &media, alice, "Pancakes", vec![c.breakfast], &[(c.flour, 200)]);

    let mut empty = full_update(vec![c.breakfast], &[(c.flour, 200)]);
    empty.image = Some(Some(String::new()));
    let err = recipe_update(&pool, &media, alice, recipe.id, empty).unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");

    let null: RecipeUpdateReq = serde_json::from_value(json!({
        "image": null,
        "tags": [c.breakfast],
        "ingredients": [{"id": c.flour, "amount": 200}],
    }))
    .unwrap();
    assert_eq!(null.image, Some(None));
    let err = recipe_update(&pool, &media, alice, recipe.id, null).unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");

    let omitted: RecipeUpdateReq = serde_json::from_value(json!({
        "tags": [c.breakfast],
        "ingredients": [{"id": c.flour, "amount": 200}],
    }))
    .unwrap();
    assert_eq!(omitted.image, None);
    let kept = recipe_update(&pool, &media, alice, recipe.id, omitted).unwrap();
    assert_eq!(kept.image, recipe.image);
}

#[test]
fn update_recipe_failed_write_drops_new_image() {
    let pool = init_test_db();
    let (dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let recipe = create_recipe(&pool, &media, alice, "Pancakes", vec![c.breakfast], &[(c.flour, 200)]);
    reject_writes(&pool, "UPDATE", "recipes");

    let mut req = full_update(vec![c.breakfast], &[(c.flour, 200)]);
    req.image = Some(Some(PNG_DATA_URI.to_string()));
    let err = recipe_update(&pool, &media, alice, recipe.id, req).unwrap_err();

    assert_eq!(err.code(), "DB_ERROR");
    assert_eq!(stored_files(&dir, "recipes/images"), 1);
    assert!(media.path_for(&recipe.image).unwrap().exists());
    assert_eq!(recipe_get(&pool, recipe.id, None).unwrap().image, recipe.image);
}

#[test]
fn create_recipe_failed_write_leaves_no_file() {
    let pool = init_test_db();
    let (dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    reject_writes(&pool, "INSERT", "recipe_ingredients");

    let req = recipe_req("Pancakes", vec![c.breakfast], &[(c.egg, 2)]);
    let err = recipe_create(&pool, &media, alice, req).unwrap_err();

    assert_eq!(err.code(), "DB_ERROR");
    assert_eq!(stored_files(&dir, "recipes/images"), 0);
    let page = recipe_list(&pool, RecipeListReq::default(), PageReq::default(), None).unwrap();
    assert_eq!(page.total, 0);
}

#[test]
fn update_recipe_requires_tags_and_ingredients() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let recipe = create_recipe(&pool, &media, alice, "Pancakes", vec![c.breakfast], &[(c.flour, 200)]);

    let no_tags = RecipeUpdateReq {
        tags: None,
        ..full_update(vec![], &[(c.flour, 1)])
    };
    let err = recipe_update(&pool, &media, alice, recipe.id, no_tags).unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");

    let no_ingredients = RecipeUpdateReq {
        ingredients: None,
        ..full_update(vec![c.dinner], &[])
    };
    let err = recipe_update(&pool, &media, alice, recipe.id, no_ingredients).unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");

    let unchanged = recipe_get(&pool, recipe.id, None).unwrap();
    assert_eq!(unchanged.tags[0].id, c.breakfast);
}

#[test]
fn update_recipe_by_other_user_is_forbidden() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let bob = register(&pool, "bob");
    let recipe = create_recipe(&pool, &media, alice, "Pancakes", vec![c.breakfast], &[(c.flour, 200)]);

    let err = recipe_update(
        &pool,
        &media,
        bob,
        recipe.id,
        full_update(vec![c.dinner], &[(c.egg, 1)]),
    )
    .unwrap_err();

    assert_eq!(err.code(), "PERMISSION_DENIED");
}

#[test]
fn superuser_may_update_and_delete_any_recipe() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let admin = superuser(&pool, "admin");
    let recipe = create_recipe(&pool, &media, alice, "Pancakes", vec![c.breakfast], &[(c.flour, 200)]);

    let updated = recipe_update(
        &pool,
        &media,
        admin,
        recipe.id,
        full_update(vec![c.dinner], &[(c.egg, 1)]),
    )
    .unwrap();
    assert_eq!(updated.author.id, alice.id);

    recipe_delete(&pool, &media, admin, recipe.id).unwrap();
    assert_eq!(recipe_get(&pool, recipe.id, None).unwrap_err().code(), "NOT_FOUND");
}

#[test]
fn update_missing_recipe_is_not_found() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");

    let err = recipe_update(&pool, &media, alice, 77, full_update(vec![c.dinner], &[(c.egg, 1)]))
        .unwrap_err();

    assert_eq!(err.code(), "NOT_FOUND");
}

// ══════════════════════════════════════════════════════════
//  recipe_delete / recipe_short_link
// ══════════════════════════════════════════════════════════

#[test]
fn delete_recipe_removes_image_and_memberships() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let bob = register(&pool, "bob");
    let recipe = create_recipe(&pool, &media, alice, "Pancakes", vec![c.breakfast], &[(c.flour, 200)]);
    collection_add(&pool, RecipeCollection::ShoppingCart, bob, recipe.id).unwrap();
    let image_path = media.path_for(&recipe.image).unwrap();

    let err = recipe_delete(&pool, &media, bob, recipe.id).unwrap_err();
    assert_eq!(err.code(), "PERMISSION_DENIED");

    recipe_delete(&pool, &media, alice, recipe.id).unwrap();

    assert!(!image_path.exists());
    let in_cart = RecipeListReq {
        is_in_shopping_cart: true,
        ..Default::default()
    };
    let page = recipe_list(&pool, in_cart, PageReq::default(), Some(bob.id)).unwrap();
    assert_eq!(page.total, 0);
}

#[test]
fn short_link_points_at_frontend_page() {
    let pool = init_test_db();
    let (_dir, media) = temp_media();
    let c = seed_catalog(&pool);
    let alice = register(&pool, "alice");
    let recipe = create_recipe(&pool, &media, alice, "Pancakes", vec![c.breakfast], &[(c.flour, 200)]);

    let link = recipe_short_link(&pool, recipe.id, "https://foodgram.example/").unwrap();
    assert_eq!(
        link.short_link,
        format!("https://foodgram.example/recipes/{}", recipe.id)
    );

    let err = recipe_short_link(&pool, recipe.id + 1, "https://foodgram.example").unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}
