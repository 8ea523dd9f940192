//! Shared fixtures for integration tests.
#![allow(dead_code)]

use foodgram::app::{
    ingredient_create, recipe_create, tag_create, user_create_superuser, user_register, AuthUser,
    IngredientCreateReq, RecipeCreateReq, RecipeDto, RecipeIngredientReq, TagCreateReq,
    UserRegisterReq,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use foodgram::infra::db::get_connection;
use foodgram::infra::{DbPool, MediaStore};
use tempfile::TempDir;

pub const PASSWORD: &str = "Str0ng-pass";

/// Smallest payload the image sniffer accepts as PNG.
pub const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAAA";
pub const JPEG_DATA_URI: &str = "data:image/jpeg;base64,/9j/4AAQ";
pub const GIF_DATA_URI: &str = "data:image/gif;base64,R0lGODlhAQA=";

pub fn register_req(username: &str) -> UserRegisterReq {
    UserRegisterReq {
        email: format!("{}@example.com", username),
        username: username.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        password: PASSWORD.to_string(),
    }
}

pub fn register(pool: &DbPool, username: &str) -> AuthUser {
    let user = user_register(pool, register_req(username)).unwrap();
    AuthUser {
        id: user.id,
        is_superuser: false,
    }
}

pub fn superuser(pool: &DbPool, username: &str) -> AuthUser {
    let user = user_create_superuser(pool, register_req(username)).unwrap();
    AuthUser {
        id: user.id,
        is_superuser: true,
    }
}

pub struct Catalog {
    pub breakfast: i64,
    pub dinner: i64,
    pub flour: i64,
    pub milk: i64,
    pub egg: i64,
}

pub fn seed_catalog(pool: &DbPool) -> Catalog {
    let tag = |name: &str, slug: &str| {
        tag_create(
            pool,
            TagCreateReq {
                name: name.to_string(),
                slug: slug.to_string(),
            },
        )
        .unwrap()
        .id
    };
    let ingredient = |name: &str, unit: &str| {
        ingredient_create(
            pool,
            IngredientCreateReq {
                name: name.to_string(),
                measurement_unit: unit.to_string(),
            },
        )
        .unwrap()
        .id
    };
    Catalog {
        breakfast: tag("Breakfast", "breakfast"),
        dinner: tag("Dinner", "dinner"),
        flour: ingredient("flour", "g"),
        milk: ingredient("milk", "ml"),
        egg: ingredient("egg", "pcs"),
    }
}

/// PNG data URI whose decoded payload is exactly `len` bytes.
pub fn png_data_uri(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    bytes[..8].copy_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

/// Number of files stored under `<media root>/<dir>`.
pub fn stored_files(root: &TempDir, dir: &str) -> usize {
    std::fs::read_dir(root.path().join(dir))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

/// Make every `op` (INSERT, UPDATE, DELETE) on `table` fail from now on.
pub fn reject_writes(pool: &DbPool, op: &str, table: &str) {
    get_connection(pool)
        .execute_batch(&format!(
            "CREATE TRIGGER reject_{op}_{table} BEFORE {op} ON {table} \
             BEGIN SELECT RAISE(ABORT, 'writes disabled'); END;"
        ))
        .unwrap();
}

pub fn temp_media() -> (TempDir, MediaStore) {
    let dir = tempfile::tempdir().unwrap();
    let media = MediaStore::new(dir.path(), "/media/");
    (dir, media)
}

pub fn recipe_req(name: &str, tags: Vec<i64>, ingredients: &[(i64, i64)]) -> RecipeCreateReq {
    RecipeCreateReq {
        name: name.to_string(),
        text: format!("How to cook {}", name),
        cooking_time: 15,
        image: PNG_DATA_URI.to_string(),
        ingredients: ingredients
            .iter()
            .map(|&(id, amount)| RecipeIngredientReq { id, amount })
            .collect(),
        tags,
    }
}

pub fn create_recipe(
    pool: &DbPool,
    media: &MediaStore,
    actor: AuthUser,
    name: &str,
    tags: Vec<i64>,
    ingredients: &[(i64, i64)],
) -> RecipeDto {
    recipe_create(pool, media, actor, recipe_req(name, tags, ingredients)).unwrap()
}
