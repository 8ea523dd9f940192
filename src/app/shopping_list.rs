//! Shopping list: ingredient totals over every recipe in the cart.

use super::auth::AuthUser;
use crate::domain::{render_shopping_list, ShoppingLine};
use crate::error::AppError;
use crate::infra::{get_connection, DbPool};

pub fn shopping_list_lines(pool: &DbPool, actor: AuthUser) -> Result<Vec<ShoppingLine>, AppError> {
    let conn = get_connection(pool);
    let mut stmt = conn.prepare(
        "SELECT i.name, i.measurement_unit, SUM(ri.amount) AS total
         FROM cart_items c
         JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
         JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE c.user_id = ?1
         GROUP BY i.name, i.measurement_unit
         ORDER BY i.name, i.measurement_unit",
    )?;
    let rows = stmt.query_map([actor.id], |r| {
        Ok(ShoppingLine {
            name: r.get(0)?,
            unit: r.get(1)?,
            total: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn shopping_list_text(pool: &DbPool, actor: AuthUser) -> Result<String, AppError> {
    let lines = shopping_list_lines(pool, actor)?;
    Ok(render_shopping_list(&lines))
}
