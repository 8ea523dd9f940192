//! Per-user recipe collections: favorites and the shopping cart.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeCollection {
    Favorites,
    ShoppingCart,
}

impl RecipeCollection {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::ShoppingCart => "cart_items",
        }
    }

    pub fn already_present_message(&self) -> &'static str {
        match self {
            Self::Favorites => "recipe is already in favorites",
            Self::ShoppingCart => "recipe is already in the shopping cart",
        }
    }

    pub fn absent_message(&self) -> &'static str {
        match self {
            Self::Favorites => "recipe is not in favorites",
            Self::ShoppingCart => "recipe is not in the shopping cart",
        }
    }
}
