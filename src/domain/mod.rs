//! Domain rules independent of storage and transport.

pub mod collection;
pub mod image;
pub mod limits;
pub mod password;
pub mod shopping;

pub use collection::RecipeCollection;
pub use image::{decode_image, DecodedImage, ImageFormat};
pub use shopping::{render_shopping_list, ShoppingLine};
