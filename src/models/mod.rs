// Request/Response models
pub mod catalog;
pub mod common;
pub mod placement;
pub mod product_ext; // Extension methods for entity::products
pub mod purchase_ext; // Extension methods for entity::purchases
pub mod wallet;
