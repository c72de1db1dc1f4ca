pub mod data;

pub use data::{seed_catalog, seed_storefront, StorefrontModel, QUALIFIER_ADMIN, QUALIFIER_SUMMARY};
