use anyhow::Result;
use std::sync::Arc;

use crate::builder::BuildSession;
use crate::catalog::ModelCatalog;
use crate::model::{ContainerKind, EntityDescriptor, ScalarType, TypeRef};

/// Qualifier for the compact consumer-facing view
pub const QUALIFIER_SUMMARY: &str = "summary";
/// Qualifier for the back-office view
pub const QUALIFIER_ADMIN: &str = "admin";

/// The built storefront sample model
pub struct StorefrontModel {
    pub customer: Arc<EntityDescriptor>,
    pub product: Arc<EntityDescriptor>,
    pub order: Arc<EntityDescriptor>,
}

impl StorefrontModel {
    /// Register all three entities in a catalog
    pub fn register(&self, catalog: &ModelCatalog) {
        catalog.insert(Arc::clone(&self.customer));
        catalog.insert(Arc::clone(&self.product));
        catalog.insert(Arc::clone(&self.order));
    }
}

/// Build the storefront sample model through the fluent builder API
///
/// Three entities (Customer, Product, Order) with concrete and by-key
/// relations, operations, and two qualifiers: "summary" hides back-office
/// members, "admin" surfaces them.
pub fn seed_storefront(session: &mut BuildSession) -> Result<StorefrontModel> {
    let customer = session
        .entity("Customer")
        .description_key("customer")
        .detail(QUALIFIER_SUMMARY, |d| d.with_render_hint("card"))
        .detail(QUALIFIER_ADMIN, |d| d.with_render_hint("table"))
        .property("id", |p| {
            p.typed(ScalarType::Integer).required().key().order(1)
        })
        .property("name", |p| {
            p.typed(ScalarType::Text)
                .required()
                .order(2)
                .description_key("customer.name")
        })
        .property("email", |p| {
            p.typed(ScalarType::Text)
                .order(3)
                .detail(QUALIFIER_SUMMARY, |d| d.hidden())
        })
        .property("createdAt", |p| {
            p.typed(ScalarType::Timestamp)
                .order(9)
                .hidden()
                .detail(QUALIFIER_ADMIN, |d| d.with_visible(true).with_order(90))
        })
        .collection_property("orders", |p| {
            p.element(TypeRef::entity("Order"))
                .hidden()
                .inline(true)
                .order(10)
        })
        .operation("describe", |op| {
            op.order(20)
                .description_key("customer.describe")
                .parameter("verbose", |p| p.typed(ScalarType::Boolean).index(0))
                .result(|r| r.typed(ScalarType::Text))
        })
        .build()?;

    let product = session
        .entity("Product")
        .description_key("product")
        .property("sku", |p| p.typed(ScalarType::Text).required().key().order(1))
        .property("title", |p| p.typed(ScalarType::Text).required().order(2))
        .property("price", |p| p.typed(ScalarType::Decimal).required().order(3))
        .collection_property("tags", |p| {
            p.container(ContainerKind::Set)
                .element(ScalarType::Text)
                .order(4)
                .detail(QUALIFIER_SUMMARY, |d| d.hidden())
        })
        .operation("restock", |op| {
            op.order(30)
                .parameter("amount", |p| p.typed(ScalarType::Integer).required())
                .collection_result(|r| r)
        })
        .build()?;

    let order = session
        .entity("Order")
        .description_key("order")
        .property("id", |p| {
            p.typed(ScalarType::Integer).required().key().order(1)
        })
        .property("placedAt", |p| {
            p.typed(ScalarType::Timestamp).required().order(2)
        })
        .property("customer", |p| {
            p.typed(TypeRef::entity("Customer")).required().order(3)
        })
        .collection_property("productSkus", |p| {
            p.container(ContainerKind::Set)
                .element(ScalarType::Text)
                .related_by_reference("Product")
                .order(4)
        })
        .property("total", |p| {
            p.typed(ScalarType::Decimal)
                .order(5)
                .detail(QUALIFIER_SUMMARY, |d| d.with_order(1))
        })
        .operation("cancel", |op| {
            op.order(10)
                .result(|r| r.typed(ScalarType::Boolean))
                .detail(QUALIFIER_ADMIN, |d| {
                    d.with_description_key("order.cancel.admin")
                })
        })
        .build()?;

    Ok(StorefrontModel {
        customer,
        product,
        order,
    })
}

/// Build the sample model and register it in a fresh catalog
pub fn seed_catalog(session: &mut BuildSession) -> Result<(ModelCatalog, StorefrontModel)> {
    let model = seed_storefront(session)?;
    let catalog = ModelCatalog::new();
    model.register(&catalog);
    Ok((catalog, model))
}
