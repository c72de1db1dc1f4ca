use serde_json::json;

use metadesc::{
    seed_catalog, seed_storefront, set_value, value_of, Adaptable, BuildSession, Capability,
    EngineConfig, MemberInfo, RelationKind, ScalarType, TypeRef, QUALIFIER_ADMIN,
    QUALIFIER_SUMMARY,
};

#[test]
fn test_storefront_complete_workflow() {
    println!("🚀 Starting storefront metadata workflow");

    // Step 1: fresh build session with the default configuration
    println!("1. Creating build session");
    let mut session =
        BuildSession::with_config(EngineConfig::default()).expect("Failed to create session");

    // Step 2: seed the model and register it in a catalog
    println!("2. Seeding the storefront model");
    let (catalog, model) = seed_catalog(&mut session).expect("Failed to seed model");
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.names(), ["Customer", "Order", "Product"]);
    assert!(catalog.keyed("Customer").is_some());
    println!("✅ Catalog holds {} entities", catalog.len());

    // Step 3: qualifiers were discovered in registration order
    println!("3. Verifying qualifier discovery order");
    let qualifiers: Vec<&str> = session.qualifiers().iter().map(|q| q.as_str()).collect();
    assert_eq!(qualifiers, ["summary", "admin"]);

    // Step 4: base member lists are ordered and visibility-filtered
    println!("4. Verifying Customer base member lists");
    let properties: Vec<&str> = model
        .customer
        .layout
        .properties
        .iter()
        .map(|m| m.name())
        .collect();
    // createdAt is hidden; orders is hidden but kept as an inline relation
    assert_eq!(properties, ["id", "name", "email", "orders"]);
    let members: Vec<&str> = model
        .customer
        .layout
        .members
        .iter()
        .map(|m| m.name())
        .collect();
    assert_eq!(members, ["id", "name", "email", "orders", "describe"]);

    // Step 5: the summary view hides email and resolves its own detail
    println!("5. Verifying the summary view of Customer");
    let summary = model.customer.reference(QUALIFIER_SUMMARY);
    assert!(summary.is_recognized());
    assert_eq!(summary.render_hint(), Some("card"));
    assert_eq!(summary.description_key(), Some("customer"));
    let names: Vec<&str> = summary.ordered_properties().iter().map(|m| m.name()).collect();
    assert_eq!(names, ["id", "name", "orders"]);

    // Step 6: the admin view surfaces createdAt at its override position
    println!("6. Verifying the admin view of Customer");
    let admin = model.customer.reference(QUALIFIER_ADMIN);
    assert_eq!(admin.render_hint(), Some("table"));
    let names: Vec<&str> = admin.ordered_members().iter().map(|m| m.name()).collect();
    assert_eq!(
        names,
        ["id", "name", "email", "orders", "describe", "createdAt"]
    );

    // Step 7: an unknown qualifier degrades to the base view
    println!("7. Verifying an unknown qualifier falls back to the base");
    let mobile = model.customer.reference("mobile");
    assert!(!mobile.is_recognized());
    let names: Vec<&str> = mobile.ordered_properties().iter().map(|m| m.name()).collect();
    assert_eq!(names, ["id", "name", "email", "orders"]);

    // Step 8: order overrides rearrange the summary list of Order
    println!("8. Verifying the summary view of Order promotes total");
    let order_summary = model.order.reference(QUALIFIER_SUMMARY);
    let names: Vec<&str> = order_summary
        .ordered_properties()
        .iter()
        .map(|m| m.name())
        .collect();
    assert_eq!(names, ["id", "total", "placedAt", "customer", "productSkus"]);

    // Step 9: operation overlays resolve their own presentation
    println!("9. Verifying the admin overlay on Order.cancel");
    let order_admin = model.order.reference(QUALIFIER_ADMIN);
    let cancel = order_admin.member("cancel").expect("cancel member");
    assert!(cancel.is_overlay());
    assert_eq!(cancel.description_key(), Some("order.cancel.admin"));

    // Step 10: restock never named a result element, so the owning entity
    // was filled in during the build
    println!("10. Verifying restock's collection result defaulted to Product");
    let restock = model.product.operation("restock").expect("restock operation");
    assert!(restock.result.is_collection());
    assert_eq!(
        restock.result.element_type().and_then(|t| t.entity_name()),
        Some("Product")
    );
    assert_eq!(restock.result.relation_kind, RelationKind::Concrete);
    assert_eq!(restock.result.related.as_deref(), Some("Product"));
    assert_eq!(restock.parameters.len(), 1);
    assert_eq!(restock.parameters[0].name, "amount");

    // Step 11: describe kept its explicit signature
    println!("11. Verifying describe's signature");
    let describe = model
        .customer
        .operation("describe")
        .expect("describe operation");
    assert_eq!(describe.parameters.len(), 1);
    assert_eq!(describe.parameters[0].name, "verbose");
    assert_eq!(describe.parameters[0].index, Some(0));
    assert_eq!(
        describe.result.value_type,
        Some(TypeRef::Scalar(ScalarType::Text))
    );

    // Step 12: relation classification
    println!("12. Verifying relation classification");
    let orders = model.customer.property("orders").expect("orders property");
    assert_eq!(orders.relation_kind, RelationKind::Concrete);
    assert_eq!(orders.related.as_deref(), Some("Order"));
    let skus = model.order.property("productSkus").expect("productSkus property");
    assert_eq!(skus.relation_kind, RelationKind::Reference);
    assert_eq!(skus.related.as_deref(), Some("Product"));

    // Step 13: capability adaptation over the same descriptors
    println!("13. Adapting descriptors to capabilities");
    let facet = model
        .customer
        .adapt(Capability::KeyedEntity)
        .expect("keyed entity facet");
    assert_eq!(facet.as_keyed_entity().expect("keyed facet").key_name(), "id");
    let facet = orders.adapt(Capability::Relation).expect("relation facet");
    assert_eq!(facet.as_relation().expect("relation facet").related, Some("Order"));
    let facet = summary
        .adapt(Capability::QualifierView)
        .expect("qualifier view facet");
    let view = facet.as_qualifier_view().expect("qualifier view facet");
    assert_eq!(view.current().map(|q| q.as_str()), Some("summary"));

    // Step 14: record values against the Order descriptor
    println!("14. Writing and reading record values");
    let mut record = serde_json::Map::new();
    set_value(&model.order, &mut record, "id", json!(7)).expect("Failed to set id");
    set_value(
        &model.order,
        &mut record,
        "placedAt",
        json!("2026-08-25T10:30:00Z"),
    )
    .expect("Failed to set placedAt");
    set_value(
        &model.order,
        &mut record,
        "customer",
        json!({"id": 1, "name": "Ada"}),
    )
    .expect("Failed to set customer");
    set_value(
        &model.order,
        &mut record,
        "productSkus",
        json!(["SKU-1", "SKU-2"]),
    )
    .expect("Failed to set productSkus");

    // a concrete relation rejects a bare key, a set rejects duplicates
    assert!(set_value(&model.order, &mut record, "customer", json!("customer-1")).is_err());
    assert!(
        set_value(&model.order, &mut record, "productSkus", json!(["SKU-1", "SKU-1"])).is_err()
    );
    assert_eq!(
        value_of(&model.order, &record, "id").expect("Failed to read id"),
        Some(&json!(7))
    );

    // Step 15: a second session produces identical fingerprints
    println!("15. Rebuilding in a second session and comparing fingerprints");
    let mut second =
        BuildSession::with_config(EngineConfig::default()).expect("Failed to create session");
    let rebuilt = seed_storefront(&mut second).expect("Failed to reseed model");
    assert_eq!(model.customer.fingerprint, rebuilt.customer.fingerprint);
    assert_eq!(model.product.fingerprint, rebuilt.product.fingerprint);
    assert_eq!(model.order.fingerprint, rebuilt.order.fingerprint);
    assert_ne!(model.customer.session, rebuilt.customer.session);
    println!("✅ Fingerprints are stable across sessions");

    // Step 16: descriptors serialize with their partitions
    println!("16. Serializing Order to JSON");
    let rendered = serde_json::to_value(model.order.as_ref()).expect("Failed to serialize");
    assert_eq!(rendered["name"], "Order");
    assert_eq!(rendered["partitions"].as_array().map(|p| p.len()), Some(2));
    assert_eq!(rendered["fingerprint"].as_str().map(str::len), Some(64));

    println!("✅ Storefront workflow completed successfully!");
    println!("🎉 All 16 steps passed");
}

#[test]
fn test_seed_keeps_the_bus_healthy() {
    let mut session = BuildSession::new().expect("Failed to create session");
    seed_storefront(&mut session).expect("Failed to seed model");

    let stats = session.bus_stats();
    println!("published {} events during the seed", stats.published);
    assert!(stats.published > 0);
    assert_eq!(stats.listener_failures, 0);
    assert_eq!(stats.suppressed_cycles, 0);
}
