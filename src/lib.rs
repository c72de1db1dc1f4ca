pub mod builder;
pub mod catalog;
pub mod config;
pub mod model;
pub mod seed;

// Export builder surface
pub use builder::{
    BuildError, BuildSession, BuilderId, BusStats, EntityBuilder, Event, EventError, EventKind,
    MemberBuilder, OperationBuilder, Reaction,
};

// Export catalog and configuration types
pub use catalog::ModelCatalog;
pub use config::EngineConfig;

// Export all model types
pub use model::*;

// Export seed module
pub use seed::*;

#[cfg(test)]
mod tests {

    #[test]
    fn test_member_build_is_idempotent() {
        use crate::builder::BuildSession;
        use crate::model::ScalarType;
        use std::sync::Arc;

        let mut session = BuildSession::new().unwrap();
        let id = session.property("amount").typed(ScalarType::Integer).id();
        let first = session.member_builder(id).unwrap().build();
        let second = session.member_builder(id).unwrap().build();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_entity_build_is_idempotent_and_publishes_once() {
        use crate::builder::BuildSession;
        use crate::model::ScalarType;
        use std::sync::Arc;

        let mut session = BuildSession::new().unwrap();
        let id = session
            .entity("Account")
            .property("id", |p| p.typed(ScalarType::Integer).key())
            .id();
        let first = session.entity_builder(id).unwrap().build().unwrap();
        let stats_after_first = session.bus_stats();

        let second = session.entity_builder(id).unwrap().build().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.fingerprint, second.fingerprint);
        // the memoized path re-publishes nothing
        assert_eq!(session.bus_stats(), stats_after_first);
    }

    #[test]
    fn test_order_buckets_flatten_in_key_order() {
        use crate::builder::BuildSession;
        use crate::model::{MemberInfo, ScalarType};

        // orders {3: [a, b], 1: [c]} must flatten to [c, a, b]
        let mut session = BuildSession::new().unwrap();
        let entity = session
            .entity("Widget")
            .property("a", |p| p.typed(ScalarType::Text).order(3))
            .property("b", |p| p.typed(ScalarType::Text).order(3))
            .property("c", |p| p.typed(ScalarType::Text).order(1))
            .build()
            .unwrap();
        let names: Vec<&str> = entity.layout.properties.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_unset_order_sorts_first_and_ties_keep_registration() {
        use crate::builder::BuildSession;
        use crate::model::{MemberInfo, ScalarType};

        // setter call order differs between p and r; only registration
        // order may break the tie
        let mut session = BuildSession::new().unwrap();
        let entity = session
            .entity("Widget")
            .property("p", |p| p.order(2).typed(ScalarType::Text))
            .property("q", |p| p.typed(ScalarType::Text))
            .property("r", |p| p.typed(ScalarType::Text).order(2))
            .build()
            .unwrap();
        let names: Vec<&str> = entity.layout.properties.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["q", "p", "r"]);
    }

    #[test]
    fn test_visibility_filter_keeps_inline_relations() {
        use crate::builder::BuildSession;
        use crate::model::{MemberInfo, ScalarType, TypeRef};

        let mut session = BuildSession::new().unwrap();
        let entity = session
            .entity("Node")
            .property("shown", |p| p.typed(ScalarType::Text))
            .property("hiddenPlain", |p| p.typed(ScalarType::Text).hidden())
            .property("hiddenInline", |p| {
                p.typed(ScalarType::Text).hidden().inline(true)
            })
            .property("link", |p| {
                p.typed(TypeRef::entity("Node")).hidden().inline(true)
            })
            .property("ghostLink", |p| p.typed(TypeRef::entity("Node")).hidden())
            .build()
            .unwrap();
        let names: Vec<&str> = entity.layout.properties.iter().map(|m| m.name()).collect();
        // in the list iff visible, or an inline relation
        assert_eq!(names, vec!["shown", "link"]);
    }

    #[test]
    fn test_reference_falls_back_to_base_per_field() {
        use crate::builder::BuildSession;
        use crate::model::{
            BaseMember, MemberDetail, MemberInfo, MemberReference, Qualifier, ScalarType,
        };

        let mut session = BuildSession::new().unwrap();
        let base = session
            .property("total")
            .typed(ScalarType::Decimal)
            .order(5)
            .render_hint("currency")
            .build();
        let detail = MemberDetail::default()
            .with_order(1)
            .with_description_key("total.short");
        let reference =
            MemberReference::new(Qualifier::new("summary"), BaseMember::Leaf(base), detail);

        assert_eq!(reference.order(), Some(1));
        assert_eq!(reference.description_key(), Some("total.short"));
        // unset detail fields fall through to the base
        assert_eq!(reference.render_hint(), Some("currency"));
        assert!(reference.is_visible());
    }

    #[test]
    fn test_capability_adaptation_round_trip() {
        use crate::builder::BuildSession;
        use crate::model::{Adaptable, Capability, RelationKind, ScalarType, TypeRef};

        let mut session = BuildSession::new().unwrap();
        let plain = session.property("title").typed(ScalarType::Text).build();
        let link = session
            .property("owner")
            .typed(TypeRef::entity("Customer"))
            .build();

        for capability in [
            Capability::Relation,
            Capability::KeyedEntity,
            Capability::QualifierView,
            Capability::Presentation,
        ] {
            assert_eq!(plain.adaptable(capability), plain.adapt(capability).is_some());
            assert_eq!(link.adaptable(capability), link.adapt(capability).is_some());
        }

        assert!(plain.adapt(Capability::Relation).is_none());
        let facet = link.adapt(Capability::Relation).unwrap();
        let relation = facet.as_relation().unwrap();
        assert_eq!(relation.kind, RelationKind::Concrete);
        assert_eq!(relation.related, Some("Customer"));

        let keyed_entity = session
            .entity("Keyed")
            .property("id", |p| p.typed(ScalarType::Integer).key())
            .build()
            .unwrap();
        let facet = keyed_entity.adapt(Capability::KeyedEntity).unwrap();
        assert_eq!(facet.as_keyed_entity().unwrap().key_name(), "id");
        let facet = keyed_entity.adapt(Capability::QualifierView).unwrap();
        assert!(facet.as_qualifier_view().unwrap().current().is_none());

        let keyless = session
            .entity("Keyless")
            .property("x", |p| p.typed(ScalarType::Text))
            .build()
            .unwrap();
        assert!(!keyless.adaptable(Capability::KeyedEntity));
        assert!(keyless.adapt(Capability::KeyedEntity).is_none());
    }

    #[test]
    fn test_member_overlays_adapt_to_qualifier_view() {
        use crate::builder::BuildSession;
        use crate::model::{Adaptable, Capability, Qualifier, ScalarType};

        let mut session = BuildSession::new().unwrap();
        let entity = session
            .entity("Doc")
            .property("title", |p| {
                p.typed(ScalarType::Text).detail("summary", |d| d.hidden())
            })
            .property("body", |p| p.typed(ScalarType::Text))
            .build()
            .unwrap();

        // an overlay view reports the qualifier it was selected under
        let summary = entity.reference("summary");
        let title = summary.member("title").unwrap();
        assert!(title.is_overlay());
        assert!(title.adaptable(Capability::QualifierView));
        let facet = title.adapt(Capability::QualifierView).unwrap();
        let marker = facet.as_qualifier_view().unwrap();
        assert_eq!(marker.current().map(|q| q.as_str()), Some("summary"));
        // member facets carry the selection marker only
        assert!(marker.qualifiers().is_empty());
        assert!(marker.view("summary").is_none());

        // a base fallback answers with no qualifier selected
        let body = summary.member("body").unwrap();
        assert!(!body.is_overlay());
        let facet = body.adapt(Capability::QualifierView).unwrap();
        assert!(facet.as_qualifier_view().unwrap().current().is_none());

        // the overlay descriptor itself answers the same way
        let partition = entity.partition(&Qualifier::new("summary")).unwrap();
        let overlay = partition.overlay("title").unwrap();
        let facet = overlay.adapt(Capability::QualifierView).unwrap();
        let marker = facet.as_qualifier_view().unwrap();
        assert_eq!(marker.current().map(|q| q.as_str()), Some("summary"));

        // entity facets still navigate between views
        let facet = entity.adapt(Capability::QualifierView).unwrap();
        let hub = facet.as_qualifier_view().unwrap();
        assert_eq!(hub.qualifiers(), vec![Qualifier::new("summary")]);
        assert!(hub.view("summary").unwrap().is_recognized());

        // plain descriptors are not qualifier-selected
        let plain = session
            .property("standalone")
            .typed(ScalarType::Text)
            .build();
        assert!(!plain.adaptable(Capability::QualifierView));
    }

    #[test]
    fn test_before_listeners_run_first_in_registration_order() {
        use crate::builder::{BuildSession, EventKind, Reaction};
        use crate::model::ScalarType;
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut session = BuildSession::new().unwrap();
        let id = session.property("p").id();

        let trace: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
        // three registrations per phase, interleaved
        for (before, label) in [
            (false, "n1"),
            (true, "b1"),
            (false, "n2"),
            (true, "b2"),
            (false, "n3"),
            (true, "b3"),
        ] {
            let t = Rc::clone(&trace);
            let reaction: Reaction = Rc::new(move |_session, _event| {
                t.borrow_mut().push(label);
                Ok(())
            });
            if before {
                session.subscribe_before(id, EventKind::TypeChanged, reaction);
            } else {
                session.subscribe(id, EventKind::TypeChanged, reaction);
            }
        }

        session.member_builder(id).unwrap().typed(ScalarType::Text);
        assert_eq!(*trace.borrow(), vec!["b1", "b2", "b3", "n1", "n2", "n3"]);
    }

    #[test]
    fn test_re_entrant_dispatch_is_suppressed() {
        use crate::builder::{BuildSession, Event, EventKind};
        use crate::model::ScalarType;
        use std::rc::Rc;

        let mut session = BuildSession::new().unwrap();
        let a = session.property("a").id();
        let b = session.property("b").id();
        session.subscribe(
            a,
            EventKind::TypeChanged,
            Rc::new(move |session, _event| {
                session.publish(Event::TypeChanged { builder: b }, b);
                Ok(())
            }),
        );
        session.subscribe(
            b,
            EventKind::TypeChanged,
            Rc::new(move |session, _event| {
                session.publish(Event::TypeChanged { builder: a }, a);
                Ok(())
            }),
        );

        // terminates: the hop back into (a, TypeChanged) is dropped
        session.member_builder(a).unwrap().typed(ScalarType::Text);
        assert_eq!(session.bus_stats().suppressed_cycles, 1);
    }

    #[test]
    fn test_listener_failure_does_not_stop_dispatch() {
        use crate::builder::{BuildSession, EventError, EventKind};
        use crate::model::ScalarType;
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut session = BuildSession::new().unwrap();
        let id = session.property("p").id();
        let trace: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        session.subscribe(
            id,
            EventKind::TypeChanged,
            Rc::new(|_session, _event| Err(EventError::new("deliberate"))),
        );
        let t = Rc::clone(&trace);
        session.subscribe(
            id,
            EventKind::TypeChanged,
            Rc::new(move |_session, _event| {
                t.borrow_mut().push("ran");
                Ok(())
            }),
        );

        session.member_builder(id).unwrap().typed(ScalarType::Text);
        assert_eq!(*trace.borrow(), vec!["ran"]);
        assert_eq!(session.bus_stats().listener_failures, 1);
    }

    #[test]
    fn test_events_report_their_emitting_builder() {
        use crate::builder::{BuildSession, Event};

        let mut session = BuildSession::new().unwrap();
        let member = session.property("p").id();
        let operation = session.operation("op").id();

        assert_eq!(Event::TypeChanged { builder: member }.builder(), member);
        assert_eq!(Event::PreBuild { builder: member }.builder(), member);
        assert_eq!(Event::OperationBuilt { operation }.builder(), operation);
    }

    #[test]
    fn test_relation_detection_follows_the_type() {
        use crate::builder::BuildSession;
        use crate::model::{RelationKind, ScalarType, TypeRef};

        let mut session = BuildSession::new().unwrap();

        let owner = session
            .property("owner")
            .typed(TypeRef::entity("Customer"))
            .build();
        assert_eq!(owner.relation_kind, RelationKind::Concrete);
        assert_eq!(owner.related.as_deref(), Some("Customer"));

        // retyping to a scalar clears auto-detected relation info
        let retyped = session
            .property("size")
            .typed(TypeRef::entity("Box"))
            .typed(ScalarType::Integer)
            .build();
        assert_eq!(retyped.relation_kind, RelationKind::None);
        assert!(retyped.related.is_none());

        // an explicit call pins relation info against detection
        let pinned = session
            .property("raw")
            .unrelated()
            .typed(TypeRef::entity("Blob"))
            .build();
        assert_eq!(pinned.relation_kind, RelationKind::None);

        let by_key = session
            .property("customerId")
            .typed(ScalarType::Text)
            .related_by_reference("Customer")
            .build();
        assert_eq!(by_key.relation_kind, RelationKind::Reference);
        assert_eq!(by_key.related.as_deref(), Some("Customer"));
    }

    #[test]
    fn test_element_before_container_is_replayed() {
        use crate::builder::{BuildSession, EventKind};
        use crate::model::{ContainerKind, RelationKind, TypeRef};
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut session = BuildSession::new().unwrap();
        let id = session.property("items").id();
        let seen: Rc<RefCell<u32>> = Rc::new(RefCell::new(0));
        let s = Rc::clone(&seen);
        session.subscribe(
            id,
            EventKind::ElementTypeChanged,
            Rc::new(move |_session, _event| {
                *s.borrow_mut() += 1;
                Ok(())
            }),
        );

        // element lands while the member is still plain
        session
            .member_builder(id)
            .unwrap()
            .element(TypeRef::entity("Line"));
        session
            .member_builder(id)
            .unwrap()
            .container(ContainerKind::List);

        // once directly, once replayed after the container arrived
        assert_eq!(*seen.borrow(), 2);

        let built = session.member_builder(id).unwrap().build();
        assert!(built.is_collection());
        assert_eq!(built.relation_kind, RelationKind::Concrete);
        assert_eq!(built.related.as_deref(), Some("Line"));
        assert_eq!(
            built.element_type().and_then(|t| t.entity_name()),
            Some("Line")
        );
    }

    #[test]
    fn test_operation_name_validated_against_configured_pattern() {
        use crate::builder::{BuildError, BuildSession};
        use crate::config::EngineConfig;
        use crate::model::ScalarType;

        let mut config = EngineConfig::default();
        config.naming.operation_pattern = "^[a-z][a-zA-Z]*$".to_string();
        let mut session = BuildSession::with_config(config).unwrap();

        let ok = session
            .operation("doThing")
            .result(|r| r.typed(ScalarType::Text))
            .build();
        assert!(ok.is_ok());

        let err = session.operation("123bad").build().unwrap_err();
        match err {
            BuildError::OperationName { name, pattern } => {
                assert_eq!(name, "123bad");
                assert_eq!(pattern, "^[a-z][a-zA-Z]*$");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // a failing operation unwinds the entity build too
        let broken = session.entity("Broken").operation("bad1", |op| op).build();
        assert!(broken.is_err());

        // the default pattern allows digits after the first character
        let mut relaxed = BuildSession::new().unwrap();
        assert!(relaxed.operation("restock2").build().is_ok());
    }

    #[test]
    fn test_parameters_sort_by_explicit_index_then_registration() {
        use crate::builder::BuildSession;
        use crate::model::ScalarType;

        let mut session = BuildSession::new().unwrap();
        let op = session
            .operation("calc")
            .parameter("first", |p| p.typed(ScalarType::Integer))
            .parameter("third", |p| p.typed(ScalarType::Integer).index(1))
            .parameter("second", |p| p.typed(ScalarType::Integer).index(0))
            .result(|r| r.typed(ScalarType::Decimal))
            .build()
            .unwrap();
        let names: Vec<&str> = op.parameters.iter().map(|p| p.name.as_str()).collect();
        // unindexed parameters keep registration order ahead of indexed ones
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_collection_result_defaults_to_owning_entity() {
        use crate::builder::BuildSession;
        use crate::model::RelationKind;

        let mut session = BuildSession::new().unwrap();
        let entity = session
            .entity("Product")
            .operation("restock", |op| op.collection_result(|r| r))
            .build()
            .unwrap();
        let op = entity.operation("restock").unwrap();
        assert_eq!(
            op.result.element_type().and_then(|t| t.entity_name()),
            Some("Product")
        );
        assert_eq!(op.result.relation_kind, RelationKind::Concrete);

        // standalone operations have no owner to default to
        let lone = session
            .operation("orphan")
            .collection_result(|r| r)
            .build()
            .unwrap();
        assert!(lone.result.element_type().is_none());
    }

    #[test]
    fn test_operation_extensions_are_consulted_by_key() {
        use crate::builder::BuildSession;
        use crate::model::ScalarType;
        use serde_json::json;

        let mut session = BuildSession::new().unwrap();
        let op = session
            .operation("submit")
            .extension("idempotent", true)
            .extension("timeoutMs", 2500)
            .parameter("payload", |p| p.typed(ScalarType::Json))
            .build()
            .unwrap();
        assert_eq!(op.extension("idempotent"), Some(&json!(true)));
        assert_eq!(op.extension("timeoutMs"), Some(&json!(2500)));
        assert_eq!(op.extension("missing"), None);
    }

    #[test]
    fn test_overlays_exist_only_where_details_were_requested() {
        use crate::builder::BuildSession;
        use crate::model::{MemberInfo, Qualifier, ScalarType};

        let mut session = BuildSession::new().unwrap();
        let entity = session
            .entity("Doc")
            .property("title", |p| p.typed(ScalarType::Text))
            .property("body", |p| p.typed(ScalarType::Text).detail("summary", |d| d))
            .build()
            .unwrap();

        let partition = entity.partition(&Qualifier::new("summary")).unwrap();
        assert!(partition.overlay("title").is_none());

        // an empty detail still materializes an overlay resolving to base values
        let body = partition.overlay("body").unwrap();
        assert!(body.is_visible());
        assert_eq!(body.order(), None);

        let views: Vec<(&str, bool)> = partition
            .layout
            .properties
            .iter()
            .map(|v| (v.name(), v.is_overlay()))
            .collect();
        assert_eq!(views, vec![("title", false), ("body", true)]);
    }

    #[test]
    fn test_unknown_qualifier_view_falls_back_to_base() {
        use crate::builder::BuildSession;
        use crate::model::{MemberInfo, ScalarType};

        let mut session = BuildSession::new().unwrap();
        let entity = session
            .entity("Plain")
            .description_key("plain")
            .property("a", |p| p.typed(ScalarType::Text).detail("known", |d| d.hidden()))
            .property("b", |p| p.typed(ScalarType::Text))
            .build()
            .unwrap();

        let ghost = entity.reference("ghost");
        assert!(!ghost.is_recognized());
        assert_eq!(ghost.description_key(), Some("plain"));
        let base_names: Vec<&str> = entity.layout.members.iter().map(|m| m.name()).collect();
        let ghost_names: Vec<&str> = ghost.ordered_members().iter().map(|m| m.name()).collect();
        assert_eq!(ghost_names, base_names);
        assert!(!ghost.member("a").unwrap().is_overlay());

        let known = entity.reference("known");
        assert!(known.is_recognized());
        assert!(known.member("a").unwrap().is_overlay());
    }

    #[test]
    fn test_qualifier_entity_detail_resolves_against_base() {
        use crate::builder::BuildSession;
        use crate::model::ScalarType;

        let mut session = BuildSession::new().unwrap();
        let entity = session
            .entity("Page")
            .description_key("page")
            .render_hint("document")
            .detail("summary", |d| d.with_render_hint("card"))
            .property("x", |p| p.typed(ScalarType::Text))
            .build()
            .unwrap();

        let summary = entity.reference("summary");
        assert_eq!(summary.render_hint(), Some("card"));
        // the untouched field resolves to the base entity detail
        assert_eq!(summary.description_key(), Some("page"));
    }

    #[test]
    fn test_qualifier_visibility_and_order_overrides_reshape_lists() {
        use crate::builder::BuildSession;
        use crate::model::{MemberInfo, ScalarType};

        let mut session = BuildSession::new().unwrap();
        let entity = session
            .entity("Audit")
            .property("event", |p| p.typed(ScalarType::Text).order(1))
            .property("stamp", |p| {
                p.typed(ScalarType::Timestamp)
                    .order(2)
                    .hidden()
                    .detail("admin", |d| d.with_visible(true))
            })
            .property("actor", |p| {
                p.typed(ScalarType::Text)
                    .order(3)
                    .detail("admin", |d| d.with_order(0))
            })
            .build()
            .unwrap();

        let base: Vec<&str> = entity.layout.properties.iter().map(|m| m.name()).collect();
        assert_eq!(base, vec!["event", "actor"]);

        let admin = entity.reference("admin");
        let names: Vec<&str> = admin
            .ordered_properties()
            .iter()
            .map(|m| m.name())
            .collect();
        assert_eq!(names, vec!["actor", "event", "stamp"]);
    }

    #[test]
    fn test_account_summary_scenario() {
        use crate::builder::BuildSession;
        use crate::model::{MemberInfo, ScalarType};

        let mut session = BuildSession::new().unwrap();
        let entity = session
            .entity("Account")
            .property("id", |p| p.typed(ScalarType::Integer).key().order(1))
            .property("name", |p| {
                p.typed(ScalarType::Text)
                    .order(2)
                    .description_key("account.name")
                    .detail("Summary", |d| d.with_order(0))
            })
            .build()
            .unwrap();

        assert_eq!(entity.key_property.as_deref(), Some("id"));
        let base: Vec<&str> = entity.layout.properties.iter().map(|m| m.name()).collect();
        assert_eq!(base, vec!["id", "name"]);

        let summary = entity.reference("Summary");
        let names: Vec<&str> = summary
            .ordered_properties()
            .iter()
            .map(|m| m.name())
            .collect();
        assert_eq!(names, vec!["name", "id"]);

        // non-overridden fields still resolve through the overlay
        let name_view = summary.member("name").unwrap();
        assert!(name_view.is_overlay());
        assert_eq!(name_view.description_key(), Some("account.name"));
    }

    #[test]
    fn test_fingerprints_are_stable_across_sessions() {
        use crate::builder::BuildSession;
        use crate::model::{EntityDescriptor, ScalarType};
        use std::sync::Arc;

        fn build_invoice(session: &mut BuildSession, extra: bool) -> Arc<EntityDescriptor> {
            let mut entity = session
                .entity("Invoice")
                .property("id", |p| p.typed(ScalarType::Integer).key().order(1))
                .property("total", |p| {
                    p.typed(ScalarType::Decimal)
                        .order(2)
                        .detail("summary", |d| d.with_order(0))
                });
            if extra {
                entity = entity.property("notes", |p| p.typed(ScalarType::Text));
            }
            entity.build().unwrap()
        }

        let mut first_session = BuildSession::new().unwrap();
        let first = build_invoice(&mut first_session, false);
        let mut second_session = BuildSession::new().unwrap();
        let second = build_invoice(&mut second_session, false);

        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.fingerprint.len(), 64);
        assert_ne!(first.session, second.session);

        let mut third_session = BuildSession::new().unwrap();
        let third = build_invoice(&mut third_session, true);
        assert_ne!(first.fingerprint, third.fingerprint);
    }

    #[test]
    fn test_value_assignability_rules() {
        use crate::builder::BuildSession;
        use crate::model::{ContainerKind, ScalarType, TypeRef, ValueError};
        use serde_json::json;

        let mut session = BuildSession::new().unwrap();

        let price = session
            .property("price")
            .typed(ScalarType::Decimal)
            .required()
            .build();
        assert!(price.is_assignable(&json!(9.5)));
        assert!(price.is_assignable(&json!(9)));
        assert!(!price.is_assignable(&json!("9.5")));
        assert!(matches!(
            price.check_assignable(&json!(null)).unwrap_err(),
            ValueError::NullRequired { .. }
        ));

        let note = session.property("note").typed(ScalarType::Text).build();
        assert!(note.is_assignable(&json!(null)));
        assert!(note.is_assignable(&json!("fine")));
        assert!(!note.is_assignable(&json!(42)));

        let count = session.property("count").typed(ScalarType::Integer).build();
        assert!(count.is_assignable(&json!(7)));
        assert!(!count.is_assignable(&json!(7.5)));

        let at = session.property("at").typed(ScalarType::Timestamp).build();
        assert!(at.is_assignable(&json!("2026-08-25T12:00:00Z")));
        assert!(!at.is_assignable(&json!("yesterday")));

        let blob = session.property("blob").typed(ScalarType::Json).build();
        assert!(blob.is_assignable(&json!({"any": ["shape", 1]})));

        let tags = session
            .collection_property("tags")
            .container(ContainerKind::Set)
            .element(ScalarType::Text)
            .build();
        assert!(tags.is_assignable(&json!(["a", "b"])));
        assert!(!tags.is_assignable(&json!("a")));
        assert!(!tags.is_assignable(&json!([1, 2])));
        assert!(matches!(
            tags.check_assignable(&json!(["a", "a"])).unwrap_err(),
            ValueError::DuplicateElement { .. }
        ));

        // concrete relations embed records, by-key relations carry keys
        let concrete = session
            .property("customer")
            .typed(TypeRef::entity("Customer"))
            .build();
        assert!(concrete.is_assignable(&json!({"id": 1})));
        assert!(!concrete.is_assignable(&json!("customer-1")));

        let by_key = session
            .property("customerRef")
            .typed(TypeRef::entity("Customer"))
            .related_by_reference("Customer")
            .build();
        assert!(by_key.is_assignable(&json!("customer-1")));
        assert!(!by_key.is_assignable(&json!({"id": 1})));
    }

    #[test]
    fn test_record_value_surface() {
        use crate::builder::BuildSession;
        use crate::model::{is_assignable, set_value, value_of, ScalarType, ValueError};
        use serde_json::json;

        let mut session = BuildSession::new().unwrap();
        let entity = session
            .entity("Product")
            .property("title", |p| p.typed(ScalarType::Text))
            .property("subtitle", |p| p.typed(ScalarType::Text))
            .operation("restock", |op| op)
            .build()
            .unwrap();

        let mut record = serde_json::Map::new();
        set_value(&entity, &mut record, "title", json!("Gravel bike")).unwrap();
        assert_eq!(
            value_of(&entity, &record, "title").unwrap(),
            Some(&json!("Gravel bike"))
        );
        // known member, no value in the record
        assert!(value_of(&entity, &record, "subtitle").unwrap().is_none());

        let err = set_value(&entity, &mut record, "title", json!(3)).unwrap_err();
        assert!(matches!(err, ValueError::TypeMismatch { .. }));

        let err = set_value(&entity, &mut record, "nope", json!(1)).unwrap_err();
        assert!(matches!(err, ValueError::UnknownMember { .. }));

        let err = value_of(&entity, &record, "restock").unwrap_err();
        assert!(matches!(err, ValueError::OperationMember { .. }));

        assert!(is_assignable(&entity, "title", &json!("x")));
        assert!(!is_assignable(&entity, "nope", &json!("x")));
    }

    #[test]
    fn test_config_load_from_file() {
        use crate::config::EngineConfig;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadesc.toml");
        std::fs::write(&path, "[naming]\noperation_pattern = \"^[a-z]+$\"\n").unwrap();

        let config = EngineConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.operation_pattern(), "^[a-z]+$");
        assert_eq!(
            EngineConfig::default().operation_pattern(),
            "^[a-z][a-zA-Z0-9]*$"
        );
    }

    #[test]
    fn test_catalog_lookup_and_keyed_filter() {
        use crate::builder::BuildSession;
        use crate::catalog::ModelCatalog;
        use crate::model::ScalarType;

        let mut session = BuildSession::new().unwrap();
        let keyed = session
            .entity("Keyed")
            .property("id", |p| p.typed(ScalarType::Integer).key())
            .build()
            .unwrap();
        let keyless = session
            .entity("Keyless")
            .property("x", |p| p.typed(ScalarType::Text))
            .build()
            .unwrap();

        let catalog = ModelCatalog::new();
        catalog.insert(keyed);
        catalog.insert(keyless);

        assert_eq!(catalog.len(), 2);
        assert!(catalog.entity("Keyed").is_some());
        assert!(catalog.entity("Missing").is_none());
        assert!(catalog.keyed("Keyed").is_some());
        assert!(catalog.keyed("Keyless").is_none());
        assert_eq!(catalog.names(), vec!["Keyed".to_string(), "Keyless".to_string()]);
    }

    #[test]
    fn test_descriptor_json_shape() {
        use crate::builder::BuildSession;
        use crate::model::ScalarType;

        let mut session = BuildSession::new().unwrap();
        let entity = session
            .entity("Doc")
            .property("title", |p| p.typed(ScalarType::Text).detail("summary", |d| d.hidden()))
            .build()
            .unwrap();

        let json = serde_json::to_value(entity.as_ref()).unwrap();
        assert_eq!(json["name"], "Doc");
        let first = &json["properties"][0];
        assert_eq!(first["name"], "title");
        assert_eq!(first["visible"], true);
        // unset optional fields are omitted entirely
        assert!(first.get("order").is_none());
        assert_eq!(json["partitions"].as_array().map(|p| p.len()), Some(1));
        assert_eq!(json["fingerprint"].as_str().map(str::len), Some(64));
    }

    #[test]
    fn test_seed_storefront_builds_and_registers_qualifiers() {
        use crate::builder::BuildSession;
        use crate::model::Qualifier;
        use crate::seed;

        let mut session = BuildSession::new().unwrap();
        let model = seed::seed_storefront(&mut session).unwrap();

        assert_eq!(model.customer.name, "Customer");
        assert!(session
            .qualifiers()
            .contains(&Qualifier::new(seed::QUALIFIER_SUMMARY)));
        assert!(session
            .qualifiers()
            .contains(&Qualifier::new(seed::QUALIFIER_ADMIN)));
        assert!(model.customer.partition(&Qualifier::new("summary")).is_some());
    }
}
