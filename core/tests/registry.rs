use payout_core::{
    error::PayoutError,
    registry::{CreatorRecord, CreatorRegistry, Lookup, RegistryBuilder, SharedRegistry},
    types::Platform,
};

fn sample_registry() -> CreatorRegistry {
    CreatorRegistry::from_records([
        CreatorRecord::new("kevin-rhee", "Kevin Rhee")
            .with_handle(Platform::Tiktok, "@KevMath")
            .with_handle(Platform::Instagram, "kev.math"),
        CreatorRecord::new("john-sellers", "John Sellers")
            .with_handle(Platform::Tiktok, "integratingjohn")
            .with_handle(Platform::Youtube, "JNS426"),
        CreatorRecord::new("sasha-b", "Sasha")
            .with_handle(Platform::Tiktok, "sasha"),
    ])
    .expect("registry builds")
}

#[test]
fn handle_lookup_is_normalized() {
    let registry = sample_registry();
    assert_eq!(
        registry.lookup_by_handle(Platform::Tiktok, "  @KEVMATH "),
        Lookup::Found("kevin-rhee".into())
    );
    assert_eq!(
        registry.lookup_by_handle(Platform::Youtube, "jns426"),
        Lookup::Found("john-sellers".into())
    );
}

#[test]
fn handle_lookup_is_per_platform() {
    let registry = sample_registry();
    // kevmath is only registered on TikTok.
    assert_eq!(registry.lookup_by_handle(Platform::Instagram, "kevmath"), Lookup::NotFound);
    assert_eq!(registry.lookup_by_handle(Platform::Tiktok, ""), Lookup::NotFound);
}

#[test]
fn url_lookup_ignores_query_and_subdomain() {
    let registry = sample_registry();
    assert_eq!(
        registry.lookup_by_url("https://www.tiktok.com/@integratingjohn?_r=1&_t=ZT-91"),
        Lookup::Found("john-sellers".into())
    );
    assert_eq!(
        registry.lookup_by_url("https://m.youtube.com/@JNS426/shorts"),
        Lookup::Found("john-sellers".into())
    );
    assert_eq!(
        registry.lookup_by_url("https://www.instagram.com/kev.math/"),
        Lookup::Found("kevin-rhee".into())
    );
}

#[test]
fn url_without_embedded_handle_is_not_found() {
    let registry = sample_registry();
    assert_eq!(registry.lookup_by_url("https://www.instagram.com/reel/C9xYzAbC"), Lookup::NotFound);
    assert_eq!(registry.lookup_by_url("https://youtu.be/abc123"), Lookup::NotFound);
    assert_eq!(registry.lookup_by_url(""), Lookup::NotFound);
}

#[test]
fn display_name_lookup_is_exact_but_case_insensitive() {
    let registry = sample_registry();
    assert_eq!(
        registry.lookup_by_display_name("  kevin   RHEE "),
        Lookup::Found("kevin-rhee".into())
    );
    assert_eq!(registry.lookup_by_display_name("Kevin"), Lookup::NotFound);
    assert_eq!(registry.lookup_by_display_name(""), Lookup::NotFound);
}

#[test]
fn shared_display_name_is_ambiguous() {
    let registry = CreatorRegistry::from_records([
        CreatorRecord::new("alex-1", "Alex").with_handle(Platform::Tiktok, "alex.one"),
        CreatorRecord::new("alex-2", "alex").with_handle(Platform::Tiktok, "alex.two"),
    ])
    .expect("registry builds");

    assert_eq!(
        registry.lookup_by_display_name("ALEX"),
        Lookup::Ambiguous(vec!["alex-1".into(), "alex-2".into()])
    );
}

#[test]
fn duplicate_handle_across_creators_is_rejected() {
    let result = CreatorRegistry::from_records([
        CreatorRecord::new("sasha-a", "Sasha A").with_handle(Platform::Tiktok, "sasha"),
        CreatorRecord::new("sasha-b", "Sasha B").with_handle(Platform::Tiktok, "@Sasha"),
    ]);

    match result {
        Err(PayoutError::DuplicateHandle { platform, handle, existing, incoming }) => {
            assert_eq!(platform, Platform::Tiktok);
            assert_eq!(handle, "sasha");
            assert_eq!(existing, "sasha-a");
            assert_eq!(incoming, "sasha-b");
        }
        other => panic!("expected DuplicateHandle, got {other:?}"),
    }
}

#[test]
fn same_handle_on_different_platforms_is_allowed() {
    let registry = CreatorRegistry::from_records([
        CreatorRecord::new("a", "A").with_handle(Platform::Tiktok, "mathguy"),
        CreatorRecord::new("b", "B").with_handle(Platform::Instagram, "mathguy"),
    ])
    .expect("different platforms do not collide");

    assert_eq!(registry.lookup_by_handle(Platform::Tiktok, "mathguy"), Lookup::Found("a".into()));
    assert_eq!(registry.lookup_by_handle(Platform::Instagram, "mathguy"), Lookup::Found("b".into()));
}

#[test]
fn creator_may_repeat_own_handle() {
    let record = CreatorRecord::new("kev", "Kev")
        .with_handle(Platform::Tiktok, "kev")
        .with_handle(Platform::Tiktok, "@KEV");
    assert_eq!(record.handles(Platform::Tiktok).count(), 1);
    CreatorRegistry::from_records([record]).expect("own duplicates are a set");
}

#[test]
fn failed_register_leaves_builder_unchanged() {
    let mut builder = RegistryBuilder::new();
    builder
        .register(CreatorRecord::new("a", "A").with_handle(Platform::Tiktok, "taken"))
        .expect("first register");

    let clash = CreatorRecord::new("b", "B")
        .with_handle(Platform::Instagram, "fresh")
        .with_handle(Platform::Tiktok, "taken");
    assert!(builder.register(clash).is_err());
    assert_eq!(builder.len(), 1);

    // "fresh" was not claimed by the failed attempt.
    builder
        .register(CreatorRecord::new("c", "C").with_handle(Platform::Instagram, "fresh"))
        .expect("fresh handle still free");
    let registry = builder.freeze();
    assert_eq!(registry.lookup_by_handle(Platform::Instagram, "fresh"), Lookup::Found("c".into()));
}

#[test]
fn duplicate_creator_id_is_rejected() {
    let result = CreatorRegistry::from_records([
        CreatorRecord::new("same", "One"),
        CreatorRecord::new("same", "Two"),
    ]);
    assert!(matches!(result, Err(PayoutError::DuplicateCreator { creator_id }) if creator_id == "same"));
}

#[test]
fn snapshots_survive_replace() {
    let shared = SharedRegistry::new(sample_registry());
    let before = shared.snapshot();

    shared.replace(
        CreatorRegistry::from_records([CreatorRecord::new("new", "New")
            .with_handle(Platform::Tiktok, "kevmath")])
        .expect("replacement builds"),
    );

    assert_eq!(
        before.lookup_by_handle(Platform::Tiktok, "kevmath"),
        Lookup::Found("kevin-rhee".into())
    );
    assert_eq!(
        shared.snapshot().lookup_by_handle(Platform::Tiktok, "kevmath"),
        Lookup::Found("new".into())
    );
}
