//! # Registry Lifecycle Tests
//!
//! End-to-end behaviour of registration, expiry, renewal, reclaim and the
//! record store, driven through `NameServiceApi`.

mod common;

use common::*;
use qns_registry::prelude::*;

// =============================================================================
// AVAILABILITY AND EXPIRY
// =============================================================================

#[test]
fn test_example_end_to_end() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));

    let id = f
        .service
        .add_record(&signed(&[OWNER]), "example.com", RecordType::A, "93.184.216.34")
        .unwrap();
    assert_eq!(id, 0);
    assert_eq!(
        f.service.resolve("example.com", RecordType::A).unwrap(),
        vec!["93.184.216.34".to_string()]
    );

    f.clock.advance(366 * ONE_DAY_MS);
    assert!(f.service.is_available("example.com").unwrap());
}

#[test]
fn test_priced_root_available_again_after_expiry() {
    let mut f = fixture();
    let committee = StaticAuthorizer::committee().with_witness(OWNER);
    assert!(f.service.is_available("network").unwrap());
    assert!(f
        .service
        .register(&committee, RegisterRequest::new("network", OWNER, soa()))
        .unwrap());
    assert!(!f.service.is_available("network").unwrap());

    f.clock.advance(ONE_YEAR_MS - 1);
    assert!(!f.service.is_available("network").unwrap());
    f.clock.advance(1);
    assert!(f.service.is_available("network").unwrap());

    // The root marker outlives the registration.
    assert!(matches!(
        f.service
            .register(&committee, RegisterRequest::new("network", OTHER, soa())),
        Err(RegistryError::AlreadyExists { .. })
    ));
    assert!(matches!(
        f.service.renew(&committee, "network", 1),
        Err(RegistryError::Expired { .. })
    ));
}

#[test]
fn test_governance_priced_root_never_returns_to_sale() {
    let mut f = fixture();
    let committee = StaticAuthorizer::committee().with_witness(OWNER);
    assert!(f.service.is_available("org").unwrap());
    assert!(f
        .service
        .register(&committee, RegisterRequest::new("org", OWNER, soa()))
        .unwrap());
    assert!(!f.service.is_available("org").unwrap());

    f.clock.advance(ONE_YEAR_MS);
    // An open root is governance-priced, so it never returns to public sale.
    assert!(!f.service.is_available("org").unwrap());
    assert!(matches!(
        f.service.owner_of("org"),
        Err(RegistryError::Expired { .. })
    ));
    assert_eq!(f.service.roots().unwrap(), vec!["org".to_string()]);
}

#[test]
fn test_second_level_name_returns_to_sale() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));
    assert!(!f.service.is_available("example.com").unwrap());

    f.clock.advance(ONE_YEAR_MS - 1);
    assert!(!f.service.is_available("example.com").unwrap());
    f.clock.advance(1);
    assert!(f.service.is_available("example.com").unwrap());
}

#[test]
fn test_registration_fee_is_burned() {
    let mut f = fixture();
    f.open_root("com");
    assert_eq!(f.fees.burned(), 0);
    assert!(f.register("example.com", OWNER));
    assert_eq!(f.fees.burned(), 1_000_000_000);
}

// =============================================================================
// RENEWAL
// =============================================================================

#[test]
fn test_renewal_is_monotonic_and_capped() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));
    let anyone = StaticAuthorizer::none();

    let mut last = f.service.properties_of("example.com").unwrap().expiration;
    loop {
        match f.service.renew(&anyone, "example.com", 1) {
            Ok(expiration) => {
                assert!(expiration > last);
                assert!(expiration <= f.clock.now_ms() + 10 * ONE_YEAR_MS);
                last = expiration;
            }
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::OutOfRange);
                break;
            }
        }
    }
    assert_eq!(last, START + 10 * ONE_YEAR_MS);
    assert_eq!(
        f.service.properties_of("example.com").unwrap().expiration,
        last
    );

    // Time passing reopens headroom.
    f.clock.advance(ONE_YEAR_MS);
    assert_eq!(
        f.service.renew(&anyone, "example.com", 1).unwrap(),
        last + ONE_YEAR_MS
    );
}

// =============================================================================
// RECORDS
// =============================================================================

#[test]
fn test_set_record_round_trip() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));
    let auth = signed(&[OWNER]);

    f.service
        .set_record(&auth, "example.com", RecordType::TXT, 3, "v=spf1 -all")
        .unwrap();
    f.service
        .set_record(&auth, "example.com", RecordType::TXT, 3, "v=spf1 mx -all")
        .unwrap();
    assert_eq!(
        f.service.get_records("example.com", RecordType::TXT).unwrap(),
        vec!["v=spf1 mx -all".to_string()]
    );
    assert_eq!(
        f.service
            .get_record("example.com", RecordType::TXT, 3)
            .unwrap()
            .as_deref(),
        Some("v=spf1 mx -all")
    );
    assert_eq!(
        f.service.get_record("example.com", RecordType::TXT, 4).unwrap(),
        None
    );
}

#[test]
fn test_add_record_duplicates_and_ids() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));
    let auth = signed(&[OWNER]);

    let add = |f: &mut Fixture<InMemoryKVStore>, data: &str| {
        f.service
            .add_record(&auth, "example.com", RecordType::A, data)
    };
    assert_eq!(add(&mut f, "93.184.216.34").unwrap(), 0);
    assert_eq!(add(&mut f, "93.184.216.35").unwrap(), 1);
    assert_eq!(add(&mut f, "93.184.216.36").unwrap(), 2);

    let err = add(&mut f, "93.184.216.34").unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateRecord { .. }));
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    // The lowest freed id is reused.
    f.service
        .delete_record(&auth, "example.com", RecordType::A, 1)
        .unwrap();
    assert_eq!(add(&mut f, "93.184.216.37").unwrap(), 1);
    assert!(matches!(
        f.service.delete_record(&auth, "example.com", RecordType::A, 9),
        Err(RegistryError::UnknownRecord { .. })
    ));
}

#[test]
fn test_record_id_ceiling() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));
    let auth = signed(&[OWNER]);

    for i in 0..=255u32 {
        let id = f
            .service
            .add_record(&auth, "example.com", RecordType::TXT, &format!("entry-{i}"))
            .unwrap();
        assert_eq!(u32::from(id), i);
    }
    let err = f
        .service
        .add_record(&auth, "example.com", RecordType::TXT, "one-too-many")
        .unwrap_err();
    assert!(matches!(err, RegistryError::TooManyRecords { .. }));
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
}

#[test]
fn test_single_cname_per_name() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));
    let auth = signed(&[OWNER]);

    f.service
        .add_record(&auth, "www.example.com", RecordType::CNAME, "example.com")
        .unwrap();
    assert!(matches!(
        f.service
            .add_record(&auth, "www.example.com", RecordType::CNAME, "cdn.example.com"),
        Err(RegistryError::MultipleCname { .. })
    ));
    assert!(matches!(
        f.service
            .set_record(&auth, "www.example.com", RecordType::CNAME, 1, "cdn.example.com"),
        Err(RegistryError::MultipleCname { .. })
    ));
    f.service
        .set_record(&auth, "www.example.com", RecordType::CNAME, 0, "cdn.example.com")
        .unwrap();
    assert_eq!(
        f.service
            .get_records("www.example.com", RecordType::CNAME)
            .unwrap(),
        vec!["cdn.example.com".to_string()]
    );
}

#[test]
fn test_payload_validation() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));
    let auth = signed(&[OWNER]);

    for (record_type, data) in [
        (RecordType::A, "10.0.0.1"),
        (RecordType::A, "93.184.216.255"),
        (RecordType::AAAA, "2001:db8::1"),
        (RecordType::CNAME, "-bad.example.com"),
        (RecordType::SOA, "example.com a 1 2 3 4 5"),
    ] {
        let err = f
            .service
            .add_record(&auth, "example.com", record_type, data)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat, "{record_type} {data}");
    }
    let long_txt = "x".repeat(256);
    assert!(f
        .service
        .add_record(&auth, "example.com", RecordType::TXT, &long_txt)
        .is_err());
    f.service
        .add_record(&auth, "example.com", RecordType::AAAA, "2606:2800:220:1::248")
        .unwrap();
}

#[test]
fn test_record_mutation_needs_owner_or_admin() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));

    let err = f
        .service
        .add_record(&signed(&[OTHER]), "example.com", RecordType::TXT, "hijack")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthorized);
    assert!(f
        .service
        .get_records("example.com", RecordType::TXT)
        .unwrap()
        .is_empty());
}

#[test]
fn test_soa_serial_tracks_mutations() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));
    let auth = signed(&[OWNER]);
    assert_eq!(f.service.get_soa("example.com").unwrap().serial, START);

    f.clock.advance(1_000);
    f.service
        .add_record(&auth, "mail.example.com", RecordType::A, "93.184.216.40")
        .unwrap();
    assert_eq!(f.service.get_soa("example.com").unwrap().serial, START + 1_000);

    f.clock.advance(1_000);
    f.service
        .delete_records(&auth, "mail.example.com", RecordType::A)
        .unwrap();
    let soa_record = f.service.get_soa("example.com").unwrap();
    assert_eq!(soa_record.serial, START + 2_000);
    assert_eq!(soa_record.ttl, 300);
}

#[test]
fn test_update_soa_rewrites_fields() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));
    let auth = signed(&[OWNER]);
    f.clock.advance(5_000);

    let mut fields = soa();
    fields.email = "dns.example.com".to_string();
    fields.ttl = 60;
    f.service.update_soa(&auth, "example.com", fields.clone()).unwrap();

    let soa_record = f.service.get_soa("example.com").unwrap();
    assert_eq!(soa_record, SoaRecord::new("example.com", &fields, START + 5_000));

    fields.email = "has space".to_string();
    assert!(matches!(
        f.service.update_soa(&auth, "example.com", fields),
        Err(RegistryError::InvalidRecord { .. })
    ));
    assert!(matches!(
        f.service.update_soa(&auth, "www.example.com", soa()),
        Err(RegistryError::InvalidFormat { .. })
    ));
}

#[test]
fn test_soa_cannot_be_deleted() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));
    let auth = signed(&[OWNER]);

    let err = f
        .service
        .delete_records(&auth, "example.com", RecordType::SOA)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    assert!(f
        .service
        .delete_record(&auth, "example.com", RecordType::SOA, 0)
        .is_err());
    assert_eq!(
        f.service
            .get_records("example.com", RecordType::SOA)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_deep_records_belong_to_token_and_are_purged() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));
    let auth = signed(&[OWNER]);

    f.service
        .add_record(&auth, "www.example.com", RecordType::A, "93.184.216.34")
        .unwrap();
    let records = f.service.get_all_records("www.example.com").unwrap();
    assert_eq!(
        records,
        vec![RecordState::new(
            "www.example.com",
            RecordType::A,
            0,
            "93.184.216.34"
        )]
    );
    // Deep names are never tokens of their own.
    assert!(matches!(
        f.service.owner_of("www.example.com"),
        Err(RegistryError::UnknownToken { .. })
    ));

    f.clock.advance(ONE_YEAR_MS);
    assert!(f.register("example.com", OTHER));
    assert!(f.service.get_all_records("www.example.com").unwrap().is_empty());
    assert_eq!(
        f.service.get_all_records("example.com").unwrap().len(),
        1,
        "only the fresh SOA record remains"
    );
}

#[test]
fn test_records_of_expired_token_are_hidden() {
    let mut f = fixture();
    f.open_root("com");
    assert!(f.register("example.com", OWNER));
    f.clock.advance(ONE_YEAR_MS);
    assert!(matches!(
        f.service.get_all_records("example.com"),
        Err(RegistryError::Expired { .. })
    ));
    assert!(matches!(
        f.service.resolve("www.example.com", RecordType::A),
        Err(RegistryError::Expired { .. })
    ));
}

// =============================================================================
// PERSISTENCE
// =============================================================================

#[test]
fn test_file_backed_registry_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.bin");
    let clock = ManualClock::new(START);

    {
        let store = FileBackedKVStore::open(&path).unwrap();
        let mut f = fixture_on(store, clock.clone());
        f.open_root("com");
        assert!(f.register("example.com", OWNER));
        f.service
            .add_record(&signed(&[OWNER]), "example.com", RecordType::A, "93.184.216.34")
            .unwrap();
    }

    let store = FileBackedKVStore::open(&path).unwrap();
    let f = fixture_on(store, clock);
    assert_eq!(f.service.owner_of("example.com").unwrap(), OWNER);
    assert_eq!(f.service.total_supply().unwrap(), 2);
    assert_eq!(
        f.service.resolve("example.com", RecordType::A).unwrap(),
        vec!["93.184.216.34".to_string()]
    );
}
