//! Shared fixtures for the registry integration tests.

#![allow(dead_code)]

use qns_registry::prelude::*;

pub const START: u64 = 1_700_000_000_000;
pub const ONE_DAY_MS: u64 = 24 * 60 * 60 * 1000;

pub const OWNER: Account = Account::new([0x0a; 20]);
pub const OTHER: Account = Account::new([0x0b; 20]);

pub type TestService<KV> =
    NameService<KV, MeteredFeeMeter, ManualClock, RecordingSink, NoopTransferHook>;

pub struct Fixture<KV: KeyValueStore> {
    pub service: TestService<KV>,
    pub clock: ManualClock,
    pub sink: RecordingSink,
    pub fees: MeteredFeeMeter,
}

pub fn soa() -> SoaFields {
    SoaFields {
        email: "admin.example.com".to_string(),
        refresh: 7200,
        retry: 900,
        expire: 1_209_600,
        ttl: 300,
    }
}

pub fn signed(accounts: &[Account]) -> StaticAuthorizer {
    StaticAuthorizer::signed_by(accounts.iter().copied())
}

pub fn fixture_on<KV: KeyValueStore>(kv_store: KV, clock: ManualClock) -> Fixture<KV> {
    let sink = RecordingSink::new();
    let fees = MeteredFeeMeter::unlimited();
    let deps = NameServiceDependencies {
        kv_store,
        fee_meter: fees.clone(),
        clock: clock.clone(),
        sink: sink.clone(),
        hook: NoopTransferHook,
    };
    let service = NameService::new(deps, RegistryConfig::default()).unwrap();
    Fixture {
        service,
        clock,
        sink,
        fees,
    }
}

pub fn fixture() -> Fixture<InMemoryKVStore> {
    fixture_on(InMemoryKVStore::new(), ManualClock::new(START))
}

impl<KV: KeyValueStore> Fixture<KV> {
    /// Open `root` under governance, owned by `OWNER` for ten years.
    pub fn open_root(&mut self, root: &str) {
        let committee = StaticAuthorizer::committee().with_witness(OWNER);
        let request = RegisterRequest::new(root, OWNER, soa()).with_period_secs(10 * ONE_YEAR_SECS);
        assert!(self.service.register(&committee, request).unwrap());
    }

    pub fn register(&mut self, name: &str, owner: Account) -> bool {
        let request = RegisterRequest::new(name, owner, soa());
        self.service
            .register(&signed(&[OWNER, owner]), request)
            .unwrap()
    }
}
