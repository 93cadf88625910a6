//! # Name Service
//!
//! The service implementing [`NameServiceApi`].
//!
//! ## Architecture
//!
//! Every operation:
//! 1. Reads the clock once, so a call sees a single "now"
//! 2. Stages its changes in a [`Ledger`] over the key-value store
//! 3. On success, commits fees, then the batch, then the buffered events
//!
//! An error at any step drops the ledger, so no partial state is stored.

mod gateway;
mod ledger;
mod records;
mod registry;
mod resolver;

use tracing::{debug, info, instrument, warn};

use crate::config::RegistryConfig;
use crate::domain::entities::{RecordState, TokenProperties};
use crate::domain::errors::RegistryError;
use crate::domain::records::{RecordType, SoaFields, SoaRecord};
use crate::domain::value_objects::{Account, KeyPrefix};
use crate::ports::inbound::{NameServiceApi, RegisterRequest};
use crate::ports::outbound::{
    Authorizer, BatchOperation, Clock, FeeMeter, KeyValueStore, NotificationSink, TransferHook,
};
use ledger::{Ledger, WriteSet};

/// Token decimals: names are indivisible.
pub const DECIMALS: u8 = 0;

/// The name service, generic over its collaborators.
pub struct NameService<KV, FM, CK, NS, TH>
where
    KV: KeyValueStore,
    FM: FeeMeter,
    CK: Clock,
    NS: NotificationSink,
    TH: TransferHook,
{
    /// Key-value store for all registry state.
    pub(crate) kv_store: KV,
    /// Burns registration and renewal fees.
    pub(crate) fee_meter: FM,
    /// Source of "now" for expiry and SOA serials.
    pub(crate) clock: CK,
    /// Receives committed events.
    pub(crate) sink: NS,
    /// Callback into contract recipients of a transfer.
    pub(crate) hook: TH,
    pub(crate) config: RegistryConfig,
}

/// Dependencies for NameService
pub struct NameServiceDependencies<KV, FM, CK, NS, TH> {
    pub kv_store: KV,
    pub fee_meter: FM,
    pub clock: CK,
    pub sink: NS,
    pub hook: TH,
}

impl<KV, FM, CK, NS, TH> NameService<KV, FM, CK, NS, TH>
where
    KV: KeyValueStore,
    FM: FeeMeter,
    CK: Clock,
    NS: NotificationSink,
    TH: TransferHook,
{
    /// Create the service, seeding the price table on an empty store.
    pub fn new(
        deps: NameServiceDependencies<KV, FM, CK, NS, TH>,
        config: RegistryConfig,
    ) -> Result<Self, RegistryError> {
        config.validate()?;
        let mut service = Self {
            kv_store: deps.kv_store,
            fee_meter: deps.fee_meter,
            clock: deps.clock,
            sink: deps.sink,
            hook: deps.hook,
            config,
        };

        let price_key = KeyPrefix::price_key();
        if !service.kv_store.exists(&price_key)? {
            let table = service.config.price_table()?;
            let bytes = bincode::serialize(&table)?;
            service
                .kv_store
                .atomic_batch_write(vec![BatchOperation::put(price_key, bytes)])?;
            info!(prices = ?table.as_slice(), "[qns] Price table initialised");
        }

        Ok(service)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Read-only access to the underlying store.
    pub fn store(&self) -> &KV {
        &self.kv_store
    }

    /// Resolve with an explicit redirect budget.
    #[instrument(skip(self))]
    pub fn resolve_with_budget(
        &self,
        name: &str,
        record_type: RecordType,
        budget: i32,
    ) -> Result<Vec<String>, RegistryError> {
        self.read(|ledger, now| ledger.resolve(name, record_type, budget, now))
    }

    /// Parsed SOA record of a live token.
    pub fn get_soa(&self, name: &str) -> Result<SoaRecord, RegistryError> {
        let data = self
            .read(|ledger, now| ledger.get_record(name, RecordType::SOA, 0, now))?
            .ok_or_else(|| RegistryError::Corrupted {
                reason: format!("SOA record missing for {name}"),
            })?;
        SoaRecord::parse(&data)
    }

    // =========================================================================
    // CALL PLUMBING
    // =========================================================================

    fn read<T>(
        &self,
        f: impl FnOnce(&Ledger<'_, KV>, u64) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let now = self.clock.now_ms();
        f(&Ledger::new(&self.kv_store), now)
    }

    /// Run `f` against a fresh ledger without committing.
    fn stage<T>(
        &self,
        f: impl FnOnce(&mut Ledger<'_, KV>, u64, &TH) -> Result<T, RegistryError>,
    ) -> Result<(T, WriteSet), RegistryError> {
        let now = self.clock.now_ms();
        let mut ledger = Ledger::new(&self.kv_store);
        let output = f(&mut ledger, now, &self.hook)?;
        Ok((output, ledger.finish()))
    }

    fn execute<T>(
        &mut self,
        f: impl FnOnce(&mut Ledger<'_, KV>, u64, &TH) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let (output, write_set) = self.stage(f)?;
        self.commit(write_set)?;
        Ok(output)
    }

    /// Burn the fee, apply the batch, then publish events.
    ///
    /// A batch the store rejects refunds the fee.
    fn commit(&mut self, write_set: WriteSet) -> Result<(), RegistryError> {
        if write_set.is_empty() {
            return Ok(());
        }
        let WriteSet {
            operations,
            events,
            fee,
        } = write_set;
        if fee > 0 {
            self.fee_meter.charge(fee)?;
        }
        let count = operations.len();
        if let Err(err) = self.kv_store.atomic_batch_write(operations) {
            if fee > 0 {
                self.fee_meter.refund(fee);
            }
            warn!(error = %err, fee, "[qns] Batch rejected by store");
            return Err(err.into());
        }
        for event in events {
            self.sink.emit(event);
        }
        debug!(operations = count, fee, "[qns] Write set committed");
        Ok(())
    }
}

impl<KV, FM, CK, NS, TH> NameServiceApi for NameService<KV, FM, CK, NS, TH>
where
    KV: KeyValueStore,
    FM: FeeMeter,
    CK: Clock,
    NS: NotificationSink,
    TH: TransferHook,
{
    fn symbol(&self) -> &str {
        &self.config.symbol
    }

    fn decimals(&self) -> u8 {
        DECIMALS
    }

    fn total_supply(&self) -> Result<u64, RegistryError> {
        self.read(|ledger, _| ledger.total_supply())
    }

    fn owner_of(&self, token_id: &str) -> Result<Account, RegistryError> {
        self.read(|ledger, now| ledger.live_state(token_id, now))
            .map(|state| state.owner)
    }

    fn properties_of(&self, token_id: &str) -> Result<TokenProperties, RegistryError> {
        self.read(|ledger, now| ledger.live_state(token_id, now))
            .map(|state| state.properties())
    }

    fn balance_of(&self, owner: &Account) -> Result<u64, RegistryError> {
        self.read(|ledger, _| ledger.balance_of(owner))
    }

    fn tokens(&self) -> Result<Vec<String>, RegistryError> {
        self.read(|ledger, _| ledger.tokens())
    }

    fn tokens_of(&self, owner: &Account) -> Result<Vec<String>, RegistryError> {
        self.read(|ledger, _| ledger.tokens_of(owner))
    }

    #[instrument(skip(self, auth, data))]
    fn transfer(
        &mut self,
        auth: &dyn Authorizer,
        to: Account,
        token_id: &str,
        data: Option<&[u8]>,
    ) -> Result<(), RegistryError> {
        self.execute(|ledger, now, hook| ledger.transfer(auth, hook, to, token_id, data, now))
    }

    fn roots(&self) -> Result<Vec<String>, RegistryError> {
        self.read(|ledger, _| ledger.roots())
    }

    #[instrument(skip(self, auth))]
    fn set_price_table(
        &mut self,
        auth: &dyn Authorizer,
        prices: Vec<i64>,
    ) -> Result<(), RegistryError> {
        let max_price = self.config.max_price;
        self.execute(|ledger, _, _| ledger.set_price_table(auth, prices, max_price))
    }

    fn get_price(&self, length: usize) -> Result<i64, RegistryError> {
        self.read(|ledger, _| ledger.get_price(length))
    }

    fn is_available(&self, name: &str) -> Result<bool, RegistryError> {
        self.read(|ledger, now| ledger.is_available(name, now))
    }

    #[instrument(skip(self, auth, request), fields(name = %request.name, owner = %request.owner))]
    fn register(
        &mut self,
        auth: &dyn Authorizer,
        request: RegisterRequest,
    ) -> Result<bool, RegistryError> {
        let (registered, write_set) =
            self.stage(|ledger, now, _| ledger.register(auth, &request, now))?;
        if registered {
            self.commit(write_set)?;
        }
        Ok(registered)
    }

    #[instrument(skip(self, auth))]
    fn renew(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        years: u64,
    ) -> Result<u64, RegistryError> {
        let max_years = self.config.max_renewal_years;
        self.execute(|ledger, now, _| ledger.renew(auth, name, years, now, max_years))
    }

    #[instrument(skip(self, auth))]
    fn set_admin(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        admin: Option<Account>,
    ) -> Result<(), RegistryError> {
        self.execute(|ledger, now, _| ledger.set_admin(auth, name, admin, now))
    }

    #[instrument(skip(self, auth, soa))]
    fn update_soa(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        soa: SoaFields,
    ) -> Result<(), RegistryError> {
        self.execute(|ledger, now, _| ledger.update_soa(auth, name, &soa, now))
    }

    #[instrument(skip(self, auth))]
    fn set_record(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        record_type: RecordType,
        id: u8,
        data: &str,
    ) -> Result<(), RegistryError> {
        self.execute(|ledger, now, _| ledger.set_record(auth, name, record_type, id, data, now))
    }

    #[instrument(skip(self, auth))]
    fn add_record(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        record_type: RecordType,
        data: &str,
    ) -> Result<u8, RegistryError> {
        self.execute(|ledger, now, _| ledger.add_record(auth, name, record_type, data, now))
    }

    fn get_records(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>, RegistryError> {
        self.read(|ledger, now| ledger.get_records(name, record_type, now))
    }

    fn get_record(
        &self,
        name: &str,
        record_type: RecordType,
        id: u8,
    ) -> Result<Option<String>, RegistryError> {
        self.read(|ledger, now| ledger.get_record(name, record_type, id, now))
    }

    fn get_all_records(&self, name: &str) -> Result<Vec<RecordState>, RegistryError> {
        self.read(|ledger, now| ledger.get_all_records(name, now))
    }

    #[instrument(skip(self, auth))]
    fn delete_record(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        record_type: RecordType,
        id: u8,
    ) -> Result<(), RegistryError> {
        self.execute(|ledger, now, _| ledger.delete_record(auth, name, record_type, id, now))
    }

    #[instrument(skip(self, auth))]
    fn delete_records(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        record_type: RecordType,
    ) -> Result<(), RegistryError> {
        self.execute(|ledger, now, _| ledger.delete_records(auth, name, record_type, now))
    }

    fn resolve(&self, name: &str, record_type: RecordType) -> Result<Vec<String>, RegistryError> {
        self.resolve_with_budget(name, record_type, self.config.max_redirects)
    }
}
