//! # Driving Ports (API - Inbound)
//!
//! The operation surface of the name service. The node binary's command
//! router and the integration tests drive the registry exclusively through
//! [`NameServiceApi`].

use serde::{Deserialize, Serialize};

use crate::domain::entities::{RecordState, TokenProperties};
use crate::domain::errors::RegistryError;
use crate::domain::records::{RecordType, SoaFields};
use crate::domain::value_objects::{Account, ONE_YEAR_SECS};
use crate::ports::outbound::Authorizer;

/// Arguments of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Root (`com`) or second-level (`example.com`) name.
    pub name: String,
    pub owner: Account,
    pub soa: SoaFields,
    /// Lease length in seconds, `1..=10` years.
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
}

impl RegisterRequest {
    /// One-year registration.
    pub fn new(name: impl Into<String>, owner: Account, soa: SoaFields) -> Self {
        Self {
            name: name.into(),
            owner,
            soa,
            period_secs: ONE_YEAR_SECS,
        }
    }

    /// Override the lease length.
    #[must_use]
    pub fn with_period_secs(mut self, period_secs: u64) -> Self {
        self.period_secs = period_secs;
        self
    }
}

fn default_period_secs() -> u64 {
    ONE_YEAR_SECS
}

/// Public API of the name service.
///
/// Mutating operations take the call's [`Authorizer`] explicitly. Every
/// operation is all-or-nothing: an `Err` leaves storage untouched.
pub trait NameServiceApi {
    // -------------------------------------------------------------------------
    // Token surface
    // -------------------------------------------------------------------------

    fn symbol(&self) -> &str;

    /// Names are indivisible.
    fn decimals(&self) -> u8;

    fn total_supply(&self) -> Result<u64, RegistryError>;

    /// Owner of a live token.
    ///
    /// ## Errors
    ///
    /// - `UnknownToken`: never registered
    /// - `Expired` / `ParentExpired`: token or an ancestor has lapsed
    fn owner_of(&self, token_id: &str) -> Result<Account, RegistryError>;

    fn properties_of(&self, token_id: &str) -> Result<TokenProperties, RegistryError>;

    fn balance_of(&self, owner: &Account) -> Result<u64, RegistryError>;

    /// Every token ever registered, in key order.
    fn tokens(&self) -> Result<Vec<String>, RegistryError>;

    fn tokens_of(&self, owner: &Account) -> Result<Vec<String>, RegistryError>;

    /// Move a token to `to`. A no-op when `to` already owns it.
    ///
    /// ## Errors
    ///
    /// - `NotAuthorized`: current owner did not witness the call
    /// - `TransferRejected`: contract recipient refused the token
    fn transfer(
        &mut self,
        auth: &dyn Authorizer,
        to: Account,
        token_id: &str,
        data: Option<&[u8]>,
    ) -> Result<(), RegistryError>;

    /// Root domains open for registration.
    fn roots(&self) -> Result<Vec<String>, RegistryError>;

    // -------------------------------------------------------------------------
    // Pricing
    // -------------------------------------------------------------------------

    /// Replace the price table. Governance quorum only.
    fn set_price_table(&mut self, auth: &dyn Authorizer, prices: Vec<i64>)
        -> Result<(), RegistryError>;

    /// Price for a leaf of `length` characters; `-1` is governance-only.
    fn get_price(&self, length: usize) -> Result<i64, RegistryError>;

    // -------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------

    /// True if `name` could be registered right now.
    ///
    /// ## Errors
    ///
    /// - `InvalidFormat`: ungrammatical name
    /// - `UnknownParent`: second-level name under a root that is not open
    fn is_available(&self, name: &str) -> Result<bool, RegistryError>;

    /// Register or reclaim a name.
    ///
    /// Returns `Ok(false)` if the name is still held by a live registration.
    fn register(
        &mut self,
        auth: &dyn Authorizer,
        request: RegisterRequest,
    ) -> Result<bool, RegistryError>;

    /// Extend a registration by `years`; returns the new expiration.
    ///
    /// ## Errors
    ///
    /// - `OutOfRange`: `years` outside `1..=10`, or the result would pass
    ///   `now + 10 years`
    fn renew(&mut self, auth: &dyn Authorizer, name: &str, years: u64)
        -> Result<u64, RegistryError>;

    /// Set or clear the admin of a token.
    fn set_admin(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        admin: Option<Account>,
    ) -> Result<(), RegistryError>;

    // -------------------------------------------------------------------------
    // Records
    // -------------------------------------------------------------------------

    /// Rewrite the token's SOA record.
    fn update_soa(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        soa: SoaFields,
    ) -> Result<(), RegistryError>;

    /// Create or overwrite the record at `id`.
    fn set_record(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        record_type: RecordType,
        id: u8,
        data: &str,
    ) -> Result<(), RegistryError>;

    /// Append a record; returns the assigned id.
    fn add_record(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        record_type: RecordType,
        data: &str,
    ) -> Result<u8, RegistryError>;

    /// Payloads of every `record_type` record of `name`, ordered by id.
    fn get_records(&self, name: &str, record_type: RecordType)
        -> Result<Vec<String>, RegistryError>;

    fn get_record(
        &self,
        name: &str,
        record_type: RecordType,
        id: u8,
    ) -> Result<Option<String>, RegistryError>;

    /// Every record of `name`, ordered by type then id.
    fn get_all_records(&self, name: &str) -> Result<Vec<RecordState>, RegistryError>;

    fn delete_record(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        record_type: RecordType,
        id: u8,
    ) -> Result<(), RegistryError>;

    /// Delete every `record_type` record of `name`. SOA cannot be deleted.
    fn delete_records(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        record_type: RecordType,
    ) -> Result<(), RegistryError>;

    // -------------------------------------------------------------------------
    // Resolver
    // -------------------------------------------------------------------------

    /// Resolve `name`, following CNAME records within the configured budget.
    fn resolve(&self, name: &str, record_type: RecordType) -> Result<Vec<String>, RegistryError>;
}
