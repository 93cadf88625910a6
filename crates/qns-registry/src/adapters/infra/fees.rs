use crate::domain::errors::RegistryError;
use crate::ports::outbound::FeeMeter;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct Balance {
    /// `None` means unlimited.
    spendable: Option<u64>,
    burned: u64,
}

/// Fee meter with an optional spendable budget.
///
/// Clones share the same balance so tests can inspect what a service burned.
#[derive(Debug, Default, Clone)]
pub struct MeteredFeeMeter {
    balance: Arc<Mutex<Balance>>,
}

impl MeteredFeeMeter {
    /// Never runs out.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Can burn at most `spendable` in total.
    pub fn with_budget(spendable: u64) -> Self {
        Self {
            balance: Arc::new(Mutex::new(Balance {
                spendable: Some(spendable),
                burned: 0,
            })),
        }
    }

    /// Total burned so far.
    pub fn burned(&self) -> u64 {
        self.balance.lock().burned
    }

    /// Remaining budget, `None` if unlimited.
    pub fn remaining(&self) -> Option<u64> {
        self.balance.lock().spendable
    }
}

impl FeeMeter for MeteredFeeMeter {
    fn charge(&mut self, amount: u64) -> Result<(), RegistryError> {
        let mut balance = self.balance.lock();
        if let Some(spendable) = balance.spendable {
            if amount > spendable {
                return Err(RegistryError::InsufficientFunds {
                    required: amount,
                    available: spendable,
                });
            }
            balance.spendable = Some(spendable - amount);
        }
        balance.burned = balance.burned.saturating_add(amount);
        debug!(amount, burned = balance.burned, "[qns] Fee burned");
        Ok(())
    }

    fn refund(&mut self, amount: u64) {
        let mut balance = self.balance.lock();
        if let Some(spendable) = balance.spendable {
            balance.spendable = Some(spendable.saturating_add(amount));
        }
        balance.burned = balance.burned.saturating_sub(amount);
        debug!(amount, burned = balance.burned, "[qns] Fee refunded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_is_enforced() {
        let mut meter = MeteredFeeMeter::with_budget(100);
        let observer = meter.clone();
        meter.charge(60).unwrap();
        assert!(matches!(
            meter.charge(60),
            Err(RegistryError::InsufficientFunds {
                required: 60,
                available: 40
            })
        ));
        assert_eq!(observer.burned(), 60);
        assert_eq!(observer.remaining(), Some(40));
    }

    #[test]
    fn test_refund_restores_budget() {
        let mut meter = MeteredFeeMeter::with_budget(100);
        meter.charge(70).unwrap();
        meter.refund(70);
        assert_eq!(meter.burned(), 0);
        assert_eq!(meter.remaining(), Some(100));
        meter.charge(100).unwrap();
    }

    #[test]
    fn test_unlimited_meter_counts_burns() {
        let mut meter = MeteredFeeMeter::unlimited();
        meter.charge(u64::MAX).unwrap();
        meter.charge(1).unwrap();
        assert_eq!(meter.burned(), u64::MAX);
    }
}
