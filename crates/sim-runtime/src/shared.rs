//! Single-writer handle for serving one run to several callers.

use crate::{DayCycleEngine, DayPreview};
use rust_decimal::Decimal;
use sim_core::{DayRecord, RunSnapshot, SimError};
use std::sync::{Arc, RwLock, RwLockReadGuard};

/// Cloneable handle around one engine.
///
/// Submissions take the write lock, so at most one caller advances the run at
/// a time. Snapshots and previews share the read lock. If a holder of the
/// write lock panics, every later call fails with [`SimError::RunPoisoned`]
/// instead of exposing a half-applied day.
#[derive(Clone, Debug)]
pub struct SharedRun {
    inner: Arc<RwLock<DayCycleEngine>>,
}

impl SharedRun {
    pub fn new(engine: DayCycleEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn submit_day(&self, price: Decimal, quantity: u64) -> Result<DayRecord, SimError> {
        let mut engine = self.inner.write().map_err(|_| SimError::RunPoisoned)?;
        engine.submit_day(price, quantity)
    }

    pub fn get_run_snapshot(&self) -> Result<RunSnapshot, SimError> {
        Ok(self.read()?.get_run_snapshot())
    }

    pub fn preview(&self, price: Decimal) -> Result<DayPreview, SimError> {
        self.read()?.preview(price)
    }

    pub fn is_finished(&self) -> Result<bool, SimError> {
        Ok(self.read()?.is_finished())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, DayCycleEngine>, SimError> {
        self.inner.read().map_err(|_| SimError::RunPoisoned)
    }
}
