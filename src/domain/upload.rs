//! Evidence upload session
//!
//! An explicit value object for one multi-photo upload cycle. It is opened by
//! the executor, counts accepted photos against the batch cap, and is either
//! finished (submitting the permit) or cancelled. Cancelling discards the
//! count only; photos already recorded stay in the store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{PermitError, Result};
use crate::schemas::Phase;

use super::states::PermitAction;

/// One upload cycle for a permit phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSession {
    pub permit_id: Uuid,
    pub permit_number: String,
    pub phase: Phase,
    /// Employee who opened the session
    pub uploader: Uuid,
    /// Photos accepted so far in this cycle
    pub photos_collected: usize,
    /// Batch cap for this cycle
    pub limit: usize,
}

impl UploadSession {
    pub fn new(permit_id: Uuid, permit_number: impl Into<String>, phase: Phase, uploader: Uuid, limit: usize) -> Self {
        UploadSession {
            permit_id,
            permit_number: permit_number.into(),
            phase,
            uploader,
            photos_collected: 0,
            limit,
        }
    }

    /// The action finishing this session requests
    pub fn submit_action(&self) -> PermitAction {
        PermitAction::submit(self.phase)
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.photos_collected)
    }

    pub fn is_full(&self) -> bool {
        self.photos_collected >= self.limit
    }

    /// Fail with `LimitExceeded` once the cap is reached.
    pub fn ensure_capacity(&self) -> Result<()> {
        if self.is_full() {
            return Err(PermitError::LimitExceeded { limit: self.limit });
        }
        Ok(())
    }

    /// Count one accepted photo.
    pub fn record_accepted(&mut self) -> Result<usize> {
        self.ensure_capacity()?;
        self.photos_collected += 1;
        Ok(self.photos_collected)
    }

    /// Fail unless at least `minimum` photos were collected.
    pub fn ensure_ready(&self, minimum: usize) -> Result<()> {
        if self.photos_collected < minimum {
            return Err(PermitError::InvalidInput(format!(
                "at least {} photo(s) required before submitting, {} collected",
                minimum, self.photos_collected
            )));
        }
        Ok(())
    }
}
