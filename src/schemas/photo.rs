//! Evidence photo schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Phase;

/// An uploaded image documenting one phase of a permit. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePhoto {
    pub id: Uuid,

    /// Owning permit
    pub permit_id: Uuid,

    pub phase: Phase,

    /// Employee who uploaded the photo
    pub uploaded_by: Uuid,

    /// Opaque transport file handle, unique across all photos
    pub file_handle: String,

    pub created_at: DateTime<Utc>,
}

impl EvidencePhoto {
    pub fn new(permit_id: Uuid, phase: Phase, uploaded_by: Uuid, file_handle: impl Into<String>) -> Self {
        EvidencePhoto {
            id: Uuid::new_v4(),
            permit_id,
            phase,
            uploaded_by,
            file_handle: file_handle.into(),
            created_at: Utc::now(),
        }
    }
}
