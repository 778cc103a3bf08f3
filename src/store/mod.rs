//! Permit store
//!
//! The [`Store`] trait is the persistence contract the service layer talks to.
//! [`MemoryStore`] keeps everything in process; [`JsonStore`] persists the same
//! tables to a single `state.json`.

mod data;
mod json;
mod memory;

use uuid::Uuid;

use crate::errors::Result;
use crate::schemas::{Employee, EvidencePhoto, Permit, Phase, RoleFilter};

pub use data::StoreData;
pub use json::JsonStore;
pub use memory::MemoryStore;

/// Persistence contract for employees, permits, evidence photos and sessions.
///
/// `modify_permit` must apply its closure and the write as one unit so that two
/// concurrent legal actors cannot both succeed against the same status.
pub trait Store: Send + Sync {
    fn find_employee(&self, id: Uuid) -> Result<Employee>;

    fn save_employee(&self, employee: &Employee) -> Result<()>;

    fn find_permit(&self, number: &str) -> Result<Permit>;

    fn save_permit(&self, permit: &Permit) -> Result<()>;

    /// Permits the employee holds a viewing role on, ordered by scheduled start
    fn permits_for(&self, employee_id: Uuid, filter: RoleFilter) -> Result<Vec<Permit>>;

    /// Atomically read, update and write one permit.
    ///
    /// Returns the stored permit after the update. When `update` returns `None`
    /// nothing is written.
    fn modify_permit(
        &self,
        number: &str,
        update: &mut dyn FnMut(&Permit) -> Option<Permit>,
    ) -> Result<Permit>;

    /// # Errors
    /// * `DuplicateUpload` - If the file handle is already recorded
    fn record_photo(
        &self,
        permit_id: Uuid,
        phase: Phase,
        uploader: Uuid,
        file_handle: &str,
    ) -> Result<EvidencePhoto>;

    /// Photos for one phase in upload order
    fn photos_for(&self, permit_id: Uuid, phase: Phase) -> Result<Vec<EvidencePhoto>>;

    fn employee_for_session(&self, session: &str) -> Result<Option<Uuid>>;

    fn session_for_employee(&self, employee_id: Uuid) -> Result<Option<String>>;

    /// # Errors
    /// * `AuthConflict` - If the employee is bound to a different session, or the
    ///   session to a different employee
    fn bind_session(&self, session: &str, employee_id: Uuid) -> Result<()>;

    /// Returns the employee the session was bound to, if any
    fn unbind_session(&self, session: &str) -> Result<Option<Uuid>>;
}

/// Backends that keep their tables as a [`StoreData`] get the [`Store`]
/// contract for free.
pub trait TableStore: Send + Sync {
    fn read<T>(&self, f: impl FnOnce(&StoreData) -> T) -> Result<T>;

    fn write<T>(&self, f: impl FnOnce(&mut StoreData) -> Result<T>) -> Result<T>;
}

impl<S: TableStore> Store for S {
    fn find_employee(&self, id: Uuid) -> Result<Employee> {
        self.read(|d| d.find_employee(id))?
    }

    fn save_employee(&self, employee: &Employee) -> Result<()> {
        self.write(|d| {
            d.save_employee(employee);
            Ok(())
        })
    }

    fn find_permit(&self, number: &str) -> Result<Permit> {
        self.read(|d| d.find_permit(number))?
    }

    fn save_permit(&self, permit: &Permit) -> Result<()> {
        self.write(|d| d.save_permit(permit))
    }

    fn permits_for(&self, employee_id: Uuid, filter: RoleFilter) -> Result<Vec<Permit>> {
        self.read(|d| d.permits_for(employee_id, filter))
    }

    fn modify_permit(
        &self,
        number: &str,
        update: &mut dyn FnMut(&Permit) -> Option<Permit>,
    ) -> Result<Permit> {
        self.write(|d| d.modify_permit(number, update))
    }

    fn record_photo(
        &self,
        permit_id: Uuid,
        phase: Phase,
        uploader: Uuid,
        file_handle: &str,
    ) -> Result<EvidencePhoto> {
        self.write(|d| d.record_photo(permit_id, phase, uploader, file_handle))
    }

    fn photos_for(&self, permit_id: Uuid, phase: Phase) -> Result<Vec<EvidencePhoto>> {
        self.read(|d| d.photos_for(permit_id, phase))
    }

    fn employee_for_session(&self, session: &str) -> Result<Option<Uuid>> {
        self.read(|d| d.employee_for_session(session))
    }

    fn session_for_employee(&self, employee_id: Uuid) -> Result<Option<String>> {
        self.read(|d| d.session_for_employee(employee_id))
    }

    fn bind_session(&self, session: &str, employee_id: Uuid) -> Result<()> {
        self.write(|d| d.bind_session(session, employee_id))
    }

    fn unbind_session(&self, session: &str) -> Result<Option<Uuid>> {
        self.write(|d| Ok(d.unbind_session(session)))
    }
}
