//! Store tables and the rules every backend shares

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{PermitError, Result};
use crate::schemas::{Employee, EvidencePhoto, Permit, Phase, RoleFilter};

/// Everything a store holds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub employees: Vec<Employee>,

    #[serde(default)]
    pub permits: Vec<Permit>,

    /// Evidence photos in upload order
    #[serde(default)]
    pub photos: Vec<EvidencePhoto>,

    /// Session identifier to employee id
    #[serde(default)]
    pub sessions: BTreeMap<String, Uuid>,
}

impl StoreData {
    // ===== EMPLOYEES =====

    pub fn find_employee(&self, id: Uuid) -> Result<Employee> {
        self.employees
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| PermitError::NotFound(format!("Employee {} not found", id)))
    }

    /// Insert or replace by id.
    pub fn save_employee(&mut self, employee: &Employee) {
        match self.employees.iter_mut().find(|e| e.id == employee.id) {
            Some(existing) => *existing = employee.clone(),
            None => self.employees.push(employee.clone()),
        }
    }

    // ===== PERMITS =====

    pub fn find_permit(&self, number: &str) -> Result<Permit> {
        self.permits
            .iter()
            .find(|p| p.number == number)
            .cloned()
            .ok_or_else(|| PermitError::NotFound(format!("Permit {} not found", number)))
    }

    /// Insert or replace by id. Permit numbers stay unique.
    pub fn save_permit(&mut self, permit: &Permit) -> Result<()> {
        if self
            .permits
            .iter()
            .any(|p| p.number == permit.number && p.id != permit.id)
        {
            return Err(PermitError::InvalidInput(format!(
                "Permit number {} is already taken",
                permit.number
            )));
        }
        match self.permits.iter_mut().find(|p| p.id == permit.id) {
            Some(existing) => *existing = permit.clone(),
            None => self.permits.push(permit.clone()),
        }
        Ok(())
    }

    pub fn permits_for(&self, employee_id: Uuid, filter: RoleFilter) -> Vec<Permit> {
        let mut permits: Vec<Permit> = self
            .permits
            .iter()
            .filter(|p| p.matches(employee_id, filter))
            .cloned()
            .collect();
        permits.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.number.cmp(&b.number)));
        permits
    }

    /// Read-modify-write one permit. `update` returning `None` leaves it untouched.
    pub fn modify_permit(
        &mut self,
        number: &str,
        update: &mut dyn FnMut(&Permit) -> Option<Permit>,
    ) -> Result<Permit> {
        let slot = self
            .permits
            .iter_mut()
            .find(|p| p.number == number)
            .ok_or_else(|| PermitError::NotFound(format!("Permit {} not found", number)))?;

        if let Some(next) = update(slot) {
            if next.id != slot.id || next.number != slot.number {
                return Err(PermitError::InvalidInput(format!(
                    "Permit {} cannot change identity during an update",
                    number
                )));
            }
            *slot = next;
        }
        Ok(slot.clone())
    }

    // ===== PHOTOS =====

    /// Record a photo. File handles are unique across the store.
    pub fn record_photo(
        &mut self,
        permit_id: Uuid,
        phase: Phase,
        uploader: Uuid,
        file_handle: &str,
    ) -> Result<EvidencePhoto> {
        if !self.permits.iter().any(|p| p.id == permit_id) {
            return Err(PermitError::NotFound(format!("Permit {} not found", permit_id)));
        }
        if self.photos.iter().any(|p| p.file_handle == file_handle) {
            return Err(PermitError::DuplicateUpload(file_handle.to_string()));
        }
        let photo = EvidencePhoto::new(permit_id, phase, uploader, file_handle);
        self.photos.push(photo.clone());
        Ok(photo)
    }

    pub fn photos_for(&self, permit_id: Uuid, phase: Phase) -> Vec<EvidencePhoto> {
        self.photos
            .iter()
            .filter(|p| p.permit_id == permit_id && p.phase == phase)
            .cloned()
            .collect()
    }

    // ===== SESSIONS =====

    pub fn employee_for_session(&self, session: &str) -> Option<Uuid> {
        self.sessions.get(session).copied()
    }

    pub fn session_for_employee(&self, employee_id: Uuid) -> Option<String> {
        self.sessions
            .iter()
            .find(|(_, id)| **id == employee_id)
            .map(|(session, _)| session.clone())
    }

    /// Bind a session to an employee.
    ///
    /// A session and an employee are bound one to one until logout. Binding an
    /// employee who holds another session, or a session that belongs to another
    /// employee, fails with `AuthConflict`.
    pub fn bind_session(&mut self, session: &str, employee_id: Uuid) -> Result<()> {
        if let Some(owner) = self.sessions.get(session) {
            if *owner != employee_id {
                return Err(PermitError::AuthConflict);
            }
        }
        match self.session_for_employee(employee_id) {
            Some(existing) if existing != session => return Err(PermitError::AuthConflict),
            Some(_) => return Ok(()),
            None => {}
        }
        self.sessions.insert(session.to_string(), employee_id);
        Ok(())
    }

    pub fn unbind_session(&mut self, session: &str) -> Option<Uuid> {
        self.sessions.remove(session)
    }
}
