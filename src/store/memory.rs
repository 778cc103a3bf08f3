//! In-process store

use std::sync::Mutex;

use crate::errors::{PermitError, Result};

use super::{StoreData, TableStore};

/// Store that keeps all tables behind a mutex
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableStore for MemoryStore {
    fn read<T>(&self, f: impl FnOnce(&StoreData) -> T) -> Result<T> {
        let guard = self
            .data
            .lock()
            .map_err(|_| PermitError::Store("store lock poisoned".to_string()))?;
        Ok(f(&guard))
    }

    fn write<T>(&self, f: impl FnOnce(&mut StoreData) -> Result<T>) -> Result<T> {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| PermitError::Store("store lock poisoned".to_string()))?;
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::{Employee, EmployeeRole, Permit, PermitStatus, RoleFilter};
    use crate::store::Store;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    #[test]
    fn test_round_trip_through_trait() {
        let store = MemoryStore::new();
        let employee = Employee::new("Сидоров С.С.", "Мастер", EmployeeRole::Supervisor);
        store.save_employee(&employee).unwrap();

        let start = Utc::now();
        let permit = Permit::new("P-7", "Работы", start, start + Duration::hours(2))
            .with_supervisor(employee.id);
        store.save_permit(&permit).unwrap();

        assert_eq!(store.find_employee(employee.id).unwrap(), employee);
        assert_eq!(store.permits_for(employee.id, RoleFilter::Supervisor).unwrap().len(), 1);
        assert!(store.permits_for(employee.id, RoleFilter::Executor).unwrap().is_empty());
    }

    #[test]
    fn test_modify_permit_is_atomic_under_contention() {
        let store = Arc::new(MemoryStore::new());
        let start = Utc::now();
        store
            .save_permit(&Permit::new("P-9", "Работы", start, start + Duration::hours(2)))
            .unwrap();

        // Every thread tries the same created -> pending_start edge
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let mut won = false;
                    store
                        .modify_permit("P-9", &mut |p| {
                            if p.status != PermitStatus::Created {
                                return None;
                            }
                            won = true;
                            Some(p.clone().with_status(PermitStatus::PendingStart))
                        })
                        .unwrap();
                    won
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
