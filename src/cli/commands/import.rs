//! Import command - Load employees and permits created elsewhere

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::cli::context::Context;
use crate::cli::GlobalOpts;
use crate::errors::Result;
use crate::fs::read_json;
use crate::schemas::{Employee, Permit};

/// Contents of an import file
#[derive(Debug, Default, Deserialize)]
pub struct ImportBundle {
    #[serde(default)]
    pub employees: Vec<Employee>,

    #[serde(default)]
    pub permits: Vec<Permit>,
}

/// Save every employee and permit in the file. Existing records with the same
/// id are replaced.
pub async fn run(opts: &GlobalOpts, file: &Path) -> Result<()> {
    let ctx = Context::open(opts)?;
    let bundle: ImportBundle = read_json(file)?;
    let store = ctx.service.store();

    for employee in &bundle.employees {
        store.save_employee(employee)?;
    }
    for permit in &bundle.permits {
        store.save_permit(permit)?;
    }

    info!(
        employees = bundle.employees.len(),
        permits = bundle.permits.len(),
        "import finished"
    );
    println!(
        "Imported {} employee(s) and {} permit(s)",
        bundle.employees.len(),
        bundle.permits.len()
    );
    Ok(())
}
