//! List command - Permits where the employee is supervisor or executor

use crate::cli::context::Context;
use crate::cli::render::{permit_line, print_json};
use crate::cli::GlobalOpts;
use crate::errors::Result;
use crate::schemas::RoleFilter;

pub async fn run(opts: &GlobalOpts, role: Option<RoleFilter>, json: bool) -> Result<()> {
    let ctx = Context::open(opts)?;
    let employee = ctx.employee()?;
    let permits = match role {
        Some(filter) => ctx.service.list_permits(&employee, filter)?,
        None => ctx.service.list_my_permits(&employee)?,
    };

    if json {
        return print_json(&permits);
    }
    if permits.is_empty() {
        println!("У вас нет нарядов");
        return Ok(());
    }
    for permit in &permits {
        println!("{}", permit_line(permit));
    }
    Ok(())
}
