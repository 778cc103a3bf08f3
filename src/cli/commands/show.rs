//! Show command - Permit details for its supervisor or executor

use crate::cli::context::Context;
use crate::cli::render::{permit_card, print_json};
use crate::cli::GlobalOpts;
use crate::errors::Result;

pub async fn run(opts: &GlobalOpts, number: &str, json: bool) -> Result<()> {
    let ctx = Context::open(opts)?;
    let employee = ctx.employee()?;
    let view = ctx.service.get_permit_detail(&employee, number)?;

    if json {
        return print_json(&view);
    }
    println!("{}", permit_card(&view));
    Ok(())
}
