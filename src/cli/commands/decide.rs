//! Approve and reject commands

use crate::cli::context::Context;
use crate::cli::render::decision_line;
use crate::cli::GlobalOpts;
use crate::domain::PermitAction;
use crate::errors::Result;
use crate::service::denial_error;

/// Request a supervisor decision. A denial is reported as an error.
pub async fn run(opts: &GlobalOpts, number: &str, action: PermitAction) -> Result<()> {
    let ctx = Context::open(opts)?;
    let employee = ctx.employee()?;
    let decision = ctx.service.request_transition(&employee, number, action)?;

    if let Some(denial) = &decision.denial {
        return Err(denial_error(denial));
    }
    println!("{}", decision_line(action, &decision));
    Ok(())
}
