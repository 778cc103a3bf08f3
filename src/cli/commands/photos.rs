//! Photos command - Evidence photos of one phase

use crate::cli::context::Context;
use crate::cli::render::{photo_lines, print_json};
use crate::cli::GlobalOpts;
use crate::errors::Result;
use crate::schemas::Phase;

pub async fn run(opts: &GlobalOpts, number: &str, phase: Phase, json: bool) -> Result<()> {
    let ctx = Context::open(opts)?;
    let employee = ctx.employee()?;
    let photos = ctx.service.photos(&employee, number, phase)?;

    if json {
        return print_json(&photos);
    }
    println!("{}", photo_lines(phase, &photos));
    Ok(())
}
