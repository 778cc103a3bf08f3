//! Analyze command - PPE compliance check for the supervisor

use crate::cli::context::Context;
use crate::cli::render::{compliance_report, print_json};
use crate::cli::GlobalOpts;
use crate::errors::Result;
use crate::schemas::Phase;

pub async fn run(
    opts: &GlobalOpts,
    number: &str,
    phase: Phase,
    annotate: bool,
    json: bool,
) -> Result<()> {
    let ctx = Context::open(opts)?;
    let employee = ctx.employee()?;
    let service = if annotate {
        let annotator = ctx.annotator()?;
        ctx.service.with_annotator(annotator)
    } else {
        ctx.service
    };

    if !json {
        println!("🔍 Анализирую фотографии...");
    }
    let report = service.run_compliance_check(&employee, number, phase).await?;

    if json {
        return print_json(&report);
    }
    println!("{}", compliance_report(&report));
    Ok(())
}
