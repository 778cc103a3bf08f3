//! Submit command - Upload evidence photos and request the submit transition

use tracing::warn;

use crate::cli::context::Context;
use crate::cli::render::decision_line;
use crate::cli::GlobalOpts;
use crate::errors::{PermitError, Result};
use crate::schemas::Phase;
use crate::service::denial_error;

/// Run one upload session over `handles`.
///
/// Rejected photos are reported and skipped; the batch stops at the cap.
pub async fn run(opts: &GlobalOpts, number: &str, phase: Phase, handles: &[String]) -> Result<()> {
    let ctx = Context::open(opts)?;
    let employee = ctx.employee()?;
    let mut session = ctx.service.begin_upload(&employee, number, phase)?;

    for handle in handles {
        match ctx.service.upload_evidence(&employee, &mut session, handle) {
            Ok(result) => println!(
                "📸 Фото {} из {} принято: {}",
                result.photos_collected, session.limit, handle
            ),
            Err(PermitError::LimitExceeded { limit }) => {
                println!("⚠️ Достигнут лимит фотографий ({}), остальные не загружены", limit);
                break;
            }
            Err(e) if !e.is_fatal() => {
                warn!(file = %handle, error = %e, "photo skipped");
                println!("⚠️ {}: {}", handle, e);
            }
            Err(e) => {
                ctx.service.cancel_upload(session);
                return Err(e);
            }
        }
    }

    let action = session.submit_action();
    let decision = ctx.service.finish_upload(&employee, session)?;
    if let Some(denial) = &decision.denial {
        return Err(denial_error(denial));
    }
    println!("{}", decision_line(action, &decision));
    Ok(())
}
