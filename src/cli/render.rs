//! Text rendering for command output
//!
//! Messages are in Russian, matching what field crews see in the chat bot.

use serde::Serialize;

use crate::domain::{ComplianceReport, PermitAction, PhotoVerdict, TransitionDecision};
use crate::errors::{PermitError, Result};
use crate::schemas::{Employee, EvidencePhoto, Permit, Phase};
use crate::service::PermitView;

const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Print any serializable value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| PermitError::InvalidJson(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

pub fn permit_line(permit: &Permit) -> String {
    format!(
        "📄 {} | {} | {} | {}",
        permit.number,
        permit.status.label(),
        permit.start_at.format(DATE_FORMAT),
        permit.task_description
    )
}

pub fn employee_card(employee: &Employee) -> String {
    let mut lines = vec![
        format!("👤 {}", employee.full_name),
        format!("Должность: {}", employee.position),
        format!("Роль: {}", employee.role.label()),
    ];
    if let Some(group) = &employee.eb_group {
        lines.push(format!("Группа по ЭБ: {}", group));
    }
    if let Some(group) = &employee.ozp_group {
        lines.push(format!("Группа по ОЗП: {}", group));
    }
    lines.push(format!("Токен: {}", employee.id));
    lines.join("\n")
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

pub fn permit_card(view: &PermitView) -> String {
    let p = &view.permit;
    let mut lines = vec![
        format!("📄 Наряд № {}", p.number),
        format!("Статус: {}", p.status.label()),
        format!("Филиал: {}", or_dash(Some(p.branch.as_str()))),
        format!("Подразделение: {}", or_dash(Some(p.department.as_str()))),
        format!("Вид работ: {}", or_dash(Some(p.work_type.as_str()))),
        format!("Задание: {}", p.task_description),
        format!(
            "План: {} - {}",
            p.start_at.format(DATE_FORMAT),
            p.end_at.format(DATE_FORMAT)
        ),
    ];
    if let Some(at) = p.actual_start_at {
        lines.push(format!("Фактическое начало: {}", at.format(DATE_FORMAT)));
    }
    if let Some(at) = p.actual_end_at {
        lines.push(format!("Фактическое окончание: {}", at.format(DATE_FORMAT)));
    }

    lines.push(format!("Руководитель работ: {}", or_dash(view.supervisor_name.as_deref())));
    lines.push(format!("Допускающий: {}", or_dash(view.approver_name.as_deref())));
    lines.push(format!("Производитель работ: {}", or_dash(view.executor_name.as_deref())));
    lines.push(format!("Наблюдающий: {}", or_dash(view.observer_name.as_deref())));
    if !view.crew_names.is_empty() {
        lines.push(format!("Члены бригады: {}", view.crew_names.join(", ")));
    }

    let roles: Vec<&str> = view.viewer_roles.iter().map(|r| r.label()).collect();
    lines.push(format!("Ваша роль: {}", roles.join(", ")));
    lines.push(format!(
        "Фото: начало {}, завершение {}",
        view.start_photos, view.completion_photos
    ));

    if !view.available_actions.is_empty() {
        lines.push(format!("Доступно: {}", action_list(&view.available_actions)));
    }
    lines.join("\n")
}

fn action_list(actions: &[PermitAction]) -> String {
    actions
        .iter()
        .map(|a| format!("{} ({})", a.label(), a))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn photo_lines(phase: Phase, photos: &[EvidencePhoto]) -> String {
    if photos.is_empty() {
        return format!("❌ Фотографии ({}) не найдены", phase.label());
    }
    let mut lines = vec![format!("📸 Фотографии ({}): {}", phase.label(), photos.len())];
    for (i, photo) in photos.iter().enumerate() {
        lines.push(format!(
            "{}. {} ({})",
            i + 1,
            photo.file_handle,
            photo.created_at.format(DATE_FORMAT)
        ));
    }
    lines.join("\n")
}

/// Success line for an applied decision
pub fn decision_line(action: PermitAction, decision: &TransitionDecision) -> String {
    match decision.resulting_status {
        Some(status) => format!("✅ {}: статус «{}»", action.label(), status.label()),
        None => format!("⛔ {}", decision.reason().unwrap_or_default()),
    }
}

pub fn compliance_report(report: &ComplianceReport) -> String {
    let mut lines = vec![format!(
        "🔍 Наряд № {}, {}",
        report.permit_number,
        report.phase.label()
    )];
    for outcome in &report.outcomes {
        let mut line = format!("Фото {}: {}", outcome.index + 1, outcome.verdict.status_text());
        match &outcome.verdict {
            PhotoVerdict::Fail { violations } => {
                let names: Vec<&str> = violations
                    .iter()
                    .map(|v| crate::detection::display_label(v))
                    .collect();
                line.push_str(&format!(" ({})", names.join(", ")));
            }
            PhotoVerdict::Inconclusive { error } => {
                line.push_str(&format!(" ({})", error));
            }
            PhotoVerdict::Pass => {}
        }
        lines.push(line);
        if let Some(path) = &outcome.annotated {
            lines.push(format!("   Разметка: {}", path.display()));
        }
    }
    lines.push(String::new());
    lines.push(report.verdict.summary());
    lines.push(format!("Обработано фотографий: {}", report.processed()));
    lines.join("\n")
}
