//! Scenario tests for the service layer

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tempfile::{NamedTempFile, TempDir};

use super::*;
use crate::detection::{blank_png, BoxFuture, Detection};
use crate::domain::{ComplianceVerdict, IndeterminateCause};
use crate::files::ScopedDownload;
use crate::schemas::{EmployeeRole, PermitStatus, TimestampPolicy};
use crate::store::MemoryStore;

// ===== FAKES =====

/// File source whose file contents are the handle itself, except `*.png`
/// handles which hold a real image
#[derive(Default)]
struct FakeFiles {
    downloaded: Mutex<Vec<PathBuf>>,
}

impl FileSource for FakeFiles {
    fn contains(&self, handle: &str) -> bool {
        !handle.starts_with("missing")
    }

    fn download(&self, handle: &str) -> Result<ScopedDownload> {
        if handle.starts_with("lost") {
            return Err(PermitError::NotFound(format!("File not found: {}", handle)));
        }
        let mut file = NamedTempFile::new()?;
        if handle.ends_with(".png") {
            file.write_all(&blank_png(64, 48))?;
        } else {
            file.write_all(handle.as_bytes())?;
        }
        self.downloaded.lock().unwrap().push(file.path().to_path_buf());
        Ok(ScopedDownload::new(file))
    }
}

/// Classifier driven by the image bytes:
/// `fail*` and PNG images have a violation, `error*` fails, `slow*` passes
/// after a delay.
struct FakeClassifier;

const PNG_SIGNATURE: &[u8] = b"\x89PNG";

impl Classifier for FakeClassifier {
    fn detect<'a>(&'a self, image: &'a [u8]) -> BoxFuture<'a, Result<Vec<Detection>>> {
        Box::pin(async move {
            let name = String::from_utf8_lossy(image).to_string();
            let person = Detection {
                label: "person".to_string(),
                confidence: 0.9,
                bbox: [0, 0, 10, 10],
            };
            if name.starts_with("error") {
                return Err(PermitError::Classification("model crashed".to_string()));
            }
            if name.starts_with("slow") {
                tokio::time::sleep(StdDuration::from_millis(60)).await;
            }
            if name.starts_with("fail") || image.starts_with(PNG_SIGNATURE) {
                let violation = Detection {
                    label: "NO-Hardhat".to_string(),
                    bbox: [20, 10, 40, 30],
                    ..person.clone()
                };
                return Ok(vec![person, violation]);
            }
            Ok(vec![person])
        })
    }
}

// ===== FIXTURE =====

struct Site {
    service: PermitService,
    files: Arc<FakeFiles>,
    supervisor: Employee,
    executor: Employee,
    approver: Employee,
    observer: Employee,
    crew: Employee,
}

fn site_with(config: Config) -> Site {
    let store = Arc::new(MemoryStore::new());
    let supervisor = Employee::new("Петров П.П.", "Производитель работ", EmployeeRole::Supervisor);
    let executor = Employee::new("Иванов И.И.", "Электромонтёр", EmployeeRole::Executor);
    let approver = Employee::new("Смирнов А.А.", "Главный инженер", EmployeeRole::Approver);
    let observer = Employee::new("Орлова О.О.", "Наблюдающий", EmployeeRole::Observer);
    let crew = Employee::new("Волков В.В.", "Монтёр", EmployeeRole::Worker);
    for e in [&supervisor, &executor, &approver, &observer, &crew] {
        store.save_employee(e).unwrap();
    }

    let start = Utc::now();
    for number in ["P-100", "P-200"] {
        let permit = Permit::new(number, "Замена опоры", start, start + Duration::hours(8))
            .with_classifiers("Западный филиал", "РЭС-2", "Ремонт")
            .with_supervisor(supervisor.id)
            .with_executor(executor.id)
            .with_approver(approver.id)
            .with_observer(observer.id)
            .with_crew(vec![crew.id]);
        store.save_permit(&permit).unwrap();
    }

    let files = Arc::new(FakeFiles::default());
    let service = PermitService::new(store, Arc::new(FakeClassifier), files.clone(), config);
    Site {
        service,
        files,
        supervisor,
        executor,
        approver,
        observer,
        crew,
    }
}

fn site() -> Site {
    site_with(Config::default())
}

fn upload_all(site: &Site, number: &str, phase: Phase, handles: &[&str]) -> UploadSession {
    let mut session = site.service.begin_upload(&site.executor, number, phase).unwrap();
    for handle in handles {
        site.service
            .upload_evidence(&site.executor, &mut session, handle)
            .unwrap();
    }
    session
}

fn status_of(site: &Site, number: &str) -> PermitStatus {
    site.service.store().find_permit(number).unwrap().status
}

// ===== LIFECYCLE SCENARIOS =====

#[test]
fn test_end_to_end_start_cycle() {
    let site = site();

    let session = upload_all(&site, "P-100", Phase::Start, &["s1.jpg", "s2.jpg"]);
    let decision = site.service.finish_upload(&site.executor, session).unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.resulting_status, Some(PermitStatus::PendingStart));

    let permit = site.service.store().find_permit("P-100").unwrap();
    assert_eq!(permit.status, PermitStatus::PendingStart);
    assert!(permit.actual_start_at.is_some());
    assert!(permit.actual_end_at.is_none());

    let decision = site
        .service
        .request_transition(&site.supervisor, "P-100", PermitAction::ApproveStart)
        .unwrap();
    assert_eq!(decision.resulting_status, Some(PermitStatus::InProgress));

    let decision = site
        .service
        .request_transition(&site.supervisor, "P-100", PermitAction::RejectCompletion)
        .unwrap();
    assert!(!decision.allowed);
    assert!(matches!(decision.denial, Some(Denial::IllegalTransition { .. })));
    assert_eq!(status_of(&site, "P-100"), PermitStatus::InProgress);
}

#[test]
fn test_full_lifecycle_to_completed() {
    let site = site();
    let session = upload_all(&site, "P-100", Phase::Start, &["s1.jpg"]);
    site.service.finish_upload(&site.executor, session).unwrap();
    site.service
        .request_transition(&site.supervisor, "P-100", PermitAction::ApproveStart)
        .unwrap();

    let session = upload_all(&site, "P-100", Phase::Completion, &["c1.jpg"]);
    let decision = site.service.finish_upload(&site.executor, session).unwrap();
    assert_eq!(decision.resulting_status, Some(PermitStatus::PendingCompletion));

    let decision = site
        .service
        .request_transition(&site.supervisor, "P-100", PermitAction::ApproveCompletion)
        .unwrap();
    assert_eq!(decision.resulting_status, Some(PermitStatus::Completed));

    let permit = site.service.store().find_permit("P-100").unwrap();
    assert!(permit.actual_end_at.is_some());
}

#[test]
fn test_role_gate_denial_keeps_status() {
    let site = site();

    let decision = site
        .service
        .request_transition(&site.supervisor, "P-100", PermitAction::SubmitStart)
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.denial.as_ref().map(Denial::code), Some("INSUFFICIENT_ROLE"));
    assert_eq!(status_of(&site, "P-100"), PermitStatus::Created);
}

#[test]
fn test_transition_on_unknown_permit_is_not_found() {
    let site = site();
    let err = site
        .service
        .request_transition(&site.executor, "P-404", PermitAction::SubmitStart)
        .unwrap_err();
    assert!(matches!(err, PermitError::NotFound(_)));
}

#[test]
fn test_reject_and_resubmit_refreshes_actual_start() {
    let site = site();
    let session = upload_all(&site, "P-100", Phase::Start, &["s1.jpg"]);
    site.service.finish_upload(&site.executor, session).unwrap();
    let first = site.service.store().find_permit("P-100").unwrap().actual_start_at;

    site.service
        .request_transition(&site.supervisor, "P-100", PermitAction::RejectStart)
        .unwrap();
    assert_eq!(status_of(&site, "P-100"), PermitStatus::Created);

    std::thread::sleep(StdDuration::from_millis(5));
    let session = upload_all(&site, "P-100", Phase::Start, &["s2.jpg"]);
    site.service.finish_upload(&site.executor, session).unwrap();
    let second = site.service.store().find_permit("P-100").unwrap().actual_start_at;

    assert!(second > first);
}

#[test]
fn test_keep_first_policy_preserves_actual_start() {
    let mut config = Config::default();
    config.timestamp_policy = TimestampPolicy::KeepFirst;
    let site = site_with(config);

    let session = upload_all(&site, "P-100", Phase::Start, &["s1.jpg"]);
    site.service.finish_upload(&site.executor, session).unwrap();
    let first = site.service.store().find_permit("P-100").unwrap().actual_start_at;
    site.service
        .request_transition(&site.supervisor, "P-100", PermitAction::RejectStart)
        .unwrap();

    let session = upload_all(&site, "P-100", Phase::Start, &["s2.jpg"]);
    site.service.finish_upload(&site.executor, session).unwrap();

    let permit = site.service.store().find_permit("P-100").unwrap();
    assert_eq!(permit.actual_start_at, first);
}

// ===== ACCESS =====

#[test]
fn test_detail_denied_for_non_viewing_roles() {
    let site = site();
    for outsider in [&site.approver, &site.observer, &site.crew] {
        let err = site.service.get_permit_detail(outsider, "P-200").unwrap_err();
        assert!(matches!(err, PermitError::AccessDenied(_)), "{}", outsider.full_name);
    }
}

#[test]
fn test_detail_for_executor() {
    let site = site();
    upload_all(&site, "P-200", Phase::Start, &["a.jpg", "b.jpg", "c.jpg"]);

    let view = site.service.get_permit_detail(&site.executor, "P-200").unwrap();
    assert_eq!(view.permit.number, "P-200");
    assert_eq!(view.supervisor_name.as_deref(), Some("Петров П.П."));
    assert_eq!(view.approver_name.as_deref(), Some("Смирнов А.А."));
    assert_eq!(view.observer_name.as_deref(), Some("Орлова О.О."));
    assert_eq!(view.crew_names, vec!["Волков В.В.".to_string()]);
    assert_eq!(view.viewer_roles, vec![ParticipantRole::Executor]);
    assert_eq!(view.start_photos, 3);
    assert_eq!(view.completion_photos, 0);
    assert_eq!(view.available_actions, vec![PermitAction::SubmitStart]);
}

#[test]
fn test_detail_unknown_permit_is_not_found() {
    let site = site();
    let err = site.service.get_permit_detail(&site.executor, "P-999").unwrap_err();
    assert!(matches!(err, PermitError::NotFound(_)));
}

#[test]
fn test_list_my_permits() {
    let site = site();
    assert_eq!(site.service.list_my_permits(&site.executor).unwrap().len(), 2);
    assert_eq!(site.service.list_my_permits(&site.supervisor).unwrap().len(), 2);
    assert!(site.service.list_my_permits(&site.approver).unwrap().is_empty());
    assert!(site
        .service
        .list_permits(&site.executor, RoleFilter::Supervisor)
        .unwrap()
        .is_empty());
}

// ===== AUTHENTICATION =====

#[test]
fn test_authorize_binds_session() {
    let site = site();
    let token = site.executor.id.to_string();

    let employee = site.service.authorize(&token, "chat-1").unwrap();
    assert_eq!(employee.id, site.executor.id);
    assert_eq!(site.service.current_employee("chat-1").unwrap().id, site.executor.id);

    // Same session again is fine
    assert!(site.service.authorize(&token, "chat-1").is_ok());
}

#[test]
fn test_authorize_conflict_on_second_session() {
    let site = site();
    let token = site.executor.id.to_string();
    site.service.authorize(&token, "chat-1").unwrap();

    let err = site.service.authorize(&token, "chat-2").unwrap_err();
    assert!(matches!(err, PermitError::AuthConflict));
    assert!(site.service.current_employee("chat-2").is_err());
}

#[test]
fn test_authorize_refuses_session_held_by_another_employee() {
    let site = site();
    site.service
        .authorize(&site.executor.id.to_string(), "chat-1")
        .unwrap();

    let err = site
        .service
        .authorize(&site.supervisor.id.to_string(), "chat-1")
        .unwrap_err();
    assert!(matches!(err, PermitError::AuthConflict));
    assert_eq!(site.service.current_employee("chat-1").unwrap().id, site.executor.id);
}

#[test]
fn test_authorize_rejects_bad_tokens() {
    let site = site();
    assert!(matches!(
        site.service.authorize("not-a-token", "chat-1"),
        Err(PermitError::InvalidToken(_))
    ));
    assert!(matches!(
        site.service.authorize(&Uuid::new_v4().to_string(), "chat-1"),
        Err(PermitError::NotFound(_))
    ));
}

#[test]
fn test_authorize_refuses_roles_without_access() {
    let site = site();
    let err = site
        .service
        .authorize(&site.observer.id.to_string(), "chat-9")
        .unwrap_err();
    assert!(matches!(err, PermitError::AccessDenied(_)));
    assert!(site.service.current_employee("chat-9").is_err());
}

#[test]
fn test_logout_unbinds() {
    let site = site();
    site.service
        .authorize(&site.supervisor.id.to_string(), "chat-1")
        .unwrap();

    let left = site.service.logout("chat-1").unwrap();
    assert_eq!(left.map(|e| e.id), Some(site.supervisor.id));
    assert!(site.service.logout("chat-1").unwrap().is_none());

    // Free to log in elsewhere now
    assert!(site
        .service
        .authorize(&site.supervisor.id.to_string(), "chat-2")
        .is_ok());
}

// ===== UPLOADS =====

#[test]
fn test_eleventh_upload_exceeds_limit() {
    let site = site();
    let mut session = site
        .service
        .begin_upload(&site.executor, "P-100", Phase::Start)
        .unwrap();
    for i in 0..10 {
        let handle = format!("photo-{}.jpg", i);
        site.service
            .upload_evidence(&site.executor, &mut session, &handle)
            .unwrap();
    }

    let err = site
        .service
        .upload_evidence(&site.executor, &mut session, "photo-10.jpg")
        .unwrap_err();
    assert!(matches!(err, PermitError::LimitExceeded { limit: 10 }));

    let permit = site.service.store().find_permit("P-100").unwrap();
    assert_eq!(site.service.store().photos_for(permit.id, Phase::Start).unwrap().len(), 10);
}

#[test]
fn test_duplicate_upload_is_rejected_once() {
    let site = site();
    let mut session = site
        .service
        .begin_upload(&site.executor, "P-100", Phase::Start)
        .unwrap();
    site.service
        .upload_evidence(&site.executor, &mut session, "same.jpg")
        .unwrap();

    let err = site
        .service
        .upload_evidence(&site.executor, &mut session, "same.jpg")
        .unwrap_err();
    assert!(matches!(err, PermitError::DuplicateUpload(_)));
    assert_eq!(session.photos_collected, 1);

    let photos = site
        .service
        .photos(&site.executor, "P-100", Phase::Start)
        .unwrap();
    assert_eq!(photos.len(), 1);
}

#[test]
fn test_missing_file_is_not_recorded() {
    let site = site();
    let mut session = site
        .service
        .begin_upload(&site.executor, "P-100", Phase::Start)
        .unwrap();
    let err = site
        .service
        .upload_evidence(&site.executor, &mut session, "missing.jpg")
        .unwrap_err();
    assert!(matches!(err, PermitError::NotFound(_)));
    assert_eq!(session.photos_collected, 0);
}

#[test]
fn test_begin_upload_gates() {
    let site = site();
    assert!(matches!(
        site.service.begin_upload(&site.supervisor, "P-100", Phase::Start),
        Err(PermitError::AccessDenied(_))
    ));
    assert!(matches!(
        site.service.begin_upload(&site.executor, "P-100", Phase::Completion),
        Err(PermitError::IllegalTransition(_))
    ));
}

#[test]
fn test_upload_by_other_employee_is_denied() {
    let site = site();
    let mut session = site
        .service
        .begin_upload(&site.executor, "P-100", Phase::Start)
        .unwrap();
    let err = site
        .service
        .upload_evidence(&site.supervisor, &mut session, "x.jpg")
        .unwrap_err();
    assert!(matches!(err, PermitError::AccessDenied(_)));
}

#[test]
fn test_finish_without_photos_is_refused() {
    let site = site();
    let session = site
        .service
        .begin_upload(&site.executor, "P-100", Phase::Start)
        .unwrap();

    let err = site.service.finish_upload(&site.executor, session).unwrap_err();
    assert!(matches!(err, PermitError::InvalidInput(_)));
    assert_eq!(status_of(&site, "P-100"), PermitStatus::Created);
}

#[test]
fn test_cancel_keeps_recorded_photos() {
    let site = site();
    let session = upload_all(&site, "P-100", Phase::Start, &["k1.jpg", "k2.jpg"]);

    assert_eq!(site.service.cancel_upload(session), 2);
    assert_eq!(status_of(&site, "P-100"), PermitStatus::Created);
    let photos = site
        .service
        .photos(&site.executor, "P-100", Phase::Start)
        .unwrap();
    assert_eq!(photos.len(), 2);
}

// ===== COMPLIANCE =====

#[tokio::test]
async fn test_compliance_mixed_batch() {
    let site = site();
    upload_all(
        &site,
        "P-100",
        Phase::Start,
        &["slow-ok.jpg", "fail-1.jpg", "ok-2.jpg", "error-3.jpg", "lost-4.jpg"],
    );

    let report = site
        .service
        .run_compliance_check(&site.supervisor, "P-100", Phase::Start)
        .await
        .unwrap();

    assert_eq!(report.verdict, ComplianceVerdict::PartiallyCompliant { passed: 2, of: 3 });
    assert_eq!(report.processed(), 5);
    assert_eq!(report.tally.inconclusive, 2);

    let handles: Vec<&str> = report.outcomes.iter().map(|o| o.file_handle.as_str()).collect();
    assert_eq!(
        handles,
        vec!["slow-ok.jpg", "fail-1.jpg", "ok-2.jpg", "error-3.jpg", "lost-4.jpg"]
    );
    assert!(report.outcomes[1].detected.contains(&"Нет каски".to_string()));
    assert!(report.outcomes[3].verdict.is_inconclusive());

    let downloaded = site.files.downloaded.lock().unwrap();
    assert_eq!(downloaded.len(), 4);
    assert!(downloaded.iter().all(|p| !p.exists()));
}

#[tokio::test]
async fn test_compliance_all_pass() {
    let site = site();
    upload_all(&site, "P-100", Phase::Start, &["a.jpg", "b.jpg", "c.jpg"]);

    let report = site
        .service
        .run_compliance_check(&site.supervisor, "P-100", Phase::Start)
        .await
        .unwrap();
    assert_eq!(report.verdict, ComplianceVerdict::FullyCompliant);
}

#[tokio::test]
async fn test_compliance_all_fail() {
    let site = site();
    upload_all(&site, "P-100", Phase::Start, &["fail-a.jpg", "fail-b.jpg", "fail-c.jpg"]);

    let report = site
        .service
        .run_compliance_check(&site.supervisor, "P-100", Phase::Start)
        .await
        .unwrap();
    assert_eq!(report.verdict, ComplianceVerdict::NonCompliant);
}

#[tokio::test]
async fn test_compliance_without_photos() {
    let site = site();
    let report = site
        .service
        .run_compliance_check(&site.supervisor, "P-100", Phase::Completion)
        .await
        .unwrap();
    assert_eq!(
        report.verdict,
        ComplianceVerdict::Indeterminate {
            cause: IndeterminateCause::NoPhotos
        }
    );
    assert_eq!(report.processed(), 0);
}

#[tokio::test]
async fn test_compliance_all_failures_is_processing_failed() {
    let site = site();
    upload_all(&site, "P-100", Phase::Start, &["error-a.jpg", "lost-b.jpg"]);

    let report = site
        .service
        .run_compliance_check(&site.supervisor, "P-100", Phase::Start)
        .await
        .unwrap();
    assert_eq!(
        report.verdict,
        ComplianceVerdict::Indeterminate {
            cause: IndeterminateCause::ProcessingFailed
        }
    );
    assert_eq!(report.processed(), 2);
}

#[tokio::test]
async fn test_compliance_restricted_to_supervisor() {
    let site = site();
    let err = site
        .service
        .run_compliance_check(&site.executor, "P-100", Phase::Start)
        .await
        .unwrap_err();
    assert!(matches!(err, PermitError::AccessDenied(_)));
}

#[tokio::test]
async fn test_compliance_writes_annotated_copies() {
    let mut site = site();
    let out = TempDir::new().unwrap();
    let annotator = Annotator::new(out.path(), "NO-").without_text();
    site.service = site.service.with_annotator(annotator);
    upload_all(&site, "P-100", Phase::Start, &["helmet-off.png", "error-2.jpg"]);

    let report = site
        .service
        .run_compliance_check(&site.supervisor, "P-100", Phase::Start)
        .await
        .unwrap();

    assert!(matches!(report.outcomes[0].verdict, PhotoVerdict::Fail { .. }));
    let copy = report.outcomes[0].annotated.clone().unwrap();
    assert_eq!(copy, out.path().join("P-100-start-01.png"));
    assert!(copy.exists());
    assert_eq!(report.outcomes[1].annotated, None);
}

#[tokio::test]
async fn test_compliance_annotation_failure_leaves_no_file() {
    let mut site = site();
    let out = TempDir::new().unwrap();
    site.service = site
        .service
        .with_annotator(Annotator::new(out.path(), "NO-").without_text());
    // Not an image: classified, but cannot be drawn on
    upload_all(&site, "P-100", Phase::Start, &["fail-text.jpg"]);

    let report = site
        .service
        .run_compliance_check(&site.supervisor, "P-100", Phase::Start)
        .await
        .unwrap();

    assert_eq!(report.verdict, ComplianceVerdict::NonCompliant);
    assert_eq!(report.outcomes[0].annotated, None);
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_compliance_without_annotator_draws_nothing() {
    let site = site();
    upload_all(&site, "P-100", Phase::Start, &["helmet-off.png"]);

    let report = site
        .service
        .run_compliance_check(&site.supervisor, "P-100", Phase::Start)
        .await
        .unwrap();
    assert_eq!(report.outcomes[0].annotated, None);
}
