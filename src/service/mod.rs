//! Front-end facing operations
//!
//! [`PermitService`] resolves employees and permits from the [`Store`], asks
//! the lifecycle engine for decisions and commits them, drives evidence upload
//! sessions and runs compliance checks through the [`Classifier`].

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::detection::{display_label, verdict_for, Annotator, Classifier};
use crate::domain::{
    apply_transition, available_actions, validate_transition, ComplianceReport, Denial,
    PermitAction, PhotoOutcome, PhotoVerdict, TransitionDecision, UploadSession,
};
use crate::errors::{PermitError, Result};
use crate::files::FileSource;
use crate::schemas::{
    Config, Employee, EvidencePhoto, ParticipantRole, Permit, Phase, RoleFilter,
};
use crate::store::Store;

#[cfg(test)]
mod tests;

/// What a viewer sees when opening a permit
#[derive(Debug, Clone, Serialize)]
pub struct PermitView {
    pub permit: Permit,
    pub supervisor_name: Option<String>,
    pub approver_name: Option<String>,
    pub executor_name: Option<String>,
    pub observer_name: Option<String>,
    pub crew_names: Vec<String>,
    /// Roles the viewer holds on the permit
    pub viewer_roles: Vec<ParticipantRole>,
    pub start_photos: usize,
    pub completion_photos: usize,
    /// Actions the viewer could request right now
    pub available_actions: Vec<PermitAction>,
}

/// Result of accepting one photo into an upload session
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub photo: EvidencePhoto,
    pub photos_collected: usize,
    pub remaining: usize,
}

/// Map a lifecycle denial onto the error taxonomy for operations that fail
/// instead of returning a decision.
pub fn denial_error(denial: &Denial) -> PermitError {
    match denial {
        Denial::InsufficientRole { .. } => PermitError::AccessDenied(denial.reason()),
        Denial::IllegalTransition { .. } => PermitError::IllegalTransition(denial.reason()),
    }
}

pub struct PermitService {
    store: Arc<dyn Store>,
    classifier: Arc<dyn Classifier>,
    files: Arc<dyn FileSource>,
    annotator: Option<Arc<Annotator>>,
    config: Config,
}

impl PermitService {
    pub fn new(
        store: Arc<dyn Store>,
        classifier: Arc<dyn Classifier>,
        files: Arc<dyn FileSource>,
        config: Config,
    ) -> Self {
        PermitService {
            store,
            classifier,
            files,
            annotator: None,
            config,
        }
    }

    /// Write an annotated copy of every photo a compliance check classifies.
    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = Some(Arc::new(annotator));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    // ===== AUTHENTICATION =====

    /// Bind `session` to the employee whose token this is.
    ///
    /// # Errors
    /// * `InvalidToken` - If the token is not an employee identifier
    /// * `NotFound` - If no employee has this token
    /// * `AccessDenied` - If the employee's role may not use the bot
    /// * `AuthConflict` - If the employee holds another session or the session
    ///   belongs to another employee
    pub fn authorize(&self, token: &str, session: &str) -> Result<Employee> {
        let id = Uuid::parse_str(token.trim())
            .map_err(|_| PermitError::InvalidToken(token.trim().to_string()))?;
        let employee = self.store.find_employee(id)?;

        if !employee.role.has_bot_access() {
            warn!(employee = %employee.id, role = %employee.role, "login refused for role");
            return Err(PermitError::AccessDenied(format!(
                "role {} has no access to the bot",
                employee.role
            )));
        }

        self.store.bind_session(session, employee.id)?;
        info!(employee = %employee.id, session, "session bound");
        Ok(employee)
    }

    /// Unbind `session`. Returns the employee it belonged to, if any.
    pub fn logout(&self, session: &str) -> Result<Option<Employee>> {
        match self.store.unbind_session(session)? {
            Some(id) => {
                info!(employee = %id, session, "session unbound");
                self.store.find_employee(id).map(Some)
            }
            None => Ok(None),
        }
    }

    /// The employee bound to `session`.
    ///
    /// # Errors
    /// * `AccessDenied` - If the session is not bound
    pub fn current_employee(&self, session: &str) -> Result<Employee> {
        let id = self
            .store
            .employee_for_session(session)?
            .ok_or_else(|| PermitError::AccessDenied("session is not logged in".to_string()))?;
        self.store.find_employee(id)
    }

    // ===== PERMITS =====

    /// Permits where the employee is supervisor or executor.
    pub fn list_my_permits(&self, employee: &Employee) -> Result<Vec<Permit>> {
        self.list_permits(employee, RoleFilter::Any)
    }

    pub fn list_permits(&self, employee: &Employee, filter: RoleFilter) -> Result<Vec<Permit>> {
        self.store.permits_for(employee.id, filter)
    }

    /// Find a permit the employee is allowed to view.
    fn viewable_permit(&self, employee: &Employee, number: &str) -> Result<Permit> {
        let permit = self.store.find_permit(number)?;
        if !permit.can_view(employee.id) {
            return Err(PermitError::AccessDenied(format!(
                "permit {} is only visible to its supervisor and executor",
                number
            )));
        }
        Ok(permit)
    }

    /// # Errors
    /// * `NotFound` - If the permit does not exist
    /// * `AccessDenied` - If the employee is neither supervisor nor executor
    pub fn get_permit_detail(&self, employee: &Employee, number: &str) -> Result<PermitView> {
        let permit = self.viewable_permit(employee, number)?;

        let crew_names = permit
            .crew_members
            .iter()
            .filter_map(|id| self.display_name(Some(*id)))
            .collect();

        Ok(PermitView {
            supervisor_name: self.display_name(permit.supervisor),
            approver_name: self.display_name(permit.approver),
            executor_name: self.display_name(permit.executor),
            observer_name: self.display_name(permit.observer),
            crew_names,
            viewer_roles: permit.viewer_roles(employee.id),
            start_photos: self.store.photos_for(permit.id, Phase::Start)?.len(),
            completion_photos: self.store.photos_for(permit.id, Phase::Completion)?.len(),
            available_actions: available_actions(&permit, employee.id),
            permit,
        })
    }

    fn display_name(&self, id: Option<Uuid>) -> Option<String> {
        let id = id?;
        match self.store.find_employee(id) {
            Ok(employee) => Some(employee.full_name),
            Err(e) => {
                debug!(employee = %id, error = %e, "participant not resolvable");
                None
            }
        }
    }

    /// Evidence photos of one phase in upload order.
    pub fn photos(&self, employee: &Employee, number: &str, phase: Phase) -> Result<Vec<EvidencePhoto>> {
        let permit = self.viewable_permit(employee, number)?;
        self.store.photos_for(permit.id, phase)
    }

    // ===== LIFECYCLE =====

    /// Ask the lifecycle engine for `action` and commit the result.
    ///
    /// Gate checks and the status write happen as one store update. Denials
    /// come back as a decision; only a missing permit or a store fault is an
    /// error.
    pub fn request_transition(
        &self,
        employee: &Employee,
        number: &str,
        action: PermitAction,
    ) -> Result<TransitionDecision> {
        let policy = self.config.timestamp_policy;
        let now = Utc::now();
        let mut decision = None;

        self.store.modify_permit(number, &mut |permit| {
            let result = apply_transition(permit, employee.id, action, policy, now);
            decision = Some(result.decision());
            result.permit()
        })?;

        let decision = decision
            .ok_or_else(|| PermitError::Store(format!("permit {} was not evaluated", number)))?;
        match &decision.denial {
            None => info!(
                permit = number,
                employee = %employee.id,
                %action,
                status = ?decision.resulting_status,
                "transition applied"
            ),
            Some(denial) => info!(
                permit = number,
                employee = %employee.id,
                %action,
                code = denial.code(),
                "transition denied"
            ),
        }
        Ok(decision)
    }

    // ===== EVIDENCE UPLOAD =====

    /// Open an upload cycle for `phase`.
    ///
    /// # Errors
    /// * `AccessDenied` - If the employee is not the permit's executor
    /// * `IllegalTransition` - If the permit cannot accept this phase's submit
    pub fn begin_upload(&self, employee: &Employee, number: &str, phase: Phase) -> Result<UploadSession> {
        let permit = self.store.find_permit(number)?;
        let action = PermitAction::submit(phase);
        if let Some(denial) = validate_transition(&permit, employee.id, action).denial {
            return Err(denial_error(&denial));
        }

        debug!(permit = number, %phase, "upload session opened");
        Ok(UploadSession::new(
            permit.id,
            permit.number,
            phase,
            employee.id,
            self.config.max_photos_per_phase,
        ))
    }

    /// Record one photo against an open upload session.
    ///
    /// A rejected photo (duplicate, missing file, cap reached) does not count
    /// toward the session.
    pub fn upload_evidence(
        &self,
        employee: &Employee,
        session: &mut UploadSession,
        file_handle: &str,
    ) -> Result<UploadResult> {
        if session.uploader != employee.id {
            return Err(PermitError::AccessDenied(
                "upload session belongs to another employee".to_string(),
            ));
        }
        session.ensure_capacity()?;
        if !self.files.contains(file_handle) {
            return Err(PermitError::NotFound(format!("File not found: {}", file_handle)));
        }

        let photo = self
            .store
            .record_photo(session.permit_id, session.phase, employee.id, file_handle)?;
        let photos_collected = session.record_accepted()?;
        info!(
            permit = %session.permit_number,
            phase = %session.phase,
            file = file_handle,
            photos_collected,
            "evidence photo recorded"
        );

        Ok(UploadResult {
            photo,
            photos_collected,
            remaining: session.remaining(),
        })
    }

    /// Close the session and request its submit transition.
    ///
    /// # Errors
    /// * `InvalidInput` - If fewer than `min_photos_per_submit` photos were collected
    pub fn finish_upload(&self, employee: &Employee, session: UploadSession) -> Result<TransitionDecision> {
        session.ensure_ready(self.config.min_photos_per_submit)?;
        self.request_transition(employee, &session.permit_number, session.submit_action())
    }

    /// Abandon the session. Photos already recorded stay in the store.
    pub fn cancel_upload(&self, session: UploadSession) -> usize {
        info!(
            permit = %session.permit_number,
            phase = %session.phase,
            discarded = session.photos_collected,
            "upload session cancelled"
        );
        session.photos_collected
    }

    // ===== COMPLIANCE =====

    /// Classify every photo of `phase` and aggregate a verdict.
    ///
    /// Photos are analysed concurrently, bounded by `analysis_concurrency`.
    /// A photo that fails to download or classify is inconclusive and does not
    /// abort the batch. Outcomes come back in upload order. With an annotator
    /// set, every classified photo also gets an annotated copy.
    ///
    /// # Errors
    /// * `AccessDenied` - If the employee is not the permit's supervisor
    pub async fn run_compliance_check(
        &self,
        employee: &Employee,
        number: &str,
        phase: Phase,
    ) -> Result<ComplianceReport> {
        let permit = self.store.find_permit(number)?;
        if !permit.is_supervisor(employee.id) {
            return Err(PermitError::AccessDenied(format!(
                "only the supervisor of permit {} may run a compliance check",
                number
            )));
        }

        let photos = self.store.photos_for(permit.id, phase)?;
        info!(permit = number, %phase, photos = photos.len(), "compliance check started");

        let limiter = Arc::new(Semaphore::new(self.config.analysis_concurrency.max(1)));
        let mut tasks = Vec::with_capacity(photos.len());
        for (index, photo) in photos.into_iter().enumerate() {
            let limiter = Arc::clone(&limiter);
            let job = PhotoJob {
                files: Arc::clone(&self.files),
                classifier: Arc::clone(&self.classifier),
                annotator: self.annotator.clone(),
                handle: photo.file_handle.clone(),
                violation_prefix: self.config.detector.violation_prefix.clone(),
                name: format!("{}-{}-{:02}", permit.number, phase, index + 1),
            };

            let task = tokio::spawn(async move {
                let _slot = limiter
                    .acquire_owned()
                    .await
                    .map_err(|e| PermitError::Classification(e.to_string()))?;
                job.run().await
            });
            tasks.push((index, photo, task));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (index, photo, task) in tasks {
            let analysed = match task.await {
                Ok(analysed) => analysed,
                Err(e) => Err(PermitError::Classification(format!("analysis task failed: {}", e))),
            };
            let analysis = analysed.unwrap_or_else(|e| {
                warn!(permit = number, file = %photo.file_handle, error = %e, "photo analysis failed");
                PhotoAnalysis::failed(&e)
            });
            outcomes.push(PhotoOutcome {
                index,
                photo_id: photo.id,
                file_handle: photo.file_handle,
                verdict: analysis.verdict,
                detected: analysis.detected,
                annotated: analysis.annotated,
            });
        }

        let report = ComplianceReport::new(permit.number, phase, outcomes);
        info!(
            permit = number,
            %phase,
            passed = report.tally.passed,
            failed = report.tally.failed,
            inconclusive = report.tally.inconclusive,
            "compliance check finished"
        );
        Ok(report)
    }
}

/// Everything one compliance task needs, owned so it can move onto the runtime
struct PhotoJob {
    files: Arc<dyn FileSource>,
    classifier: Arc<dyn Classifier>,
    annotator: Option<Arc<Annotator>>,
    handle: String,
    violation_prefix: String,
    /// Annotated copy file name
    name: String,
}

struct PhotoAnalysis {
    verdict: PhotoVerdict,
    detected: Vec<String>,
    annotated: Option<PathBuf>,
}

impl PhotoAnalysis {
    fn failed(error: &PermitError) -> Self {
        PhotoAnalysis {
            verdict: PhotoVerdict::Inconclusive {
                error: error.to_string(),
            },
            detected: Vec::new(),
            annotated: None,
        }
    }
}

impl PhotoJob {
    /// Download, classify and judge one photo. The download is removed before
    /// classification starts; an annotation failure only loses the copy.
    async fn run(self) -> Result<PhotoAnalysis> {
        let files = Arc::clone(&self.files);
        let handle = self.handle.clone();
        let image = tokio::task::spawn_blocking(move || {
            let mut download = files.download(&handle)?;
            download.bytes()
        })
        .await
        .map_err(|e| PermitError::Classification(format!("download task failed: {}", e)))??;

        let detections = self.classifier.detect(&image).await?;
        let verdict = verdict_for(&detections, &self.violation_prefix);
        let detected = detections
            .iter()
            .map(|d| display_label(&d.label).to_string())
            .collect();

        let annotated = match self.annotator {
            Some(annotator) => {
                let drawn = verdict.clone();
                let name = self.name.clone();
                let written = tokio::task::spawn_blocking(move || {
                    annotator.annotate(&image, &detections, &drawn, &name)
                })
                .await
                .map_err(|e| PermitError::Annotation(format!("annotation task failed: {}", e)))
                .and_then(|r| r);
                match written {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!(file = %self.handle, error = %e, "annotation failed");
                        None
                    }
                }
            }
            None => None,
        };

        Ok(PhotoAnalysis {
            verdict,
            detected,
            annotated,
        })
    }
}
