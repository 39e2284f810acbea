use crate::error::ImportError;
use crate::models::activity::NewActivity;
use crate::models::candidate::CandidateIssue;
use crate::models::issue::{Issue, NewIssue};
use crate::store::{ActivityStore, IssueStore, PairedWrite};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which candidates the caller ticked. Defaults to everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImportSelection {
    #[default]
    All,
    Only(HashSet<String>),
}

impl ImportSelection {
    pub fn from_ids(ids: Option<Vec<String>>) -> Self {
        match ids {
            Some(ids) => ImportSelection::Only(ids.into_iter().collect()),
            None => ImportSelection::All,
        }
    }

    fn includes(&self, ims_number: &str) -> bool {
        match self {
            ImportSelection::All => true,
            ImportSelection::Only(ids) => ids.contains(ims_number),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub project_id: Option<String>,
    /// Acting member; becomes assignee, reporter and activity author.
    pub member_id: String,
    pub selection: ImportSelection,
}

/// Candidates partitioned against the existing issues, in sheet order.
#[derive(Debug, Default)]
pub struct ImportPlan<'a> {
    pub to_create: Vec<&'a CandidateIssue>,
    pub already_imported: Vec<&'a CandidateIssue>,
    /// Same tracker id as an earlier row in this batch.
    pub repeated: Vec<&'a CandidateIssue>,
    pub deselected: Vec<&'a CandidateIssue>,
    /// Blank tracker id; these can never be deduplicated, so they are dropped.
    pub missing_id: Vec<&'a CandidateIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportProgress {
    pub completed: usize,
    pub total: usize,
    pub ims_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub created: usize,
    pub skipped_existing: Vec<String>,
    pub skipped_repeated: Vec<String>,
    pub deselected: usize,
    pub skipped_missing_id: usize,
    pub issues: Vec<Issue>,
}

#[derive(Debug)]
pub enum ImportOutcome {
    /// No target project was given; nothing was written.
    ProjectRequired,
    Imported(ImportReport),
}

pub fn is_already_imported(candidate: &CandidateIssue, existing: &[Issue]) -> bool {
    existing
        .iter()
        .any(|issue| issue.ims_number.as_deref() == Some(candidate.ims_number.trim()))
}

pub fn plan_import<'a>(
    candidates: &'a [CandidateIssue],
    existing: &[Issue],
    selection: &ImportSelection,
) -> ImportPlan<'a> {
    let known: HashSet<&str> = existing
        .iter()
        .filter_map(|issue| issue.ims_number.as_deref())
        .collect();
    let mut planned: HashSet<&str> = HashSet::new();
    let mut plan = ImportPlan::default();

    for candidate in candidates {
        let id = candidate.ims_number.trim();
        if id.is_empty() {
            plan.missing_id.push(candidate);
        } else if known.contains(id) {
            plan.already_imported.push(candidate);
        } else if !selection.includes(id) {
            plan.deselected.push(candidate);
        } else if !planned.insert(id) {
            plan.repeated.push(candidate);
        } else {
            plan.to_create.push(candidate);
        }
    }

    plan
}

pub fn new_issue_from_candidate(candidate: &CandidateIssue, project_id: &str, member_id: &str) -> NewIssue {
    NewIssue {
        project_id: project_id.to_string(),
        title: candidate.title.clone(),
        description: candidate.description.clone(),
        issue_type: candidate.issue_type,
        status: candidate.status,
        priority: candidate.priority,
        assignee_id: Some(member_id.to_string()),
        reporter_id: member_id.to_string(),
        due_date: None,
        tags: candidate.tags.clone(),
        ims_number: Some(candidate.ims_number.trim().to_string()),
    }
}

/// Create the selected, not-yet-imported candidates one at a time, each issue
/// together with its `issue_created` activity.
///
/// Creations run strictly in sheet order so `on_progress` sees a count that only
/// goes up. The first failure stops the run; pairs committed before it stay.
pub fn import_candidates<S, F>(
    store: &S,
    request: &ImportRequest,
    candidates: &[CandidateIssue],
    existing: &[Issue],
    mut on_progress: F,
) -> Result<ImportOutcome, ImportError>
where
    S: IssueStore + ActivityStore + PairedWrite,
    F: FnMut(ImportProgress),
{
    let Some(project_id) = request.project_id.as_deref().filter(|id| !id.is_empty()) else {
        log::warn!("Import of {} candidates skipped: no target project", candidates.len());
        return Ok(ImportOutcome::ProjectRequired);
    };
    if request.member_id.is_empty() {
        return Err(ImportError::InputMissing("memberId"));
    }

    let plan = plan_import(candidates, existing, &request.selection);
    if !plan.missing_id.is_empty() {
        log::warn!("Dropping {} candidates without a tracker id", plan.missing_id.len());
    }
    let total = plan.to_create.len();
    let mut created = Vec::with_capacity(total);

    for candidate in &plan.to_create {
        let fields = new_issue_from_candidate(candidate, project_id, &request.member_id);

        let issue = store
            .paired(|| {
                let issue = store.create_issue(&fields)?;
                store.create_activity(&NewActivity::issue_created(
                    &issue.title,
                    &request.member_id,
                    project_id,
                    &issue.id,
                ))?;
                Ok(issue)
            })
            .map_err(|source| {
                log::warn!(
                    "Import stopped at {} after {} of {} issues: {}",
                    candidate.ims_number,
                    created.len(),
                    total,
                    source
                );
                ImportError::Creation {
                    created: created.len(),
                    ims_number: candidate.ims_number.clone(),
                    source,
                }
            })?;

        log::debug!("Imported {} as issue {}", candidate.ims_number, issue.id);
        created.push(issue);
        on_progress(ImportProgress {
            completed: created.len(),
            total,
            ims_number: candidate.ims_number.clone(),
        });
    }

    log::info!(
        "Imported {} issues into project {} ({} already imported, {} deselected)",
        created.len(),
        project_id,
        plan.already_imported.len(),
        plan.deselected.len()
    );

    Ok(ImportOutcome::Imported(ImportReport {
        created: created.len(),
        skipped_existing: ids(&plan.already_imported),
        skipped_repeated: ids(&plan.repeated),
        deselected: plan.deselected.len(),
        skipped_missing_id: plan.missing_id.len(),
        issues: created,
    }))
}

fn ids(candidates: &[&CandidateIssue]) -> Vec<String> {
    candidates.iter().map(|c| c.ims_number.clone()).collect()
}
