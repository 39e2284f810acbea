//! Persistence seams used by the import pipeline, plus the read-through cache
//! the HTTP layer serves dashboards from.

use crate::error::StoreResult;
use crate::models::activity::{Activity, NewActivity};
use crate::models::issue::{Issue, NewIssue};
use chrono::{DateTime, Utc};

pub trait IssueStore {
    fn find_all_issues(&self) -> StoreResult<Vec<Issue>>;
    fn create_issue(&self, fields: &NewIssue) -> StoreResult<Issue>;
}

pub trait ActivityStore {
    fn create_activity(&self, fields: &NewActivity) -> StoreResult<Activity>;
}

pub trait ActivityFeed {
    fn recent_activities(&self, limit: usize) -> StoreResult<Vec<Activity>>;
}

/// Groups writes so readers see all of them or none.
pub trait PairedWrite {
    fn paired<T, F>(&self, work: F) -> StoreResult<T>
    where
        F: FnOnce() -> StoreResult<T>;
}

/// Snapshot of server state. Never updated in place: writers call
/// [`StoreCache::refresh`] after committing, and readers get whatever the last
/// refresh pulled.
#[derive(Debug, Default)]
pub struct StoreCache {
    issues: Vec<Issue>,
    activities: Vec<Activity>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl StoreCache {
    pub fn refresh<S>(&mut self, store: &S, activity_limit: usize) -> StoreResult<()>
    where
        S: IssueStore + ActivityFeed,
    {
        self.issues = store.find_all_issues()?;
        self.activities = store.recent_activities(activity_limit)?;
        self.refreshed_at = Some(Utc::now());
        log::debug!(
            "Cache refreshed: {} issues, {} activities",
            self.issues.len(),
            self.activities.len()
        );
        Ok(())
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}
