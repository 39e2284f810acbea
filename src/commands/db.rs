use crate::error::{StoreError, StoreResult};
use crate::models::activity::{Activity, NewActivity};
use crate::models::issue::{Issue, IssueStatus, NewIssue};
use crate::models::member::{Member, NewMember};
use crate::models::project::{NewProject, Project, PROJECT_STATUSES};
use crate::store::{ActivityFeed, ActivityStore, IssueStore, PairedWrite};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;

const DB_SCHEMA_VERSION: i64 = 3;

pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 2 {
        apply_migration_2(conn)?;
        version = 2;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 3 {
        apply_migration_3(conn)?;
        version = 3;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        log::warn!("Database schema version {version} is newer than this build ({DB_SCHEMA_VERSION})");
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS members (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_ja TEXT,
            email TEXT NOT NULL UNIQUE,
            avatar TEXT NOT NULL DEFAULT '',
            role TEXT CHECK(role IN ('admin', 'member')) NOT NULL DEFAULT 'member',
            department TEXT,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            status TEXT CHECK(status IN ('backlog', 'in_progress', 'review', 'completed', 'on_hold')) NOT NULL DEFAULT 'backlog',
            priority TEXT CHECK(priority IN ('urgent', 'high', 'medium', 'low')) NOT NULL DEFAULT 'medium',
            start_date INTEGER NOT NULL,
            due_date INTEGER NOT NULL,
            customer TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS project_members (
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            member_id TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
            PRIMARY KEY (project_id, member_id)
        );

        CREATE TABLE IF NOT EXISTS issues (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            type TEXT CHECK(type IN ('bug', 'feature', 'inquiry', 'task')) NOT NULL DEFAULT 'task',
            status TEXT CHECK(status IN ('new', 'in_progress', 'review', 'completed', 'on_hold')) NOT NULL DEFAULT 'new',
            priority TEXT CHECK(priority IN ('urgent', 'high', 'medium', 'low')) NOT NULL DEFAULT 'medium',
            assignee_id TEXT,
            reporter_id TEXT NOT NULL,
            due_date INTEGER,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS activities (
            id TEXT PRIMARY KEY,
            type TEXT NOT NULL,
            description TEXT NOT NULL,
            member_id TEXT NOT NULL,
            project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
            issue_id TEXT REFERENCES issues(id) ON DELETE SET NULL,
            created_at INTEGER NOT NULL
        );
        ",
    )
}

fn apply_migration_2(conn: &Connection) -> rusqlite::Result<()> {
    add_column_if_missing(conn, "issues", "ims_number TEXT")?;

    // Older rows stored an empty string for "no tracker id".
    conn.execute("UPDATE issues SET ims_number = NULL WHERE ims_number = ''", [])?;

    Ok(())
}

fn apply_migration_3(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project_id);
        CREATE INDEX IF NOT EXISTS idx_issues_assignee ON issues(assignee_id);
        CREATE INDEX IF NOT EXISTS idx_issues_ims_number ON issues(ims_number);
        CREATE INDEX IF NOT EXISTS idx_activities_created_at ON activities(created_at);
        ",
    )
}

fn add_column_if_missing(conn: &Connection, table: &str, column_def: &str) -> rusqlite::Result<()> {
    let column_name = column_def
        .split_whitespace()
        .next()
        .unwrap_or(column_def)
        .to_string();

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .filter_map(|res| res.ok())
        .any(|name| name == column_name);

    if !exists {
        conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {column_def}"), [])?;
    }

    Ok(())
}

/// Optional equality filters for issue listings; all given filters must match.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub project_id: Option<String>,
    pub assignee_id: Option<String>,
    pub status: Option<IssueStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub project_id: Option<String>,
    pub member_id: Option<String>,
    pub limit: Option<usize>,
}

const ISSUE_COLUMNS: &str = "id, project_id, title, description, type, status, priority, assignee_id, reporter_id, due_date, tags, ims_number, created_at, updated_at";
const ACTIVITY_COLUMNS: &str = "id, type, description, member_id, project_id, issue_id, created_at";
const MEMBER_COLUMNS: &str = "id, name, name_ja, email, avatar, role, department, created_at";
const PROJECT_COLUMNS: &str = "id, name, description, status, priority, start_date, due_date, customer, created_at, updated_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Invalid(format!("Could not create {}: {e}", parent.display())))?;
        }
        let conn = Connection::open(path)?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn schema_version(&self) -> StoreResult<i64> {
        Ok(self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?)
    }

    // Members

    pub fn list_members(&self) -> StoreResult<Vec<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {MEMBER_COLUMNS} FROM members ORDER BY created_at ASC, rowid ASC"))?;
        let members = stmt
            .query_map([], member_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(members)
    }

    pub fn get_member(&self, id: &str) -> StoreResult<Option<Member>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"),
                params![id],
                member_from_row,
            )
            .optional()?)
    }

    pub fn create_member(&self, fields: &NewMember) -> StoreResult<Member> {
        if fields.role != "admin" && fields.role != "member" {
            return Err(StoreError::Invalid(format!("Unknown member role: {}", fields.role)));
        }
        let member = Member {
            id: new_id(),
            name: fields.name.clone(),
            name_ja: fields.name_ja.clone(),
            email: fields.email.clone(),
            avatar: fields.avatar.clone(),
            role: fields.role.clone(),
            department: fields.department.clone(),
            created_at: Utc::now(),
        };

        self.conn.execute(
            "INSERT INTO members (id, name, name_ja, email, avatar, role, department, created_at) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                &member.id,
                &member.name,
                member.name_ja.as_deref(),
                &member.email,
                &member.avatar,
                &member.role,
                member.department.as_deref(),
                to_millis(member.created_at),
            ],
        )?;
        Ok(member)
    }

    // Projects

    pub fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY updated_at DESC, rowid DESC"))?;
        let mut projects = stmt
            .query_map([], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for project in &mut projects {
            project.member_ids = self.project_member_ids(&project.id)?;
        }
        Ok(projects)
    }

    pub fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        let project = self
            .conn
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
                params![id],
                project_from_row,
            )
            .optional()?;

        match project {
            Some(mut project) => {
                project.member_ids = self.project_member_ids(&project.id)?;
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    /// Create a project with its member links, recording `project_created`
    /// when an acting member is known.
    pub fn create_project(&self, fields: &NewProject, current_member: Option<&str>) -> StoreResult<Project> {
        if !PROJECT_STATUSES.contains(&fields.status.as_str()) {
            return Err(StoreError::Invalid(format!("Unknown project status: {}", fields.status)));
        }

        self.paired(|| {
            let now = Utc::now();
            let project = Project {
                id: new_id(),
                name: fields.name.clone(),
                description: fields.description.clone(),
                status: fields.status.clone(),
                priority: fields.priority,
                start_date: fields.start_date,
                due_date: fields.due_date,
                customer: fields.customer.clone(),
                member_ids: fields.member_ids.clone(),
                created_at: now,
                updated_at: now,
            };

            self.conn.execute(
                "INSERT INTO projects (id, name, description, status, priority, start_date, due_date, customer, created_at, updated_at) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
                params![
                    &project.id,
                    &project.name,
                    &project.description,
                    &project.status,
                    project.priority.as_str(),
                    to_millis(project.start_date),
                    to_millis(project.due_date),
                    &project.customer,
                    to_millis(project.created_at),
                    to_millis(project.updated_at),
                ],
            )?;

            for member_id in &project.member_ids {
                self.conn.execute(
                    "INSERT OR IGNORE INTO project_members (project_id, member_id) VALUES (?1, ?2)",
                    params![&project.id, member_id],
                )?;
            }

            if let Some(member_id) = current_member {
                self.create_activity(&NewActivity::project_created(&project.name, member_id, &project.id))?;
            }

            Ok(project)
        })
    }

    pub fn delete_project(&self, id: &str) -> StoreResult<()> {
        let removed = self.conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(StoreError::NotFound(format!("project {id}")));
        }
        Ok(())
    }

    fn project_member_ids(&self, project_id: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT member_id FROM project_members WHERE project_id = ?1 ORDER BY member_id")?;
        let ids = stmt
            .query_map(params![project_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    // Issues

    pub fn list_issues(&self, filter: &IssueFilter) -> StoreResult<Vec<Issue>> {
        let mut clauses = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(project_id) = &filter.project_id {
            values.push(project_id.clone());
            clauses.push(format!("project_id = ?{}", values.len()));
        }
        if let Some(assignee_id) = &filter.assignee_id {
            values.push(assignee_id.clone());
            clauses.push(format!("assignee_id = ?{}", values.len()));
        }
        if let Some(status) = filter.status {
            values.push(status.as_str().to_string());
            clauses.push(format!("status = ?{}", values.len()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ISSUE_COLUMNS} FROM issues {where_sql} ORDER BY updated_at DESC, rowid DESC"
        ))?;
        let issues = stmt
            .query_map(params_from_iter(values.iter()), issue_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(issues)
    }

    pub fn get_issue(&self, id: &str) -> StoreResult<Option<Issue>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1"),
                params![id],
                issue_from_row,
            )
            .optional()?)
    }

    /// Issue plus its `issue_created` activity, committed together.
    pub fn create_issue_with_activity(&self, fields: &NewIssue, current_member: Option<&str>) -> StoreResult<Issue> {
        self.paired(|| {
            let issue = self.create_issue(fields)?;
            let member_id = current_member.unwrap_or(&fields.reporter_id);
            self.create_activity(&NewActivity::issue_created(
                &issue.title,
                member_id,
                &issue.project_id,
                &issue.id,
            ))?;
            Ok(issue)
        })
    }

    /// Kanban move. Records `status_changed` when an acting member is known.
    pub fn update_issue_status(
        &self,
        id: &str,
        status: IssueStatus,
        current_member: Option<&str>,
    ) -> StoreResult<Issue> {
        self.paired(|| {
            let changed = self.conn.execute(
                "UPDATE issues SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, status.as_str(), to_millis(Utc::now())],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("issue {id}")));
            }

            let issue = self
                .get_issue(id)?
                .ok_or_else(|| StoreError::NotFound(format!("issue {id}")))?;

            if let Some(member_id) = current_member {
                self.create_activity(&NewActivity::status_changed(
                    &issue.title,
                    member_id,
                    &issue.project_id,
                    &issue.id,
                ))?;
            }
            Ok(issue)
        })
    }

    pub fn delete_issue(&self, id: &str) -> StoreResult<()> {
        let removed = self.conn.execute("DELETE FROM issues WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(StoreError::NotFound(format!("issue {id}")));
        }
        Ok(())
    }

    // Activities

    pub fn list_activities(&self, filter: &ActivityFilter) -> StoreResult<Vec<Activity>> {
        let (where_sql, value) = match (&filter.project_id, &filter.member_id) {
            (Some(project_id), _) => ("WHERE project_id = ?1", Some(project_id.clone())),
            (None, Some(member_id)) => ("WHERE member_id = ?1", Some(member_id.clone())),
            (None, None) => ("", None),
        };
        // SQLite treats a negative LIMIT as unbounded.
        let limit = filter.limit.map(|l| l as i64).unwrap_or(-1);

        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities {where_sql} ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let activities = match value {
            Some(v) => stmt.query_map(params![v], activity_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt.query_map([], activity_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(activities)
    }
}

impl IssueStore for Database {
    fn find_all_issues(&self) -> StoreResult<Vec<Issue>> {
        self.list_issues(&IssueFilter::default())
    }

    fn create_issue(&self, fields: &NewIssue) -> StoreResult<Issue> {
        if fields.title.trim().is_empty() {
            return Err(StoreError::Invalid("title is required".to_string()));
        }

        let now = Utc::now();
        let issue = Issue {
            id: new_id(),
            project_id: fields.project_id.clone(),
            title: fields.title.clone(),
            description: fields.description.clone(),
            issue_type: fields.issue_type,
            status: fields.status,
            priority: fields.priority,
            assignee_id: fields.assignee_id.clone().filter(|id| !id.is_empty()),
            reporter_id: fields.reporter_id.clone(),
            due_date: fields.due_date,
            tags: fields.tags.clone(),
            ims_number: fields.ims_number.clone().filter(|n| !n.is_empty()),
            created_at: now,
            updated_at: now,
        };
        let tags_json = serde_json::to_string(&issue.tags)?;

        self.conn.execute(
            "INSERT INTO issues (id, project_id, title, description, type, status, priority, assignee_id, reporter_id, due_date, tags, ims_number, created_at, updated_at) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)",
            params![
                &issue.id,
                &issue.project_id,
                &issue.title,
                &issue.description,
                issue.issue_type.as_str(),
                issue.status.as_str(),
                issue.priority.as_str(),
                issue.assignee_id.as_deref(),
                &issue.reporter_id,
                issue.due_date.map(to_millis),
                tags_json,
                issue.ims_number.as_deref(),
                to_millis(issue.created_at),
                to_millis(issue.updated_at),
            ],
        )?;

        Ok(issue)
    }
}

impl ActivityStore for Database {
    fn create_activity(&self, fields: &NewActivity) -> StoreResult<Activity> {
        let activity = Activity {
            id: new_id(),
            kind: fields.kind,
            description: fields.description.clone(),
            member_id: fields.member_id.clone(),
            project_id: fields.project_id.clone(),
            issue_id: fields.issue_id.clone(),
            created_at: Utc::now(),
        };

        self.conn.execute(
            "INSERT INTO activities (id, type, description, member_id, project_id, issue_id, created_at) VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![
                &activity.id,
                activity.kind.as_str(),
                &activity.description,
                &activity.member_id,
                activity.project_id.as_deref(),
                activity.issue_id.as_deref(),
                to_millis(activity.created_at),
            ],
        )?;

        Ok(activity)
    }
}

impl ActivityFeed for Database {
    fn recent_activities(&self, limit: usize) -> StoreResult<Vec<Activity>> {
        self.list_activities(&ActivityFilter {
            limit: Some(limit),
            ..ActivityFilter::default()
        })
    }
}

impl PairedWrite for Database {
    fn paired<T, F>(&self, work: F) -> StoreResult<T>
    where
        F: FnOnce() -> StoreResult<T>,
    {
        // Dropping the transaction without commit rolls it back.
        let tx = self.conn.unchecked_transaction()?;
        let out = work()?;
        tx.commit()?;
        Ok(out)
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn issue_from_row(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let tags_str: String = row.get(10)?;
    let tags: Vec<String> = serde_json::from_str(&tags_str).unwrap_or_else(|e| {
        log::warn!("Ignoring unreadable tags on issue row: {e}");
        Vec::new()
    });

    Ok(Issue {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        issue_type: parse_column(row, 4)?,
        status: parse_column(row, 5)?,
        priority: parse_column(row, 6)?,
        assignee_id: row.get(7)?,
        reporter_id: row.get(8)?,
        due_date: row.get::<_, Option<i64>>(9)?.map(from_millis),
        tags,
        ims_number: row.get(11)?,
        created_at: from_millis(row.get(12)?),
        updated_at: from_millis(row.get(13)?),
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        kind: parse_column(row, 1)?,
        description: row.get(2)?,
        member_id: row.get(3)?,
        project_id: row.get(4)?,
        issue_id: row.get(5)?,
        created_at: from_millis(row.get(6)?),
    })
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        name: row.get(1)?,
        name_ja: row.get(2)?,
        email: row.get(3)?,
        avatar: row.get(4)?,
        role: row.get(5)?,
        department: row.get(6)?,
        created_at: from_millis(row.get(7)?),
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        priority: parse_column(row, 4)?,
        start_date: from_millis(row.get(5)?),
        due_date: from_millis(row.get(6)?),
        customer: row.get(7)?,
        member_ids: Vec::new(),
        created_at: from_millis(row.get(8)?),
        updated_at: from_millis(row.get(9)?),
    })
}
