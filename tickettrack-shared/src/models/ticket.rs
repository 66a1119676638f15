/// Ticket model
///
/// A ticket is a unit of work on a board. It carries a human-readable
/// identifier (`<PREFIX>-<n>`) assigned once at creation, workflow status,
/// priority, an optional assignee and due date, free-text tags, references to
/// blocking tickets, and an append-only comment thread.
///
/// # Status
///
/// ```text
/// in process ⇄ ready ⇄ completed
///      ↖_______________↙
/// ```
///
/// Every status is reachable from every other status (and from itself).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tickets (
///     id UUID PRIMARY KEY,
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     ticket_number BIGINT NOT NULL,
///     ticket_key TEXT NOT NULL,
///     title TEXT NOT NULL,
///     description TEXT NOT NULL,
///     created_by UUID NOT NULL REFERENCES users(id),
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     status TEXT NOT NULL DEFAULT 'in process' CHECK (status IN ('in process', 'ready', 'completed')),
///     priority TEXT NOT NULL DEFAULT 'medium' CHECK (priority IN ('low', 'medium', 'high', 'urgent')),
///     due_date DATE,
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     blockers UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT tickets_board_id_ticket_number_key UNIQUE (board_id, ticket_number)
/// );
///
/// CREATE TABLE ticket_comments (
///     seq BIGSERIAL,
///     id UUID PRIMARY KEY,
///     ticket_id UUID NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
///     author_id UUID NOT NULL REFERENCES users(id),
///     text TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Workflow column of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TicketStatus {
    #[default]
    #[serde(rename = "in process")]
    InProcess,

    #[serde(rename = "ready")]
    Ready,

    #[serde(rename = "completed")]
    Completed,
}

impl TicketStatus {
    /// All statuses in column order
    pub const ALL: [TicketStatus; 3] = [
        TicketStatus::InProcess,
        TicketStatus::Ready,
        TicketStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::InProcess => "in process",
            TicketStatus::Ready => "ready",
            TicketStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in process" => Some(TicketStatus::InProcess),
            "ready" => Some(TicketStatus::Ready),
            "completed" => Some(TicketStatus::Completed),
            _ => None,
        }
    }
}

/// Ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

/// Entry of a ticket's comment thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author_id: Uuid, text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            text: text.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Ticket aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,

    /// Owning board, immutable after creation
    pub board_id: Uuid,

    /// Per-board sequence number
    pub ticket_number: i64,

    /// Human-readable identifier (`SPRINT1-3`)
    pub ticket_key: String,

    pub title: String,
    pub description: String,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub status: TicketStatus,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub blockers: Vec<Uuid>,

    /// Append-only, oldest first
    pub comments: Vec<Comment>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a ticket
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTicket {
    pub title: String,
    pub description: String,
    pub assigned_to: Option<Uuid>,
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub blockers: Vec<Uuid>,
}

/// Partial update of a ticket's mutable fields
///
/// Absent fields are left untouched. `assigned_to` and `due_date`
/// distinguish an absent key (`None`) from an explicit `null`
/// (`Some(None)`, which clears the field). `tags` and `blockers` replace the
/// stored lists wholesale; an explicit `null` clears them like `[]`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TicketPatch {
    pub title: Option<String>,
    pub description: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,

    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub tags: Option<Option<Vec<String>>>,

    #[serde(default, deserialize_with = "double_option")]
    pub blockers: Option<Option<Vec<Uuid>>>,
}

impl TicketPatch {
    /// Patch that only moves the ticket to another column
    pub fn status(status: TicketStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Equality filters for listing a board's tickets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.status.map_or(true, |s| ticket.status == s)
            && self.assigned_to.map_or(true, |a| ticket.assigned_to == Some(a))
            && self.created_by.map_or(true, |c| ticket.created_by == c)
    }
}

/// Trims tags, drops empty ones and removes duplicates keeping the first occurrence
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Removes duplicate ids keeping the first occurrence
pub fn dedup_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
