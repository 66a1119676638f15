/// Board aggregate: metadata, member list and invitation list
///
/// A board is owned by exactly one user. The owner is implicitly a full member
/// and never appears in (nor can be removed through) the member list. The
/// member list and the invitation list have no lifecycle of their own; they
/// are mutated only through invitation acceptance.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id UUID PRIMARY KEY,
///     name TEXT NOT NULL,
///     description TEXT,
///     owner_id UUID NOT NULL REFERENCES users(id),
///     ticket_prefix TEXT NOT NULL,
///     ticket_counter BIGINT NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE board_members (
///     seq BIGSERIAL,
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role TEXT NOT NULL DEFAULT 'member' CHECK (role IN ('member', 'admin')),
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (board_id, user_id)
/// );
///
/// CREATE TABLE board_invitations (
///     seq BIGSERIAL,
///     id UUID PRIMARY KEY,
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     email TEXT NOT NULL,
///     invited_by UUID NOT NULL REFERENCES users(id),
///     status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'accepted', 'declined')),
///     invited_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     responded_at TIMESTAMPTZ
/// );
///
/// CREATE UNIQUE INDEX board_invitations_pending_email_key
///     ON board_invitations (board_id, LOWER(email))
///     WHERE status = 'pending';
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::normalize_email;

/// Maximum length of a derived ticket prefix
pub const MAX_PREFIX_LEN: usize = 10;

/// Prefix used when a board name has no usable characters
pub const FALLBACK_PREFIX: &str = "BOARD";

/// Role held by an entry of a board's member list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Member,
    Admin,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "member" => Some(MemberRole::Member),
            "admin" => Some(MemberRole::Admin),
            _ => None,
        }
    }
}

/// A caller's standing on a board, folding ownership and the member list
///
/// Hierarchy: Owner > Admin > Member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveRole {
    /// Board owner (implicit full member)
    Owner,

    /// Member-list entry with the admin role
    Admin,

    /// Member-list entry with the member role
    Member,
}

impl EffectiveRole {
    /// Whether this role satisfies admin-only capabilities
    pub fn is_admin(&self) -> bool {
        matches!(self, EffectiveRole::Owner | EffectiveRole::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectiveRole::Owner => "owner",
            EffectiveRole::Admin => "admin",
            EffectiveRole::Member => "member",
        }
    }
}

impl From<MemberRole> for EffectiveRole {
    fn from(role: MemberRole) -> Self {
        match role {
            MemberRole::Member => EffectiveRole::Member,
            MemberRole::Admin => EffectiveRole::Admin,
        }
    }
}

/// Entry of a board's member list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// Invitation status
///
/// `pending → accepted` is one-way. `Declined` is reserved: it is part of the
/// stored vocabulary but no operation sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvitationStatus::Pending),
            "accepted" => Some(InvitationStatus::Accepted),
            "declined" => Some(InvitationStatus::Declined),
            _ => None,
        }
    }
}

/// Offer of membership to an email address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,

    /// Invited address, normalized; not necessarily a registered user
    pub email: String,

    pub invited_by: Uuid,
    pub invited_at: DateTime<Utc>,
    pub status: InvitationStatus,

    /// Set when the invitation leaves `pending`
    pub responded_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Creates a pending invitation
    pub fn pending(email: &str, invited_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            invited_by,
            invited_at: Utc::now(),
            status: InvitationStatus::Pending,
            responded_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }
}

/// Board aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,

    /// `BOARD_PREFIX` of ticket identifiers, fixed at creation
    pub ticket_prefix: String,

    /// Ordered member list (owner excluded)
    pub members: Vec<Member>,

    /// Ordered invitation list
    pub invitations: Vec<Invitation>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBoard {
    pub name: String,
    pub description: Option<String>,
}

impl Board {
    /// Builds a new board owned by `owner_id`, with empty member and invitation lists
    pub fn new(owner_id: Uuid, data: CreateBoard) -> Self {
        let now = Utc::now();
        let name = data.name.trim().to_string();
        let description = data
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Self {
            id: Uuid::new_v4(),
            ticket_prefix: derive_ticket_prefix(&name),
            name,
            description,
            owner_id,
            members: Vec::new(),
            invitations: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Resolves a user's standing on this board
    ///
    /// This is the single place ownership and the member list are folded
    /// together; every membership test goes through it.
    pub fn effective_role(&self, user_id: Uuid) -> Option<EffectiveRole> {
        if self.owner_id == user_id {
            return Some(EffectiveRole::Owner);
        }

        self.members
            .iter()
            .find(|m| m.user_id == user_id)
            .map(|m| EffectiveRole::from(m.role))
    }

    /// Owner or member-list entry
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.effective_role(user_id).is_some()
    }

    /// Role in the member sense; the owner reports `Admin`
    pub fn role_of(&self, user_id: Uuid) -> Option<MemberRole> {
        self.effective_role(user_id).map(|role| match role {
            EffectiveRole::Owner | EffectiveRole::Admin => MemberRole::Admin,
            EffectiveRole::Member => MemberRole::Member,
        })
    }

    /// Finds the pending invitation addressed to `email`, if any
    pub fn pending_invitation_for(&self, email: &str) -> Option<&Invitation> {
        let email = normalize_email(email);
        self.invitations
            .iter()
            .find(|inv| inv.is_pending() && inv.email == email)
    }

    /// Formats the identifier of the `number`-th ticket of this board
    pub fn ticket_key(&self, number: i64) -> String {
        format!("{}-{}", self.ticket_prefix, number)
    }

    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Resolved board reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: Uuid,
    pub name: String,
}

/// Derives the ticket prefix from a board name
///
/// Upper-cased ASCII alphanumerics of the name, at most [`MAX_PREFIX_LEN`]
/// characters, or [`FALLBACK_PREFIX`] when nothing is left.
///
/// ```
/// use tickettrack_shared::models::board::derive_ticket_prefix;
///
/// assert_eq!(derive_ticket_prefix("Sprint 1"), "SPRINT1");
/// assert_eq!(derive_ticket_prefix("¿?"), "BOARD");
/// ```
pub fn derive_ticket_prefix(name: &str) -> String {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .take(MAX_PREFIX_LEN)
        .collect();

    if prefix.is_empty() {
        FALLBACK_PREFIX.to_string()
    } else {
        prefix
    }
}
