/// Response shapes with references resolved
///
/// Stored aggregates reference users and tickets by id. Views replace those
/// ids with short summaries so clients can render a board or a ticket from a
/// single response. A reference whose target no longer exists resolves to
/// `None` (users) or is omitted (blockers).

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::board::{Board, BoardSummary, EffectiveRole, Invitation, MemberRole};
use super::ticket::{Priority, Ticket, TicketStatus};
use super::user::UserSummary;

/// Users resolved by id
pub type UserIndex = HashMap<Uuid, UserSummary>;

#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub user: Option<UserSummary>,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub ticket_prefix: String,
    pub owner: Option<UserSummary>,
    pub owner_id: Uuid,
    pub members: Vec<MemberView>,
    pub invitations: Vec<Invitation>,

    /// Role of the user the view was built for
    pub my_role: Option<EffectiveRole>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoardView {
    pub fn build(board: Board, viewer: Uuid, users: &UserIndex) -> Self {
        let my_role = board.effective_role(viewer);
        let members = board
            .members
            .into_iter()
            .map(|m| MemberView {
                user: users.get(&m.user_id).cloned(),
                user_id: m.user_id,
                role: m.role,
                joined_at: m.joined_at,
            })
            .collect();

        Self {
            id: board.id,
            name: board.name,
            description: board.description,
            ticket_prefix: board.ticket_prefix,
            owner: users.get(&board.owner_id).cloned(),
            owner_id: board.owner_id,
            members,
            invitations: board.invitations,
            my_role,
            created_at: board.created_at,
            updated_at: board.updated_at,
        }
    }
}

/// Short form of a blocking ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockerSummary {
    pub id: Uuid,
    pub ticket_key: String,
    pub title: String,
    pub status: TicketStatus,
}

impl From<&Ticket> for BlockerSummary {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id,
            ticket_key: ticket.ticket_key.clone(),
            title: ticket.title.clone(),
            status: ticket.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub author: Option<UserSummary>,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    pub id: Uuid,
    pub ticket_key: String,
    pub board: BoardSummary,
    pub title: String,
    pub description: String,
    pub created_by: Option<UserSummary>,
    pub assigned_to: Option<UserSummary>,
    pub status: TicketStatus,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub blockers: Vec<BlockerSummary>,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketView {
    /// Builds a ticket view
    ///
    /// `blockers` holds the blocking tickets that still exist; blocker ids
    /// without a match are left out. Order follows `ticket.blockers`.
    pub fn build(
        ticket: Ticket,
        board: BoardSummary,
        users: &UserIndex,
        blockers: &[Ticket],
    ) -> Self {
        let blockers = ticket
            .blockers
            .iter()
            .filter_map(|id| blockers.iter().find(|b| b.id == *id))
            .map(BlockerSummary::from)
            .collect();

        let comments = ticket
            .comments
            .into_iter()
            .map(|c| CommentView {
                id: c.id,
                author: users.get(&c.author_id).cloned(),
                author_id: c.author_id,
                text: c.text,
                created_at: c.created_at,
            })
            .collect();

        Self {
            id: ticket.id,
            ticket_key: ticket.ticket_key,
            board,
            title: ticket.title,
            description: ticket.description,
            created_by: users.get(&ticket.created_by).cloned(),
            assigned_to: ticket.assigned_to.and_then(|id| users.get(&id).cloned()),
            status: ticket.status,
            priority: ticket.priority,
            due_date: ticket.due_date,
            tags: ticket.tags,
            blockers,
            comments,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }

    /// User ids a view of `ticket` needs resolved
    pub fn referenced_users(ticket: &Ticket) -> Vec<Uuid> {
        let mut ids = vec![ticket.created_by];
        ids.extend(ticket.assigned_to);
        ids.extend(ticket.comments.iter().map(|c| c.author_id));
        ids.sort();
        ids.dedup();
        ids
    }
}
