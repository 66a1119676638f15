//! In-memory store implementation.
//!
//! This implementation is suitable for:
//! - Tests (no external services)
//! - Local development (`STORE_BACKEND=memory`)
//!
//! State lives in the process and is lost on restart. A single `RwLock`
//! guards all of it, so every operation is atomic with respect to the others.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::board::{Board, Invitation, InvitationStatus, Member};
use crate::models::ticket::{Comment, Ticket, TicketFilter};
use crate::models::user::{normalize_email, CreateUser, User};

struct BoardEntry {
    board: Board,
    ticket_counter: i64,
    seq: u64,
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    boards: HashMap<Uuid, BoardEntry>,
    tickets: HashMap<Uuid, Ticket>,
    next_seq: u64,
}

/// Process-local store
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        let email = normalize_email(&data.email);

        if state.users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash: data.password_hash,
            name: data.name,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }

    async fn insert_board(&self, board: &Board) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.boards.contains_key(&board.id) {
            return Err(StoreError::Conflict("boards_pkey".to_string()));
        }

        state.next_seq += 1;
        let seq = state.next_seq;
        state.boards.insert(
            board.id,
            BoardEntry {
                board: board.clone(),
                ticket_counter: 0,
                seq,
            },
        );
        Ok(())
    }

    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>> {
        Ok(self.state.read().await.boards.get(&id).map(|e| e.board.clone()))
    }

    async fn list_boards_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Board>> {
        let state = self.state.read().await;
        let mut entries: Vec<&BoardEntry> = state
            .boards
            .values()
            .filter(|e| e.board.is_member(user_id))
            .collect();
        entries.sort_by(|a, b| {
            b.board
                .created_at
                .cmp(&a.board.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(entries.into_iter().map(|e| e.board.clone()).collect())
    }

    async fn add_invitation(&self, board_id: Uuid, invitation: &Invitation) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let entry = state.boards.get_mut(&board_id).ok_or(StoreError::NotFound)?;

        if entry.board.pending_invitation_for(&invitation.email).is_some() {
            return Err(StoreError::Conflict(
                "board_invitations_pending_email_key".to_string(),
            ));
        }

        entry.board.invitations.push(invitation.clone());
        entry.board.updated_at = Utc::now();
        Ok(())
    }

    async fn accept_invitation(
        &self,
        board_id: Uuid,
        invitation_id: Uuid,
        member: &Member,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let board = &mut state
            .boards
            .get_mut(&board_id)
            .ok_or(StoreError::NotFound)?
            .board;

        let idx = board
            .invitations
            .iter()
            .position(|inv| inv.id == invitation_id && inv.is_pending())
            .ok_or(StoreError::NotFound)?;

        if board.members.iter().any(|m| m.user_id == member.user_id) {
            return Err(StoreError::Conflict("board_members_pkey".to_string()));
        }

        let now = Utc::now();
        let invitation = &mut board.invitations[idx];
        invitation.status = InvitationStatus::Accepted;
        invitation.responded_at = Some(now);
        board.members.push(member.clone());
        board.updated_at = now;
        Ok(())
    }

    async fn next_ticket_number(&self, board_id: Uuid) -> StoreResult<i64> {
        let mut state = self.state.write().await;
        let entry = state.boards.get_mut(&board_id).ok_or(StoreError::NotFound)?;
        entry.ticket_counter += 1;
        Ok(entry.ticket_counter)
    }

    async fn insert_ticket(&self, ticket: &Ticket) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.boards.contains_key(&ticket.board_id) {
            return Err(StoreError::NotFound);
        }

        let duplicate = state.tickets.values().any(|t| {
            t.id == ticket.id
                || (t.board_id == ticket.board_id && t.ticket_number == ticket.ticket_number)
        });
        if duplicate {
            return Err(StoreError::Conflict(
                "tickets_board_id_ticket_number_key".to_string(),
            ));
        }

        state.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn find_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        Ok(self.state.read().await.tickets.get(&id).cloned())
    }

    async fn find_tickets_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Ticket>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.tickets.get(id).cloned())
            .collect())
    }

    async fn list_tickets(
        &self,
        board_id: Uuid,
        filter: &TicketFilter,
    ) -> StoreResult<Vec<Ticket>> {
        let state = self.state.read().await;
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| t.board_id == board_id && filter.matches(t))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.ticket_number.cmp(&a.ticket_number))
        });
        Ok(tickets)
    }

    async fn save_ticket(&self, ticket: &Ticket) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let stored = state.tickets.get_mut(&ticket.id).ok_or(StoreError::NotFound)?;

        stored.title = ticket.title.clone();
        stored.description = ticket.description.clone();
        stored.assigned_to = ticket.assigned_to;
        stored.status = ticket.status;
        stored.priority = ticket.priority;
        stored.due_date = ticket.due_date;
        stored.tags = ticket.tags.clone();
        stored.blockers = ticket.blockers.clone();
        stored.updated_at = ticket.updated_at;
        Ok(())
    }

    async fn append_comment(&self, ticket_id: Uuid, comment: &Comment) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let ticket = state.tickets.get_mut(&ticket_id).ok_or(StoreError::NotFound)?;
        ticket.comments.push(comment.clone());
        ticket.updated_at = comment.created_at;
        Ok(())
    }

    async fn delete_ticket(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.tickets.remove(&id).is_none() {
            return Ok(false);
        }

        for ticket in state.tickets.values_mut() {
            ticket.blockers.retain(|b| *b != id);
        }
        Ok(true)
    }
}
