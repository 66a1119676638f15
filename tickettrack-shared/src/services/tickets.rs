/// Ticket lifecycle engine
///
/// Operations take the [`BoardContext`] produced by the access gate, so the
/// board they work on has already been resolved and the caller's membership
/// checked.
///
/// # Identifiers
///
/// `create` draws the next value of the board's ticket counter from the store
/// (an atomic increment-and-read) and formats it as `<PREFIX>-<n>`. Numbers
/// are never reused, even after deletion.
///
/// # Example
///
/// ```no_run
/// use tickettrack_shared::auth::authorization::{authorize, Capability};
/// use tickettrack_shared::models::ticket::{CreateTicket, TicketStatus};
/// use tickettrack_shared::services::tickets;
/// use tickettrack_shared::store::memory::MemoryStore;
/// # use tickettrack_shared::models::user::User;
///
/// # async fn example(user: User, board_id: uuid::Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let ctx = authorize(&store, &user, board_id, Capability::Write).await?;
///
/// let ticket = tickets::create(&store, &ctx, &user, CreateTicket {
///     title: "Fix login".to_string(),
///     description: "Users cannot sign in".to_string(),
///     ..Default::default()
/// }).await?;
///
/// tickets::transition_status(&store, &ctx, ticket, TicketStatus::Completed).await?;
/// # Ok(())
/// # }
/// ```

use chrono::Utc;
use uuid::Uuid;

use crate::auth::authorization::{authorize, check_capability, BoardContext, Capability};
use crate::error::{DomainError, DomainResult};
use crate::models::board::Board;
use crate::models::ticket::{
    dedup_ids, normalize_tags, Comment, CreateTicket, Ticket, TicketFilter, TicketPatch,
    TicketStatus,
};
use crate::models::user::User;
use crate::models::view::{TicketView, UserIndex};
use crate::store::Store;

/// Maximum title length, in characters
pub const MAX_TITLE_LEN: usize = 200;

fn required_text(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn validate_title(title: &str) -> DomainResult<String> {
    let title = required_text("Title", title)?;
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::InvalidInput(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title)
}

/// The assignee must be an existing user who is a member of the board
async fn validate_assignee(store: &dyn Store, board: &Board, assignee: Uuid) -> DomainResult<()> {
    let exists = store.find_user_by_id(assignee).await?.is_some();

    if !exists || !board.is_member(assignee) {
        tracing::debug!(board_id = %board.id, assignee = %assignee, "Rejected assignee");
        return Err(DomainError::InvalidAssignee(assignee));
    }
    Ok(())
}

/// Blockers must be distinct tickets of the same board, other than `ticket_id`
async fn validate_blockers(
    store: &dyn Store,
    board: &Board,
    ticket_id: Option<Uuid>,
    blockers: Vec<Uuid>,
) -> DomainResult<Vec<Uuid>> {
    let blockers = dedup_ids(blockers);
    if blockers.is_empty() {
        return Ok(blockers);
    }

    if ticket_id.map_or(false, |id| blockers.contains(&id)) {
        return Err(DomainError::InvalidInput(
            "A ticket cannot block itself".to_string(),
        ));
    }

    let found = store.find_tickets_by_ids(&blockers).await?;
    for id in &blockers {
        let on_board = found.iter().any(|t| t.id == *id && t.board_id == board.id);
        if !on_board {
            return Err(DomainError::InvalidInput(format!(
                "Blocker {} is not a ticket on this board",
                id
            )));
        }
    }

    Ok(blockers)
}

/// Creates a ticket on the board in `ctx`
///
/// # Errors
///
/// - `InvalidInput` if title or description is blank, or a blocker is invalid
/// - `InvalidAssignee` if the assignee is unknown or not a board member
pub async fn create(
    store: &dyn Store,
    ctx: &BoardContext,
    creator: &User,
    data: CreateTicket,
) -> DomainResult<Ticket> {
    let board = &ctx.board;

    let title = validate_title(&data.title)?;
    let description = required_text("Description", &data.description)?;

    if let Some(assignee) = data.assigned_to {
        validate_assignee(store, board, assignee).await?;
    }

    let blockers = validate_blockers(store, board, None, data.blockers).await?;

    let ticket_number = store.next_ticket_number(board.id).await?;
    let now = Utc::now();

    let ticket = Ticket {
        id: Uuid::new_v4(),
        board_id: board.id,
        ticket_number,
        ticket_key: board.ticket_key(ticket_number),
        title,
        description,
        created_by: creator.id,
        assigned_to: data.assigned_to,
        status: data.status.unwrap_or_default(),
        priority: data.priority.unwrap_or_default(),
        due_date: data.due_date,
        tags: normalize_tags(data.tags),
        blockers,
        comments: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    store.insert_ticket(&ticket).await?;

    tracing::info!(
        board_id = %board.id,
        ticket_id = %ticket.id,
        ticket_key = %ticket.ticket_key,
        user_id = %creator.id,
        "Ticket created"
    );

    Ok(ticket)
}

/// Applies a partial update
///
/// Only fields present in `patch` change. `tags` and `blockers` are replaced
/// wholesale and an explicit `null` empties them; `assigned_to` and
/// `due_date` are cleared by an explicit `null`.
pub async fn update(
    store: &dyn Store,
    ctx: &BoardContext,
    mut ticket: Ticket,
    patch: TicketPatch,
) -> DomainResult<Ticket> {
    let board = &ctx.board;

    if let Some(title) = patch.title {
        ticket.title = validate_title(&title)?;
    }

    if let Some(description) = patch.description {
        ticket.description = required_text("Description", &description)?;
    }

    if let Some(assigned_to) = patch.assigned_to {
        if let Some(assignee) = assigned_to {
            validate_assignee(store, board, assignee).await?;
        }
        ticket.assigned_to = assigned_to;
    }

    if let Some(status) = patch.status {
        if ticket.status != status {
            tracing::info!(
                ticket_id = %ticket.id,
                ticket_key = %ticket.ticket_key,
                from = ticket.status.as_str(),
                to = status.as_str(),
                "Ticket status changed"
            );
        }
        ticket.status = status;
    }

    if let Some(priority) = patch.priority {
        ticket.priority = priority;
    }

    if let Some(due_date) = patch.due_date {
        ticket.due_date = due_date;
    }

    if let Some(tags) = patch.tags {
        ticket.tags = normalize_tags(tags.unwrap_or_default());
    }

    if let Some(blockers) = patch.blockers {
        ticket.blockers =
            validate_blockers(store, board, Some(ticket.id), blockers.unwrap_or_default()).await?;
    }

    ticket.updated_at = Utc::now();
    store.save_ticket(&ticket).await?;

    tracing::info!(board_id = %board.id, ticket_id = %ticket.id, "Ticket updated");

    Ok(ticket)
}

/// Moves a ticket to another column
///
/// Every status is reachable from every status; moving to the current status
/// is accepted.
pub async fn transition_status(
    store: &dyn Store,
    ctx: &BoardContext,
    ticket: Ticket,
    status: TicketStatus,
) -> DomainResult<Ticket> {
    update(store, ctx, ticket, TicketPatch::status(status)).await
}

/// Appends a comment
///
/// # Errors
///
/// `InvalidInput` if the text is blank
pub async fn add_comment(
    store: &dyn Store,
    ticket: &Ticket,
    author: &User,
    text: &str,
) -> DomainResult<Comment> {
    required_text("Comment text", text)?;

    let comment = Comment::new(author.id, text);
    store.append_comment(ticket.id, &comment).await?;

    tracing::info!(
        ticket_id = %ticket.id,
        user_id = %author.id,
        comment_id = %comment.id,
        "Comment added"
    );

    Ok(comment)
}

/// Deletes a ticket
///
/// Allowed for the creator and for anyone holding the admin-delete
/// capability. References from other tickets' blocker lists are removed in
/// the same unit of work.
///
/// # Errors
///
/// `Forbidden` for any other requester
pub async fn delete(
    store: &dyn Store,
    ctx: &BoardContext,
    ticket: &Ticket,
    requester: &User,
) -> DomainResult<()> {
    if ticket.created_by != requester.id {
        check_capability(&ctx.board, requester, Capability::AdminDelete).map_err(|_| {
            tracing::warn!(
                ticket_id = %ticket.id,
                user_id = %requester.id,
                "Ticket deletion denied"
            );
            DomainError::Forbidden(
                "Only the creator or a board admin can delete this ticket".to_string(),
            )
        })?;
    }

    if !store.delete_ticket(ticket.id).await? {
        return Err(DomainError::NotFound("Ticket not found".to_string()));
    }

    tracing::info!(
        board_id = %ticket.board_id,
        ticket_id = %ticket.id,
        ticket_key = %ticket.ticket_key,
        user_id = %requester.id,
        "Ticket deleted"
    );

    Ok(())
}

/// Board tickets matching `filter`, newest first
pub async fn list_by_board(
    store: &dyn Store,
    ctx: &BoardContext,
    filter: &TicketFilter,
) -> DomainResult<Vec<Ticket>> {
    Ok(store.list_tickets(ctx.board.id, filter).await?)
}

/// Loads a ticket and authorizes `capability` on its board
///
/// # Errors
///
/// `NotFound` if the ticket is absent, then the gate's errors
pub async fn load(
    store: &dyn Store,
    user: &User,
    ticket_id: Uuid,
    capability: Capability,
) -> DomainResult<(Ticket, BoardContext)> {
    let ticket = store
        .find_ticket(ticket_id)
        .await?
        .ok_or_else(|| DomainError::NotFound("Ticket not found".to_string()))?;

    let ctx = authorize(store, user, ticket.board_id, capability).await?;
    Ok((ticket, ctx))
}

/// Resolves the references of several tickets of one board
pub async fn ticket_views(
    store: &dyn Store,
    board: &Board,
    tickets: Vec<Ticket>,
) -> DomainResult<Vec<TicketView>> {
    let mut user_ids: Vec<Uuid> = tickets.iter().flat_map(TicketView::referenced_users).collect();
    user_ids.sort();
    user_ids.dedup();

    let mut blocker_ids: Vec<Uuid> = tickets.iter().flat_map(|t| t.blockers.clone()).collect();
    blocker_ids.sort();
    blocker_ids.dedup();

    let users: UserIndex = store
        .find_users_by_ids(&user_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.summary()))
        .collect();

    let blockers = if blocker_ids.is_empty() {
        Vec::new()
    } else {
        store.find_tickets_by_ids(&blocker_ids).await?
    };

    Ok(tickets
        .into_iter()
        .map(|t| TicketView::build(t, board.summary(), &users, &blockers))
        .collect())
}

pub async fn ticket_view(store: &dyn Store, board: &Board, ticket: Ticket) -> DomainResult<TicketView> {
    ticket_views(store, board, vec![ticket])
        .await?
        .pop()
        .ok_or_else(|| DomainError::Store("Ticket view could not be built".to_string()))
}
