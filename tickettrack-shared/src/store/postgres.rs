/// PostgreSQL store
///
/// Relational layout of the board and ticket aggregates. Member, invitation
/// and comment tables carry a `seq BIGSERIAL` column that preserves insertion
/// order when the aggregates are reassembled.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tickettrack_shared::db::pool::{create_pool, DatabaseConfig};
/// use tickettrack_shared::store::{postgres::PgStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
///
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::board::{Board, Invitation, InvitationStatus, Member, MemberRole};
use crate::models::ticket::{Comment, Priority, Ticket, TicketFilter, TicketStatus};
use crate::models::user::{normalize_email, CreateUser, User, UserRole};

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn hydrate_boards(&self, rows: Vec<BoardRow>) -> StoreResult<Vec<Board>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let member_rows: Vec<MemberRow> = sqlx::query_as(
            "SELECT board_id, user_id, role, joined_at FROM board_members \
             WHERE board_id = ANY($1) ORDER BY seq",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let invitation_rows: Vec<InvitationRow> = sqlx::query_as(
            "SELECT id, board_id, email, invited_by, status, invited_at, responded_at \
             FROM board_invitations WHERE board_id = ANY($1) ORDER BY seq",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut members: HashMap<Uuid, Vec<Member>> = HashMap::new();
        for row in member_rows {
            members.entry(row.board_id).or_default().push(row.into_member()?);
        }

        let mut invitations: HashMap<Uuid, Vec<Invitation>> = HashMap::new();
        for row in invitation_rows {
            invitations
                .entry(row.board_id)
                .or_default()
                .push(row.into_invitation()?);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let members = members.remove(&row.id).unwrap_or_default();
                let invitations = invitations.remove(&row.id).unwrap_or_default();
                row.into_board(members, invitations)
            })
            .collect())
    }

    async fn hydrate_tickets(&self, rows: Vec<TicketRow>) -> StoreResult<Vec<Ticket>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let comment_rows: Vec<CommentRow> = sqlx::query_as(
            "SELECT id, ticket_id, author_id, text, created_at FROM ticket_comments \
             WHERE ticket_id = ANY($1) ORDER BY seq",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut comments: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for row in comment_rows {
            comments.entry(row.ticket_id).or_default().push(Comment {
                id: row.id,
                author_id: row.author_id,
                text: row.text,
                created_at: row.created_at,
            });
        }

        rows.into_iter()
            .map(|row| {
                let comments = comments.remove(&row.id).unwrap_or_default();
                row.into_ticket(comments)
            })
            .collect()
    }
}

/// Maps a foreign-key violation (missing parent row) to `NotFound`
fn missing_parent(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => StoreError::NotFound,
        _ => StoreError::from(err),
    }
}

fn corrupt(column: &str, value: &str) -> StoreError {
    StoreError::Backend(format!("unexpected {} value '{}'", column, value))
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            role: UserRole::from_str(&row.role).ok_or_else(|| corrupt("role", &row.role))?,
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct BoardRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    owner_id: Uuid,
    ticket_prefix: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BoardRow {
    fn into_board(self, members: Vec<Member>, invitations: Vec<Invitation>) -> Board {
        Board {
            id: self.id,
            name: self.name,
            description: self.description,
            owner_id: self.owner_id,
            ticket_prefix: self.ticket_prefix,
            members,
            invitations,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct MemberRow {
    board_id: Uuid,
    user_id: Uuid,
    role: String,
    joined_at: DateTime<Utc>,
}

impl MemberRow {
    fn into_member(self) -> StoreResult<Member> {
        Ok(Member {
            role: MemberRole::from_str(&self.role).ok_or_else(|| corrupt("role", &self.role))?,
            user_id: self.user_id,
            joined_at: self.joined_at,
        })
    }
}

#[derive(FromRow)]
struct InvitationRow {
    id: Uuid,
    board_id: Uuid,
    email: String,
    invited_by: Uuid,
    status: String,
    invited_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

impl InvitationRow {
    fn into_invitation(self) -> StoreResult<Invitation> {
        Ok(Invitation {
            status: InvitationStatus::from_str(&self.status)
                .ok_or_else(|| corrupt("status", &self.status))?,
            id: self.id,
            email: self.email,
            invited_by: self.invited_by,
            invited_at: self.invited_at,
            responded_at: self.responded_at,
        })
    }
}

#[derive(FromRow)]
struct TicketRow {
    id: Uuid,
    board_id: Uuid,
    ticket_number: i64,
    ticket_key: String,
    title: String,
    description: String,
    created_by: Uuid,
    assigned_to: Option<Uuid>,
    status: String,
    priority: String,
    due_date: Option<NaiveDate>,
    tags: Vec<String>,
    blockers: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TicketRow {
    fn into_ticket(self, comments: Vec<Comment>) -> StoreResult<Ticket> {
        Ok(Ticket {
            status: TicketStatus::from_str(&self.status)
                .ok_or_else(|| corrupt("status", &self.status))?,
            priority: Priority::from_str(&self.priority)
                .ok_or_else(|| corrupt("priority", &self.priority))?,
            id: self.id,
            board_id: self.board_id,
            ticket_number: self.ticket_number,
            ticket_key: self.ticket_key,
            title: self.title,
            description: self.description,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            due_date: self.due_date,
            tags: self.tags,
            blockers: self.blockers,
            comments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: Uuid,
    ticket_id: Uuid,
    author_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, email, password_hash, name, role, created_at, updated_at";
const BOARD_COLUMNS: &str = "id, name, description, owner_id, ticket_prefix, created_at, updated_at";
const TICKET_COLUMNS: &str = "id, board_id, ticket_number, ticket_key, title, description, \
     created_by, assigned_to, status, priority, due_date, tags, blockers, created_at, updated_at";

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (id, email, password_hash, name, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(normalize_email(&data.email))
        .bind(&data.password_hash)
        .bind(&data.name)
        .bind(data.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = $1",
            USER_COLUMNS
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn insert_board(&self, board: &Board) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO boards (id, name, description, owner_id, ticket_prefix, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(board.id)
        .bind(&board.name)
        .bind(&board.description)
        .bind(board.owner_id)
        .bind(&board.ticket_prefix)
        .bind(board.created_at)
        .bind(board.updated_at)
        .execute(&self.pool)
        .await
        .map_err(missing_parent)?;

        Ok(())
    }

    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>> {
        let row: Option<BoardRow> =
            sqlx::query_as(&format!("SELECT {} FROM boards WHERE id = $1", BOARD_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(self.hydrate_boards(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_boards_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Board>> {
        let rows: Vec<BoardRow> = sqlx::query_as(&format!(
            "SELECT {} FROM boards b \
             WHERE b.owner_id = $1 \
                OR EXISTS (SELECT 1 FROM board_members m WHERE m.board_id = b.id AND m.user_id = $1) \
             ORDER BY b.created_at DESC",
            BOARD_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_boards(rows).await
    }

    async fn add_invitation(&self, board_id: Uuid, invitation: &Invitation) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO board_invitations (id, board_id, email, invited_by, status, invited_at, responded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(invitation.id)
        .bind(board_id)
        .bind(&invitation.email)
        .bind(invitation.invited_by)
        .bind(invitation.status.as_str())
        .bind(invitation.invited_at)
        .bind(invitation.responded_at)
        .execute(&mut *tx)
        .await
        .map_err(missing_parent)?;

        sqlx::query("UPDATE boards SET updated_at = NOW() WHERE id = $1")
            .bind(board_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn accept_invitation(
        &self,
        board_id: Uuid,
        invitation_id: Uuid,
        member: &Member,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query(
            "UPDATE board_invitations SET status = 'accepted', responded_at = NOW() \
             WHERE id = $1 AND board_id = $2 AND status = 'pending'",
        )
        .bind(invitation_id)
        .bind(board_id)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        sqlx::query(
            "INSERT INTO board_members (board_id, user_id, role, joined_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(board_id)
        .bind(member.user_id)
        .bind(member.role.as_str())
        .bind(member.joined_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE boards SET updated_at = NOW() WHERE id = $1")
            .bind(board_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn next_ticket_number(&self, board_id: Uuid) -> StoreResult<i64> {
        let number: Option<i64> = sqlx::query_scalar(
            "UPDATE boards SET ticket_counter = ticket_counter + 1 WHERE id = $1 RETURNING ticket_counter",
        )
        .bind(board_id)
        .fetch_optional(&self.pool)
        .await?;

        number.ok_or(StoreError::NotFound)
    }

    async fn insert_ticket(&self, ticket: &Ticket) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO tickets ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
            TICKET_COLUMNS
        ))
        .bind(ticket.id)
        .bind(ticket.board_id)
        .bind(ticket.ticket_number)
        .bind(&ticket.ticket_key)
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.created_by)
        .bind(ticket.assigned_to)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.due_date)
        .bind(&ticket.tags)
        .bind(&ticket.blockers)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&self.pool)
        .await
        .map_err(missing_parent)?;

        Ok(())
    }

    async fn find_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        let row: Option<TicketRow> =
            sqlx::query_as(&format!("SELECT {} FROM tickets WHERE id = $1", TICKET_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(self.hydrate_tickets(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_tickets_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Ticket>> {
        let rows: Vec<TicketRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tickets WHERE id = ANY($1)",
            TICKET_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_tickets(rows).await
    }

    async fn list_tickets(
        &self,
        board_id: Uuid,
        filter: &TicketFilter,
    ) -> StoreResult<Vec<Ticket>> {
        let rows: Vec<TicketRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tickets \
             WHERE board_id = $1 \
               AND ($2::TEXT IS NULL OR status = $2) \
               AND ($3::UUID IS NULL OR assigned_to = $3) \
               AND ($4::UUID IS NULL OR created_by = $4) \
             ORDER BY created_at DESC, ticket_number DESC",
            TICKET_COLUMNS
        ))
        .bind(board_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.assigned_to)
        .bind(filter.created_by)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_tickets(rows).await
    }

    async fn save_ticket(&self, ticket: &Ticket) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE tickets SET title = $2, description = $3, assigned_to = $4, status = $5, \
                 priority = $6, due_date = $7, tags = $8, blockers = $9, updated_at = $10 \
             WHERE id = $1",
        )
        .bind(ticket.id)
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.assigned_to)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.due_date)
        .bind(&ticket.tags)
        .bind(&ticket.blockers)
        .bind(ticket.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn append_comment(&self, ticket_id: Uuid, comment: &Comment) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE tickets SET updated_at = $2 WHERE id = $1")
            .bind(ticket_id)
            .bind(comment.created_at)
            .execute(&mut *tx)
            .await?;

        if touched.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        sqlx::query(
            "INSERT INTO ticket_comments (id, ticket_id, author_id, text, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(comment.id)
        .bind(ticket_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .bind(comment.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_ticket(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE tickets SET blockers = array_remove(blockers, $1) WHERE $1 = ANY(blockers)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
