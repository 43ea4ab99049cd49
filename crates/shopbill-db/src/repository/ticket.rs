//! # Ticket Repository
//!
//! Support tickets raised by owners and answered by admins. Attachments are
//! references to externally stored files.

use chrono::Utc;
use shopbill_core::directory::{
    NewTicket, Ticket, TicketFeedback, TicketStatus, TicketWithAttachments,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Who is asking: owners see their own tickets, admins see all.
#[derive(Debug, Clone, Copy)]
pub struct Viewer<'a> {
    pub user_id: &'a str,
    pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

impl TicketRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TicketRepository { pool }
    }

    pub async fn create(&self, owner_id: &str, mut input: NewTicket) -> DbResult<TicketWithAttachments> {
        input.validate()?;
        let now = Utc::now();

        let ticket = Ticket {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            subject: input.subject,
            description: input.description,
            status: TicketStatus::Open,
            priority: input.priority,
            admin_feedback: None,
            feedback_date: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tickets (
                id, owner_id, subject, description, status, priority,
                admin_feedback, feedback_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&ticket.id)
        .bind(&ticket.owner_id)
        .bind(&ticket.subject)
        .bind(&ticket.description)
        .bind(ticket.status)
        .bind(ticket.priority)
        .bind(&ticket.admin_feedback)
        .bind(ticket.feedback_date)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&mut *tx)
        .await?;

        for file_ref in &input.attachments {
            sqlx::query(
                "INSERT INTO ticket_attachments (id, ticket_id, file_ref, uploaded_at) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&ticket.id)
            .bind(file_ref.trim())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(id = %ticket.id, priority = ticket.priority, "Ticket opened");
        let attachments = input.attachments.iter().map(|a| a.trim().to_string()).collect();
        Ok(TicketWithAttachments { ticket, attachments })
    }

    /// Newest first.
    pub async fn list(&self, viewer: Viewer<'_>) -> DbResult<Vec<TicketWithAttachments>> {
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE ?1 OR owner_id = ?2 ORDER BY created_at DESC",
        )
        .bind(viewer.is_admin)
        .bind(viewer.user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        let mut result = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let attachments = attachments(&mut conn, &ticket.id).await?;
            result.push(TicketWithAttachments { ticket, attachments });
        }
        Ok(result)
    }

    pub async fn get(&self, viewer: Viewer<'_>, id: &str) -> DbResult<TicketWithAttachments> {
        let mut conn = self.pool.acquire().await?;
        let ticket = fetch(&mut conn, id)
            .await?
            .filter(|t| viewer.is_admin || t.owner_id == viewer.user_id)
            .ok_or_else(|| DbError::not_found("Ticket", id))?;

        let attachments = attachments(&mut conn, id).await?;
        Ok(TicketWithAttachments { ticket, attachments })
    }

    /// Records an admin's answer. Caller checks admin rights.
    pub async fn provide_feedback(
        &self,
        id: &str,
        feedback: TicketFeedback,
    ) -> DbResult<TicketWithAttachments> {
        let mut conn = self.pool.acquire().await?;
        let mut ticket = fetch(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Ticket", id))?;

        feedback.apply(&mut ticket, Utc::now())?;

        sqlx::query(
            r#"
            UPDATE tickets SET
                status = ?2, admin_feedback = ?3, feedback_date = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(ticket.status)
        .bind(&ticket.admin_feedback)
        .bind(ticket.feedback_date)
        .bind(ticket.updated_at)
        .execute(&mut *conn)
        .await?;

        debug!(id = %id, status = ?ticket.status, "Ticket feedback recorded");
        let attachments = attachments(&mut conn, id).await?;
        Ok(TicketWithAttachments { ticket, attachments })
    }
}

async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Ticket>> {
    let ticket = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(ticket)
}

async fn attachments(conn: &mut SqliteConnection, ticket_id: &str) -> DbResult<Vec<String>> {
    let refs = sqlx::query_scalar(
        "SELECT file_ref FROM ticket_attachments WHERE ticket_id = ?1 ORDER BY uploaded_at, rowid",
    )
    .bind(ticket_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing;

    fn new_ticket() -> NewTicket {
        NewTicket {
            subject: "Printer".to_string(),
            description: "Invoices do not print".to_string(),
            priority: 4,
            attachments: vec!["uploads/err.png".to_string(), " ".to_string()],
        }
    }

    #[tokio::test]
    async fn test_visibility() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let other = testing::owner(&db, "other@shop.in").await;

        let t = db.tickets().create(&owner, new_ticket()).await.unwrap();
        assert_eq!(t.attachments, vec!["uploads/err.png"]);

        let as_owner = Viewer { user_id: &owner, is_admin: false };
        let as_other = Viewer { user_id: &other, is_admin: false };
        let as_admin = Viewer { user_id: &other, is_admin: true };

        assert_eq!(db.tickets().list(as_owner).await.unwrap().len(), 1);
        assert!(db.tickets().list(as_other).await.unwrap().is_empty());
        assert_eq!(db.tickets().list(as_admin).await.unwrap().len(), 1);

        assert!(db.tickets().get(as_other, &t.ticket.id).await.is_err());
        let seen = db.tickets().get(as_admin, &t.ticket.id).await.unwrap();
        assert_eq!(seen.attachments.len(), 1);
    }

    #[tokio::test]
    async fn test_feedback_rules() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let t = db.tickets().create(&owner, new_ticket()).await.unwrap();
        let id = t.ticket.id;

        let resolve_blank = TicketFeedback {
            status: TicketStatus::Resolved,
            admin_feedback: Some("  ".to_string()),
        };
        let err = db.tickets().provide_feedback(&id, resolve_blank).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let answered = db
            .tickets()
            .provide_feedback(
                &id,
                TicketFeedback {
                    status: TicketStatus::InProgress,
                    admin_feedback: Some("Looking into it".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(answered.ticket.status, TicketStatus::InProgress);
        assert!(answered.ticket.feedback_date.is_some());

        let cleared = db
            .tickets()
            .provide_feedback(
                &id,
                TicketFeedback {
                    status: TicketStatus::Open,
                    admin_feedback: None,
                },
            )
            .await
            .unwrap();
        assert!(cleared.ticket.feedback_date.is_none());
    }
}
