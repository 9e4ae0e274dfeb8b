use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use runway_core::repository::{StoreResult, TicketRepository};
use runway_core::{NotificationRecord, SaleEntry, TicketRecord, TicketSummary};

use crate::database::{map_sqlx_error, read_error};

pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TicketSummaryRow {
    flight_number: String,
    seat_number: String,
    price: i32,
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    ticket_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SaleRow {
    departure: DateTime<Utc>,
    price: i32,
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn insert_ticket_with_notification(
        &self,
        ticket: &TicketRecord,
        notification: &NotificationRecord,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| read_error(e, "ticket"))?;

        sqlx::query(
            r#"
            INSERT INTO tickets (id, user_id, flight_id, seat_number, price, issued_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(ticket.id)
        .bind(ticket.user_id)
        .bind(ticket.flight_id)
        .bind(&ticket.seat)
        .bind(ticket.price)
        .bind(ticket.issued_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(e, "ticket", &[]))?;

        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, ticket_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.ticket_id)
        .bind(notification.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(e, "notification", &[]))?;

        tx.commit().await.map_err(|e| read_error(e, "ticket"))?;

        Ok(())
    }

    async fn tickets_for_user(&self, user_id: Uuid) -> StoreResult<Vec<TicketSummary>> {
        let rows = sqlx::query_as::<_, TicketSummaryRow>(
            r#"
            SELECT f.flight_number, t.seat_number, t.price
            FROM tickets t
            JOIN flights f ON f.id = t.flight_id
            WHERE t.user_id = $1
            ORDER BY t.issued_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| read_error(e, "ticket"))?;

        Ok(rows
            .into_iter()
            .map(|row| TicketSummary {
                flight_number: row.flight_number,
                seat: row.seat_number,
                price: row.price,
            })
            .collect())
    }

    async fn notifications_for_user(&self, user_id: Uuid) -> StoreResult<Vec<NotificationRecord>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT id, user_id, ticket_id, created_at FROM notifications WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| read_error(e, "notification"))?;

        Ok(rows
            .into_iter()
            .map(|row| NotificationRecord {
                id: row.id,
                user_id: row.user_id,
                ticket_id: row.ticket_id,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn sale_entries(&self) -> StoreResult<Vec<SaleEntry>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT f.departure, t.price
            FROM tickets t
            JOIN flights f ON f.id = t.flight_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| read_error(e, "ticket"))?;

        Ok(rows
            .into_iter()
            .map(|row| SaleEntry {
                departure: row.departure,
                price: row.price,
            })
            .collect())
    }
}
