//! PostgreSQL store implementation.
//!
//! Every operation is one short transaction (single round-trip where the
//! statement allows it). Payment idempotency rides on a `FOR UPDATE` row
//! lock taken inside the same transaction that writes.

use crate::error::StoreError;
use crate::repository::{EventRow, OrderRow, OrderStore, PaymentRow, ShipmentRow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::debug;
use trellis_domain::{ChargeOutcome, EventKind, OrderState, PaymentStatus, ShipmentStatus};

/// sqlx-backed store on PostgreSQL.
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn upsert_order_state(
        &self,
        order_id: &str,
        state: OrderState,
        address: Option<&Value>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, state, address_json)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
                SET state = EXCLUDED.state,
                    address_json = COALESCE(EXCLUDED.address_json, orders.address_json)
            "#,
        )
        .bind(order_id)
        .bind(state.as_str())
        .bind(address.cloned())
        .execute(&self.pool)
        .await?;

        debug!(order_id = %order_id, state = %state, "order state upserted");
        Ok(())
    }

    async fn insert_event(
        &self,
        order_id: &str,
        kind: EventKind,
        payload: Option<&Value>,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO events (order_id, type, payload_json) VALUES ($1, $2, $3)")
            .bind(order_id)
            .bind(kind.as_str())
            .bind(payload.cloned())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_address(&self, order_id: &str, address: &Value) -> Result<(), StoreError> {
        sqlx::query("UPDATE orders SET address_json = $1 WHERE id = $2")
            .bind(address.clone())
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn charge_payment_idempotent(
        &self,
        payment_id: &str,
        order_id: &str,
        amount: Decimal,
    ) -> Result<ChargeOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent retries of the same payment_id.
        let existing =
            sqlx::query("SELECT status, amount FROM payments WHERE payment_id = $1 FOR UPDATE")
                .bind(payment_id)
                .fetch_optional(&mut *tx)
                .await?;

        if let Some(row) = existing {
            let status: String = row.try_get("status")?;
            if status == PaymentStatus::Charged.as_str() {
                let stored: Decimal = row.try_get("amount")?;
                tx.commit().await?;

                debug!(payment_id = %payment_id, amount = %stored, "payment already charged");
                return Ok(ChargeOutcome {
                    status: PaymentStatus::Charged,
                    amount: stored,
                    was_new: false,
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO payments (payment_id, order_id, status, amount)
            VALUES ($1, $2, 'charged', $3)
            ON CONFLICT (payment_id) DO UPDATE
                SET order_id = EXCLUDED.order_id,
                    status = 'charged',
                    amount = EXCLUDED.amount
            "#,
        )
        .bind(payment_id)
        .bind(order_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(payment_id = %payment_id, amount = %amount, "payment charged");
        Ok(ChargeOutcome {
            status: PaymentStatus::Charged,
            amount,
            was_new: true,
        })
    }

    async fn insert_shipment(
        &self,
        order_id: &str,
        status: ShipmentStatus,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO shipments (order_id, status, payload_json) VALUES ($1, $2, NULL)")
            .bind(order_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn load_order(&self, order_id: &str) -> Result<Option<OrderRow>, StoreError> {
        let row = sqlx::query("SELECT id, state, address_json FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let state: String = row.try_get("state")?;
            Ok(OrderRow {
                order_id: row.try_get("id")?,
                state: state
                    .parse::<OrderState>()
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
                address_json: row.try_get("address_json")?,
            })
        })
        .transpose()
    }

    async fn events_for(&self, order_id: &str) -> Result<Vec<EventRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, type, payload_json, created_at
            FROM events
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let kind: String = row.try_get("type")?;
                Ok(EventRow {
                    order_id: row.try_get("order_id")?,
                    kind: kind
                        .parse::<EventKind>()
                        .map_err(|e| StoreError::Serialization(e.to_string()))?,
                    payload_json: row.try_get("payload_json")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn payment(&self, payment_id: &str) -> Result<Option<PaymentRow>, StoreError> {
        let row = sqlx::query(
            "SELECT payment_id, order_id, status, amount FROM payments WHERE payment_id = $1",
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let status: String = row.try_get("status")?;
            if status != PaymentStatus::Charged.as_str() {
                return Err(StoreError::Serialization(format!(
                    "unexpected payment status: {status}"
                )));
            }
            Ok(PaymentRow {
                payment_id: row.try_get("payment_id")?,
                order_id: row.try_get("order_id")?,
                status: PaymentStatus::Charged,
                amount: row.try_get("amount")?,
            })
        })
        .transpose()
    }

    async fn shipments_for(&self, order_id: &str) -> Result<Vec<ShipmentRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, status, payload_json, created_at
            FROM shipments
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                Ok(ShipmentRow {
                    order_id: row.try_get("order_id")?,
                    status: status
                        .parse::<ShipmentStatus>()
                        .map_err(|e| StoreError::Serialization(e.to_string()))?,
                    payload_json: row.try_get("payload_json")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}
