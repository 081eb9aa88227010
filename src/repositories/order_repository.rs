use crate::models::{EcpayPayment, Order, Product, TicketType};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Fields of a freshly created order
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product: &'a Product,
    pub merchant_trade_no: &'a str,
    pub checkout_token_hash: &'a str,
    pub checkout_token_expires_at: DateTime<Utc>,
}

/// Gateway notification as recorded in `ecpay_payments`
#[derive(Debug, Clone)]
pub struct PaymentNotice<'a> {
    pub order_id: Uuid,
    pub trade_no: Option<&'a str>,
    pub rtn_code: Option<i32>,
    pub rtn_msg: Option<&'a str>,
    pub trade_amt: Option<i32>,
    pub paid_at: DateTime<Utc>,
    pub check_mac_value: &'a str,
    pub raw: &'a Value,
}

/// Repository for products, orders, payments and the ticket ledger
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Create a new OrderRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product
    pub async fn create_product(
        &self,
        ticket_type: TicketType,
        pack_size: i32,
        price_twd: i32,
        title: &str,
    ) -> SqlxResult<Product> {
        let ticket_type = match ticket_type {
            TicketType::Study => "study",
            TicketType::Games => "games",
        };

        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (ticket_type, pack_size, price_twd, title)
            VALUES ($1, $2, $3, $4)
            RETURNING id, ticket_type, pack_size, price_twd, title, is_active
            "#,
        )
        .bind(ticket_type)
        .bind(pack_size)
        .bind(price_twd)
        .bind(title)
        .fetch_one(&self.pool)
        .await
    }

    /// Find a product that is still on sale
    pub async fn find_active_product(&self, id: Uuid) -> SqlxResult<Option<Product>> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, ticket_type, pack_size, price_twd, title, is_active
            FROM products
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert a pending order snapshotting the product
    pub async fn create_order(&self, new_order: &NewOrder<'_>) -> SqlxResult<Order> {
        let product = new_order.product;

        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                id, user_id, product_id, merchant_trade_no,
                ticket_type_snapshot, pack_size_snapshot, title_snapshot, price_snapshot_twd,
                total_amount, currency, status, checkout_token_hash, checkout_token_expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, 'TWD', 'pending', $9, $10)
            RETURNING id, user_id, product_id, merchant_trade_no, ticket_type_snapshot,
                      pack_size_snapshot, title_snapshot, price_snapshot_twd, total_amount,
                      currency, status, checkout_token_hash, checkout_token_expires_at,
                      paid_at, created_at
            "#,
        )
        .bind(new_order.id)
        .bind(new_order.user_id)
        .bind(product.id)
        .bind(new_order.merchant_trade_no)
        .bind(&product.ticket_type)
        .bind(product.pack_size)
        .bind(&product.title)
        .bind(product.price_twd)
        .bind(new_order.checkout_token_hash)
        .bind(new_order.checkout_token_expires_at)
        .fetch_one(&self.pool)
        .await
    }

    /// Find an order by UUID
    pub async fn find_by_id(&self, id: Uuid) -> SqlxResult<Option<Order>> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, product_id, merchant_trade_no, ticket_type_snapshot,
                   pack_size_snapshot, title_snapshot, price_snapshot_twd, total_amount,
                   currency, status, checkout_token_hash, checkout_token_expires_at,
                   paid_at, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find an order by the hash of its checkout token
    pub async fn find_by_checkout_token_hash(&self, token_hash: &str) -> SqlxResult<Option<Order>> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, product_id, merchant_trade_no, ticket_type_snapshot,
                   pack_size_snapshot, title_snapshot, price_snapshot_twd, total_amount,
                   currency, status, checkout_token_hash, checkout_token_expires_at,
                   paid_at, created_at
            FROM orders
            WHERE checkout_token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find an order by merchant trade number
    pub async fn find_by_merchant_trade_no(&self, merchant_trade_no: &str) -> SqlxResult<Option<Order>> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, product_id, merchant_trade_no, ticket_type_snapshot,
                   pack_size_snapshot, title_snapshot, price_snapshot_twd, total_amount,
                   currency, status, checkout_token_hash, checkout_token_expires_at,
                   paid_at, created_at
            FROM orders
            WHERE merchant_trade_no = $1
            "#,
        )
        .bind(merchant_trade_no)
        .fetch_optional(&self.pool)
        .await
    }

    /// Record the latest gateway notification for an order
    pub async fn upsert_payment(&self, notice: &PaymentNotice<'_>) -> SqlxResult<EcpayPayment> {
        sqlx::query_as::<_, EcpayPayment>(
            r#"
            INSERT INTO ecpay_payments (
                order_id, trade_no, rtn_code, rtn_msg, trade_amt, paid_at, check_mac_value, raw
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (order_id) DO UPDATE
            SET trade_no = EXCLUDED.trade_no,
                rtn_code = EXCLUDED.rtn_code,
                rtn_msg = EXCLUDED.rtn_msg,
                trade_amt = EXCLUDED.trade_amt,
                paid_at = EXCLUDED.paid_at,
                check_mac_value = EXCLUDED.check_mac_value,
                raw = EXCLUDED.raw
            RETURNING id, order_id, trade_no, rtn_code, rtn_msg, trade_amt, paid_at,
                      check_mac_value, raw, created_at
            "#,
        )
        .bind(notice.order_id)
        .bind(notice.trade_no)
        .bind(notice.rtn_code)
        .bind(notice.rtn_msg)
        .bind(notice.trade_amt)
        .bind(notice.paid_at)
        .bind(notice.check_mac_value)
        .bind(notice.raw)
        .fetch_one(&self.pool)
        .await
    }

    /// Mark an order paid and credit its tickets in one transaction.
    ///
    /// Returns `false` when the order was already paid, so repeated gateway
    /// notifications never credit twice.
    pub async fn mark_paid_and_credit(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        delta_study: i32,
        delta_games: i32,
    ) -> SqlxResult<bool> {
        let mut tx = self.pool.begin().await?;

        let rows_affected = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'paid', paid_at = now()
            WHERE id = $1 AND status <> 'paid'
            "#,
        )
        .bind(order_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO ticket_ledger (user_id, order_id, delta_study, delta_games, reason)
            VALUES ($1, $2, $3, $4, 'purchase_credit')
            "#,
        )
        .bind(user_id)
        .bind(order_id)
        .bind(delta_study)
        .bind(delta_games)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Ticket balance `(study, games)` of a user
    pub async fn ticket_balance(&self, user_id: Uuid) -> SqlxResult<(i64, i64)> {
        sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COALESCE(SUM(delta_study), 0)::BIGINT, COALESCE(SUM(delta_games), 0)::BIGINT
            FROM ticket_ledger
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }
}
