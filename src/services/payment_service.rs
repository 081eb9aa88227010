use crate::config::EcpayConfig;
use crate::ecpay;
use crate::error::{AppError, AppResult};
use crate::models::{Order, OrderStatus, TicketType};
use crate::repositories::{NewOrder, OrderRepository, PaymentNotice};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Lifetime of a checkout token
const CHECKOUT_TOKEN_TTL_MINUTES: i64 = 15;

/// `RtnCode` of a successful payment
const PAID_RTN_CODE: &str = "1";

/// Reply body expected by the gateway's server-to-server notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnAck {
    Ok,
    Fail,
}

impl ReturnAck {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnAck::Ok => "1|OK",
            ReturnAck::Fail => "0|FAIL",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedOrder {
    pub order_id: Uuid,
    pub checkout_url: String,
    pub checkout_token: String,
}

/// Ticket pack checkout through the ECPay AIO gateway
pub struct PaymentService {
    order_repo: Arc<OrderRepository>,
    config: EcpayConfig,
    project_ref: Option<String>,
}

impl PaymentService {
    pub fn new(order_repo: Arc<OrderRepository>, config: EcpayConfig, supabase_url: &str) -> Self {
        Self {
            order_repo,
            config,
            project_ref: project_ref(supabase_url),
        }
    }

    /// Create a pending order and hand out its one-time checkout token
    pub async fn create_order(&self, user_id: Uuid, product_id: Uuid) -> AppResult<CreatedOrder> {
        let product = self
            .order_repo
            .find_active_product(product_id)
            .await?
            .ok_or_else(|| AppError::Validation("Invalid product".to_string()))?;

        let order_id = Uuid::new_v4();
        let merchant_trade_no = Order::merchant_trade_no_for(order_id);
        let checkout_token = ecpay::generate_checkout_token();
        let token_hash = ecpay::hash_checkout_token(&checkout_token);

        self.order_repo
            .create_order(&NewOrder {
                id: order_id,
                user_id,
                product: &product,
                merchant_trade_no: &merchant_trade_no,
                checkout_token_hash: &token_hash,
                checkout_token_expires_at: Utc::now() + Duration::minutes(CHECKOUT_TOKEN_TTL_MINUTES),
            })
            .await
            .map_err(|e| {
                error!("Create order failed for user {}: {}", user_id, e);
                AppError::Internal("Create order failed".to_string())
            })?;

        info!(
            "Created order {} ({}) for user {}: {} TWD",
            order_id, merchant_trade_no, user_id, product.price_twd
        );

        let mut checkout_url = self.checkout_redirect_url(&checkout_token);
        if let Some(project_ref) = &self.project_ref {
            checkout_url.push_str("&ref=");
            checkout_url.push_str(&urlencoding::encode(project_ref));
        }

        Ok(CreatedOrder {
            order_id,
            checkout_url,
            checkout_token,
        })
    }

    /// Pay-site bootstrap page that posts the token back
    pub fn checkout_redirect_url(&self, checkout_token: &str) -> String {
        format!(
            "{}/checkout.html?token={}",
            self.config.pay_site_url,
            urlencoding::encode(checkout_token)
        )
    }

    /// Auto-submitting gateway form for the order behind `checkout_token`
    pub async fn checkout_page(&self, checkout_token: &str, now: DateTime<Utc>) -> AppResult<String> {
        let order = self
            .order_repo
            .find_by_checkout_token_hash(&ecpay::hash_checkout_token(checkout_token))
            .await?
            .ok_or_else(|| AppError::Validation("Invalid token".to_string()))?;

        if order.status_enum() != OrderStatus::Pending {
            return Err(AppError::Validation("Order not payable".to_string()));
        }
        if !order.is_payable_at(now) {
            return Err(AppError::Validation("Token expired".to_string()));
        }

        let fields = ecpay::checkout_fields(
            &self.config,
            &order.merchant_trade_no,
            order.total_amount,
            &order.title_snapshot,
            now,
        );

        info!("Rendering checkout for order {}", order.id);
        Ok(ecpay::html_auto_post(ecpay::gateway_url(&self.config), &fields))
    }

    /// Handle the gateway's payment notification.
    ///
    /// Every verified notification is logged in `ecpay_payments`; a successful
    /// one credits tickets once no matter how often it is repeated.
    pub async fn handle_return(&self, params: &HashMap<String, String>) -> ReturnAck {
        if !ecpay::verify_check_mac_value(params, &self.config.hash_key, &self.config.hash_iv) {
            warn!("Rejected ECPay notification with bad CheckMacValue");
            return ReturnAck::Fail;
        }

        let merchant_trade_no = params.get("MerchantTradeNo").map(String::as_str).unwrap_or("");
        let order = match self.order_repo.find_by_merchant_trade_no(merchant_trade_no).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                warn!("ECPay notification for unknown order {}", merchant_trade_no);
                return ReturnAck::Fail;
            }
            Err(e) => {
                error!("Order lookup failed for {}: {}", merchant_trade_no, e);
                return ReturnAck::Fail;
            }
        };

        let raw = serde_json::to_value(params).unwrap_or_default();
        let field = |key: &str| params.get(key).map(String::as_str);
        let notice = PaymentNotice {
            order_id: order.id,
            trade_no: field("TradeNo"),
            rtn_code: field("RtnCode").and_then(|v| v.parse().ok()),
            rtn_msg: field("RtnMsg"),
            trade_amt: field("TradeAmt").and_then(|v| v.parse().ok()),
            paid_at: field("PaymentDate")
                .and_then(parse_payment_date)
                .unwrap_or_else(Utc::now),
            check_mac_value: field(ecpay::CHECK_MAC_FIELD).unwrap_or(""),
            raw: &raw,
        };
        if let Err(e) = self.order_repo.upsert_payment(&notice).await {
            error!("Failed to log ECPay payment for order {}: {}", order.id, e);
        }

        if field("RtnCode") != Some(PAID_RTN_CODE) || order.status_enum() == OrderStatus::Paid {
            return ReturnAck::Ok;
        }

        let (delta_study, delta_games) = order
            .ticket_type_snapshot
            .parse::<TicketType>()
            .map(|t| t.ledger_deltas(order.pack_size_snapshot))
            .unwrap_or((0, 0));

        match self
            .order_repo
            .mark_paid_and_credit(order.id, order.user_id, delta_study, delta_games)
            .await
        {
            Ok(true) => {
                info!(
                    "Order {} paid: credited {} study / {} games tickets to user {}",
                    order.id, delta_study, delta_games, order.user_id
                );
                ReturnAck::Ok
            }
            Ok(false) => {
                info!("Order {} was already paid", order.id);
                ReturnAck::Ok
            }
            Err(e) => {
                error!("Failed to mark order {} paid: {}", order.id, e);
                ReturnAck::Fail
            }
        }
    }

    /// Where the shopper's browser lands after paying
    pub fn client_result_url(&self, params: &HashMap<String, String>) -> String {
        let base = format!("{}/ecpay/result", self.config.pay_site_url);
        let get = |key: &str| params.get(key).map(String::as_str).unwrap_or("");
        let query = [
            ("MerchantTradeNo", get("MerchantTradeNo")),
            ("RtnCode", get("RtnCode")),
            ("RtnMsg", get("RtnMsg")),
        ];

        match url::Url::parse_with_params(&base, &query) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!("Invalid pay site URL {}: {}", base, e);
                base
            }
        }
    }
}

/// Supabase project ref, e.g. `abcdef` for `https://abcdef.supabase.co`
fn project_ref(supabase_url: &str) -> Option<String> {
    let url = url::Url::parse(supabase_url).ok()?;
    let first = url.host_str()?.split('.').next()?;
    (!first.is_empty()).then(|| first.to_string())
}

/// `PaymentDate` is Taiwan local time, `yyyy/MM/dd HH:mm:ss`
fn parse_payment_date(value: &str) -> Option<DateTime<Utc>> {
    let local = NaiveDateTime::parse_from_str(value, "%Y/%m/%d %H:%M:%S").ok()?;
    Some(local.and_utc() - Duration::hours(8))
}
