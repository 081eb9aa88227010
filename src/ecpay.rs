//! ECPay AIO checkout helpers: CheckMacValue, trade dates and the auto-post form

use crate::config::EcpayConfig;
use crate::html::escape_html;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

pub const PRODUCTION_GATEWAY: &str = "https://payment.ecpay.com.tw/Cashier/AioCheckOut/V5";
pub const STAGE_GATEWAY: &str = "https://payment-stage.ecpay.com.tw/Cashier/AioCheckOut/V5";

/// Field carrying the checksum; never part of its own input
pub const CHECK_MAC_FIELD: &str = "CheckMacValue";

const TRADE_DESC: &str = "Campus Nerds Ticket";

/// Bytes of randomness in a checkout token
const CHECKOUT_TOKEN_BYTES: usize = 24;

/// URL-encode the way ECPay's reference implementation does (.NET `UrlEncode`
/// on top of `encodeURIComponent`), then lowercase.
pub fn encode_for_check_mac(raw: &str) -> String {
    urlencoding::encode(raw)
        .to_lowercase()
        .replace("%20", "+")
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2a", "*")
        .replace("%2d", "-")
        .replace("%2e", ".")
        .replace("%5f", "_")
}

/// Compute `CheckMacValue` for a set of gateway fields.
///
/// Keys are sorted case-insensitively and any existing `CheckMacValue` is ignored.
pub fn compute_check_mac_value<'a, I>(params: I, hash_key: &str, hash_iv: &str) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut fields: Vec<(&str, &str)> = params
        .into_iter()
        .filter(|(k, _)| *k != CHECK_MAC_FIELD)
        .collect();
    fields.sort_by(|(a, _), (b, _)| {
        a.to_ascii_lowercase()
            .cmp(&b.to_ascii_lowercase())
            .then_with(|| a.cmp(b))
    });

    let joined = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let raw = format!("HashKey={}&{}&HashIV={}", hash_key, joined, hash_iv);

    hex::encode_upper(Sha256::digest(encode_for_check_mac(&raw).as_bytes()))
}

/// Check a gateway notification against its `CheckMacValue`
pub fn verify_check_mac_value(params: &HashMap<String, String>, hash_key: &str, hash_iv: &str) -> bool {
    let Some(received) = params.get(CHECK_MAC_FIELD) else {
        return false;
    };

    let expected = compute_check_mac_value(
        params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        hash_key,
        hash_iv,
    );

    received.eq_ignore_ascii_case(&expected)
}

/// `MerchantTradeDate` in Taiwan time (UTC+8), `yyyy/MM/dd HH:mm:ss`
pub fn format_trade_date(now: DateTime<Utc>) -> String {
    (now + Duration::hours(8))
        .naive_utc()
        .format("%Y/%m/%d %H:%M:%S")
        .to_string()
}

pub fn gateway_url(config: &EcpayConfig) -> &'static str {
    if config.is_production() {
        PRODUCTION_GATEWAY
    } else {
        STAGE_GATEWAY
    }
}

/// Fresh URL-safe checkout token handed to the browser once
pub fn generate_checkout_token() -> String {
    let bytes: [u8; CHECKOUT_TOKEN_BYTES] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Only this hash is stored; the token itself is never persisted
pub fn hash_checkout_token(token: &str) -> String {
    hex::encode_upper(Sha256::digest(token.as_bytes()))
}

/// Fields posted to the AIO gateway for one order, checksum included
pub fn checkout_fields(
    config: &EcpayConfig,
    merchant_trade_no: &str,
    total_amount: i32,
    item_name: &str,
    now: DateTime<Utc>,
) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = vec![
        ("MerchantID".into(), config.merchant_id.clone()),
        ("MerchantTradeNo".into(), merchant_trade_no.to_string()),
        ("MerchantTradeDate".into(), format_trade_date(now)),
        ("PaymentType".into(), "aio".into()),
        ("TotalAmount".into(), total_amount.to_string()),
        ("TradeDesc".into(), TRADE_DESC.into()),
        ("ItemName".into(), item_name.to_string()),
        ("ReturnURL".into(), config.return_url.clone()),
        ("OrderResultURL".into(), config.order_result_url.clone()),
        ("ChoosePayment".into(), "Credit".into()),
        ("EncryptType".into(), "1".into()),
    ];

    let mac = compute_check_mac_value(
        fields.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        &config.hash_key,
        &config.hash_iv,
    );
    fields.push((CHECK_MAC_FIELD.into(), mac));
    fields
}

/// Page that immediately POSTs `fields` to `action`
pub fn html_auto_post(action: &str, fields: &[(String, String)]) -> String {
    let inputs = fields
        .iter()
        .map(|(k, v)| {
            format!(
                r#"<input type="hidden" name="{}" value="{}" />"#,
                escape_html(k),
                escape_html(v)
            )
        })
        .collect::<Vec<_>>()
        .join("\n    ");

    format!(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1"></head>
<body>
  <form id="f" method="post" action="{}">
    {}
  </form>
  <script>document.getElementById('f').submit();</script>
</body>
</html>"#,
        escape_html(action),
        inputs
    )
}
