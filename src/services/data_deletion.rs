use crate::error::{AppError, AppResult};
use crate::facebook::parse_signed_request;
use crate::html::{escape_html, render_page};
use crate::models::{DataDeletionRequest, DeletionStatus};
use crate::repositories::{DataDeletionRepository, UserRepository};
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Response Facebook expects from a data deletion callback
#[derive(Debug, Clone, Serialize)]
pub struct DeletionReceipt {
    pub url: String,
    pub confirmation_code: String,
}

/// Rendered status page with its HTTP status
#[derive(Debug, Clone)]
pub struct StatusPage {
    pub status: u16,
    pub html: String,
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// `CN_<base36 millis>_<8 random>`, uppercased
pub fn confirmation_code(now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();

    format!("CN_{}_{}", to_base36(millis), random).to_uppercase()
}

/// Request time as shown to the user (Asia/Taipei)
fn taipei_time(at: DateTime<Utc>) -> String {
    (at + Duration::hours(8))
        .naive_utc()
        .format("%Y/%m/%d %H:%M:%S")
        .to_string()
}

/// Handles Facebook's data deletion callback and its public status page
pub struct DataDeletionService {
    user_repo: Arc<UserRepository>,
    deletion_repo: Arc<DataDeletionRepository>,
    app_secret: String,
    functions_url: String,
}

impl DataDeletionService {
    pub fn new(
        user_repo: Arc<UserRepository>,
        deletion_repo: Arc<DataDeletionRepository>,
        app_secret: String,
        functions_url: String,
    ) -> Self {
        Self {
            user_repo,
            deletion_repo,
            app_secret,
            functions_url: functions_url.trim_end_matches('/').to_string(),
        }
    }

    /// Verify the signed request, drop the user's Facebook data and log the request
    pub async fn handle_callback(&self, signed_request: &str) -> AppResult<DeletionReceipt> {
        let request = parse_signed_request(signed_request, &self.app_secret).map_err(|e| {
            warn!("Rejected data deletion callback: {}", e);
            AppError::Validation("Invalid signed_request".to_string())
        })?;

        info!("Processing data deletion for FB user {}", request.user_id);

        let user = match self.user_repo.find_by_fb_user_id(&request.user_id).await {
            Ok(user) => user,
            Err(e) => {
                error!("Error finding user for FB id {}: {}", request.user_id, e);
                None
            }
        };

        let code = confirmation_code(Utc::now());
        let status = match &user {
            Some(user) => match self.user_repo.clear_facebook_data(user.id).await {
                Ok(_) => {
                    info!("Cleared Facebook data for user {}", user.id);
                    DeletionStatus::Completed
                }
                Err(e) => {
                    error!("Error clearing Facebook data for user {}: {}", user.id, e);
                    DeletionStatus::Failed
                }
            },
            None => {
                info!("No user found with FB id {}", request.user_id);
                DeletionStatus::NoUserFound
            }
        };

        if let Err(e) = self
            .deletion_repo
            .record(&request.user_id, user.as_ref().map(|u| u.id), &code, status)
            .await
        {
            error!("Could not log deletion request {}: {}", code, e);
        }

        Ok(DeletionReceipt {
            url: format!(
                "{}/facebook-data-deletion-status?code={}",
                self.functions_url,
                urlencoding::encode(&code)
            ),
            confirmation_code: code,
        })
    }

    /// Public page describing the request behind a confirmation code
    pub async fn status_page(&self, code: Option<&str>) -> StatusPage {
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            return StatusPage {
                status: 400,
                html: render_page("錯誤", "缺少確認碼"),
            };
        };

        match self.deletion_repo.find_by_code(code).await {
            Ok(Some(request)) => StatusPage {
                status: 200,
                html: render_status(&request),
            },
            Ok(None) => StatusPage {
                status: 404,
                html: render_page(
                    "查無資料",
                    &format!(
                        "找不到確認碼為 {} 的資料刪除請求。<br><br>這可能是因為：<br>• 確認碼不正確<br>• 請求尚未處理",
                        escape_html(code)
                    ),
                ),
            },
            Err(e) => {
                error!("Deletion status lookup failed: {}", e);
                StatusPage {
                    status: 500,
                    html: render_page("錯誤", "處理請求時發生錯誤"),
                }
            }
        }
    }
}

fn render_status(request: &DataDeletionRequest) -> String {
    let status_text = match request.status.as_str() {
        "completed" => "✅ 已完成 - 您的 Facebook 相關資料已從我們的系統中刪除。".to_string(),
        "no_user_found" => {
            "✅ 已完成 - 我們的系統中未找到與您 Facebook 帳號相關的資料。".to_string()
        }
        "failed" => "❌ 未完成 - 刪除資料時發生錯誤，請重新提出刪除請求。".to_string(),
        other => format!("處理中 - 狀態: {}", escape_html(other)),
    };

    render_page(
        "資料刪除狀態",
        &format!(
            "<strong>確認碼：</strong>{}<br><br>\n       <strong>狀態：</strong>{}<br><br>\n       <strong>請求時間：</strong>{}<br><br>\n       如有任何問題，請聯繫 support@campusnerds.app",
            escape_html(&request.confirmation_code),
            status_text,
            taipei_time(request.created_at)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn test_confirmation_code_shape() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let code = confirmation_code(now);
        assert!(code.starts_with("CN_LOYW3V28_"));
        let random = code.rsplit('_').next().unwrap();
        assert_eq!(random.len(), 8);
        assert!(random.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert_ne!(confirmation_code(now), code);
    }

    #[test]
    fn test_status_page_shows_taipei_time() {
        let request = DataDeletionRequest {
            id: Uuid::new_v4(),
            fb_user_id: "123".into(),
            user_id: None,
            confirmation_code: "CN_ABC_12345678".into(),
            status: "no_user_found".into(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 16, 30, 0).unwrap(),
        };

        let html = render_status(&request);
        assert!(html.contains("CN_ABC_12345678"));
        assert!(html.contains("2025/01/02 00:30:00"));
        assert!(html.contains("未找到"));
    }

    #[test]
    fn test_failed_request_is_not_reported_as_done() {
        let request = DataDeletionRequest {
            id: Uuid::new_v4(),
            fb_user_id: "123".into(),
            user_id: Some(Uuid::new_v4()),
            confirmation_code: "CN_ABC_87654321".into(),
            status: DeletionStatus::Failed.as_str().into(),
            created_at: Utc::now(),
        };

        let html = render_status(&request);
        assert!(html.contains("未完成"));
        assert!(!html.contains("已完成"));
    }
}
