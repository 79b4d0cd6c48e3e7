/// Subscription handlers - subscribe/unsubscribe toggle
use actix_web::{web, HttpResponse};
use tracing::info;

use crate::error::ServiceResult;
use crate::handlers::{parse_id, toggle_response};
use crate::middleware::UserId;
use crate::state::AppState;

/// POST /api/v1/subscriptions/{channel_id}
pub async fn toggle_subscription(
    state: web::Data<AppState>,
    user_id: UserId,
    channel_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let channel_id = parse_id(&channel_id, "channel id")?;

    let outcome = state
        .toggles
        .toggle_subscription(user_id.0, channel_id)
        .await?;

    info!(
        subscriber_id = %user_id.0,
        channel_id = %channel_id,
        state = outcome.state.as_str(),
        "subscription toggled"
    );
    Ok(toggle_response(outcome))
}
