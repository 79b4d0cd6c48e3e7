/// Identity extractors.
///
/// The upstream auth gateway authenticates the caller and forwards their id in
/// the `x-user-id` header. Writes require it; reads accept it when present.
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::ServiceError;

pub const USER_ID_HEADER: &str = "x-user-id";

fn header_user_id(req: &HttpRequest) -> Result<Option<Uuid>, ServiceError> {
    let Some(raw) = req.headers().get(USER_ID_HEADER) else {
        return Ok(None);
    };

    let value = raw
        .to_str()
        .map_err(|_| ServiceError::InvalidInput(format!("{} is not valid text", USER_ID_HEADER)))?;
    Uuid::parse_str(value.trim())
        .map(Some)
        .map_err(|_| ServiceError::InvalidInput(format!("{} must be a UUID", USER_ID_HEADER)))
}

/// Authenticated actor; rejects the request when the header is missing.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

impl FromRequest for UserId {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(header_user_id(req).and_then(|id| {
            id.map(UserId).ok_or_else(|| {
                ServiceError::InvalidInput(format!("missing {} header", USER_ID_HEADER))
            })
        }))
    }
}

/// Optional viewer for read endpoints
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewer(pub Option<Uuid>);

impl FromRequest for Viewer {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(header_user_id(req).map(Viewer))
    }
}
