/// Request bodies that are decoded only after the caller is authorized
use actix_web::web::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

/// A JSON body that is either already decoded or still raw bytes.
///
/// Write handlers pass the raw body through so that permission checks run
/// first; a denied caller gets 401/403, never a decoding error.
#[derive(Debug)]
pub enum RequestBody<T> {
    Parsed(T),
    Raw(Bytes),
}

impl<T: DeserializeOwned> RequestBody<T> {
    pub fn parse(self) -> Result<T> {
        match self {
            RequestBody::Parsed(value) => Ok(value),
            RequestBody::Raw(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| AppError::BadRequest(format!("Malformed request body: {e}"))),
        }
    }
}

impl<T> From<T> for RequestBody<T> {
    fn from(value: T) -> Self {
        RequestBody::Parsed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CommentRequest;

    #[test]
    fn test_raw_body_is_decoded_on_parse() {
        let body = RequestBody::<CommentRequest>::Raw(Bytes::from_static(br#"{"comment":"hi"}"#));
        assert_eq!(body.parse().unwrap().comment.as_deref(), Some("hi"));
    }

    #[test]
    fn test_malformed_body_is_a_bad_request() {
        let body = RequestBody::<CommentRequest>::Raw(Bytes::from_static(b"{not json"));
        match body.parse() {
            Err(AppError::BadRequest(message)) => {
                assert!(message.starts_with("Malformed request body"))
            }
            other => panic!("expected bad request, got {other:?}"),
        }
    }
}
