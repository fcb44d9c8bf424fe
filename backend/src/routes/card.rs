use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::services::card_service::{CardComposer, CardRequest};
use crate::utils::error::{AppError, Result};

/// Truthiness ala JSON longgar: `null`, `false`, `0`, `""` → false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Ambil `userName` & `isClubMember` dari body JSON.
///
/// `userName` wajib string tidak kosong; `isClubMember` wajib ada
/// (boleh `null`, dianggap false).
pub fn parse_card_request(body: &[u8]) -> Result<CardRequest> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|e| AppError::invalid_body(e.to_string()))?;

    let display_name = payload
        .get("userName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(AppError::missing_parameters)?;

    let is_member = payload
        .get("isClubMember")
        .map(is_truthy)
        .ok_or_else(AppError::missing_parameters)?;

    Ok(CardRequest {
        display_name: display_name.to_string(),
        is_member,
    })
}

/// Rejection body (mis. melewati batas ukuran) tetap dijawab dengan JSON.
fn body_rejection(rejection: BytesRejection) -> AppError {
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(rejection.body_text()),
        _ => AppError::invalid_body(rejection.body_text()),
    }
}

pub async fn generate_card(
    State(composer): State<Arc<CardComposer>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Response> {
    let body = body.map_err(body_rejection)?;
    let request = parse_card_request(&body)?;

    let png = tokio::task::spawn_blocking(move || composer.compose(&request))
        .await
        .map_err(|e| AppError::CompositionFailure(format!("composition task failed: {e}")))??;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], png).into_response())
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<CardRequest> {
        parse_card_request(body.as_bytes())
    }

    #[test]
    fn parses_valid_request() {
        let request = parse(r#"{"userName":"Alice","isClubMember":true}"#).unwrap();
        assert_eq!(
            request,
            CardRequest {
                display_name: "Alice".into(),
                is_member: true
            }
        );
    }

    #[test]
    fn missing_or_empty_user_name_is_rejected() {
        for body in [
            r#"{"isClubMember":true}"#,
            r#"{"userName":"","isClubMember":true}"#,
            r#"{"userName":null,"isClubMember":false}"#,
            r#"{"userName":42,"isClubMember":false}"#,
        ] {
            let err = parse(body).unwrap_err();
            assert_eq!(err.to_string(), "Missing parameters", "body: {body}");
        }
    }

    #[test]
    fn absent_membership_flag_is_rejected() {
        let err = parse(r#"{"userName":"Alice"}"#).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing parameters");
    }

    #[test]
    fn membership_flag_uses_truthiness() {
        let member = |flag: &str| {
            parse(&format!(r#"{{"userName":"A","isClubMember":{flag}}}"#))
                .unwrap()
                .is_member
        };

        assert!(!member("null"));
        assert!(!member("false"));
        assert!(!member("0"));
        assert!(!member(r#""""#));
        assert!(member("1"));
        assert!(member(r#""yes""#));
        assert!(member("{}"));
    }

    #[test]
    fn malformed_json_is_bad_request() {
        let err = parse("{not json").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid request body");
        assert!(err.details().is_some());
    }

    #[test]
    fn user_name_is_kept_verbatim() {
        let request = parse(r#"{"userName":"<Tom & Jerry>","isClubMember":false}"#).unwrap();
        assert_eq!(request.display_name, "<Tom & Jerry>");
    }
}
