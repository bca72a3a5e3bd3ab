//! Request models and request identification.
//!
//! # Responsibilities
//! - Define the search request body and validate it before any query work
//! - Generate a UUID request ID for every request
//!
//! # Design Decisions
//! - Length is counted in characters, not bytes
//! - Leading/trailing whitespace is significant for matching but a blank
//!   string is rejected
//! - Request ID added as early as possible for tracing

use axum::http::{HeaderValue, Request};
use serde::{Deserialize, Serialize};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::error::FieldViolation;
use crate::store::{Dataset, MatchQuery};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Body of `POST /password` and `POST /username`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchRequest {
    pub query_string: String,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default)]
    pub include_substring_matches: bool,
}

impl SearchRequest {
    /// Check the request against the configured length bound.
    pub fn validate(&self, max_chars: usize) -> Result<(), Vec<FieldViolation>> {
        const FIELD: &str = "query_string";
        let mut violations = Vec::new();
        let chars = self.query_string.chars().count();

        if chars == 0 {
            violations.push(FieldViolation::body(
                FIELD,
                "string_too_short",
                "String should have at least 1 character",
            ));
        } else if chars > max_chars {
            violations.push(FieldViolation::body(
                FIELD,
                "string_too_long",
                format!("String should have at most {max_chars} characters"),
            ));
        } else if self.query_string.trim().is_empty() {
            violations.push(FieldViolation::body(
                FIELD,
                "string_blank",
                "String should not be blank",
            ));
        }

        // A NUL would cut the statement text short inside the engine.
        if self.query_string.contains('\0') {
            violations.push(FieldViolation::body(
                FIELD,
                "string_nul",
                "String should not contain NUL characters",
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    pub fn into_query(self, dataset: Dataset) -> MatchQuery {
        MatchQuery::new(dataset, self.query_string)
            .ignore_case(self.ignore_case)
            .substring(self.include_substring_matches)
    }
}

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(query: &str) -> SearchRequest {
        SearchRequest {
            query_string: query.to_string(),
            ignore_case: false,
            include_substring_matches: false,
        }
    }

    fn kinds(result: Result<(), Vec<FieldViolation>>) -> Vec<&'static str> {
        result.unwrap_err().into_iter().map(|v| v.kind).collect()
    }

    #[test]
    fn flags_default_to_false() {
        let parsed: SearchRequest = serde_json::from_str(r#"{"query_string":"abc"}"#).unwrap();
        assert_eq!(parsed, request("abc"));
    }

    #[test]
    fn accepts_bounds() {
        assert!(request("a").validate(1000).is_ok());
        assert!(request(&"x".repeat(1000)).validate(1000).is_ok());
        assert!(request(" padded ").validate(1000).is_ok());
    }

    #[test]
    fn rejects_empty_and_too_long() {
        assert_eq!(kinds(request("").validate(1000)), vec!["string_too_short"]);
        assert_eq!(
            kinds(request(&"x".repeat(1001)).validate(1000)),
            vec!["string_too_long"]
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 1000 two-byte characters is within the bound.
        assert!(request(&"é".repeat(1000)).validate(1000).is_ok());
        assert!(request(&"é".repeat(1001)).validate(1000).is_err());
    }

    #[test]
    fn rejects_blank_and_nul() {
        assert_eq!(kinds(request("   ").validate(1000)), vec!["string_blank"]);
        assert_eq!(kinds(request("ab\0c").validate(1000)), vec!["string_nul"]);
    }

    #[test]
    fn markup_is_valid_input() {
        assert!(request("<script>alert('xss')</script>").validate(1000).is_ok());
    }

    #[test]
    fn into_query_maps_flags() {
        let query = SearchRequest {
            query_string: "Admin".into(),
            ignore_case: true,
            include_substring_matches: true,
        }
        .into_query(Dataset::Usernames);
        assert_eq!(
            query,
            MatchQuery::new(Dataset::Usernames, "Admin")
                .ignore_case(true)
                .substring(true)
        );
    }

    #[test]
    fn request_ids_are_uuids() {
        let req = Request::new(());
        let id = UuidRequestId.make_request_id(&req).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());
    }
}
