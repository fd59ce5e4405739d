//! Response emission.
//!
//! Maps render outcomes onto transport responses: a successful capture
//! becomes a `200` PDF attachment, a pipeline failure becomes its category's
//! fixed status code with a structured `{error, detail}` body. Engine
//! internals never reach the caller beyond the error's short context chain.

use axum::{
    Json,
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use invoice_render::{Category, Error, PdfDocument};

pub const PDF_SIZE_HEADER: &str = "X-Generated-PDF-Size";

/// 200 response carrying the captured PDF
pub fn pdf_response(filename: &str, document: PdfDocument) -> Response {
    let length = document.len();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .header(PDF_SIZE_HEADER, length.to_string())
        .body(Body::from(document.into_bytes()))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Fixed-status rejection with a structured `{error}` body; `detail` is
/// included when present
pub fn rejection(status: StatusCode, error: &str, detail: Option<String>) -> Response {
    let body = match detail {
        Some(detail) => json!({ "error": error, "detail": detail }),
        None => json!({ "error": error }),
    };
    (status, Json(body)).into_response()
}

/// Map a pipeline failure onto its transport response
pub fn failure_response(err: &Error) -> Response {
    let status = match err.category() {
        Category::Validation => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    rejection(status, err.category().as_str(), Some(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_response_carries_the_contract_headers() {
        let document = PdfDocument::new(b"%PDF-1.4\n".to_vec());
        let response = pdf_response("INV-7.pdf", document);
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE.as_str()], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION.as_str()],
            "attachment; filename=\"INV-7.pdf\""
        );
        assert_eq!(headers[PDF_SIZE_HEADER], "9");
    }

    #[test]
    fn validation_failures_are_bad_requests() {
        let err = Error::validation("no target url");
        assert_eq!(failure_response(&err).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn pipeline_failures_are_internal_errors() {
        let err = Error::from(String::from("page blew up")).categorize(Category::Navigation);
        assert_eq!(
            failure_response(&err).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
