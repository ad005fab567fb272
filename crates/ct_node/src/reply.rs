// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! Uniform JSON replies for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error_message: &'a str,
    success: bool,
}

/// Sends a JSON error envelope with the given status code.
pub(crate) fn send_error(code: StatusCode, msg: &str) -> Response {
    (
        code,
        Json(ErrorBody {
            error_message: msg,
            success: false,
        }),
    )
        .into_response()
}

/// Sends a JSON reply; `Json` sets the content type.
pub(crate) fn send_json_reply<T: Serialize>(code: StatusCode, body: &T) -> Response {
    (code, Json(body)).into_response()
}
