//! Status-code to user message table.

/// Message for a non-2xx response. Statuses without a fixed text prefer the
/// server's own message.
pub fn message_for_status(status: u16, server_message: Option<&str>) -> String {
    let server = server_message.map(str::trim).filter(|m| !m.is_empty());
    match status {
        400 => server.unwrap_or("invalid request parameters").to_string(),
        401 => "unauthorized".to_string(),
        403 => "forbidden".to_string(),
        404 => "requested resource not found".to_string(),
        500 => "internal server error".to_string(),
        502 => "bad gateway".to_string(),
        503 => "service unavailable".to_string(),
        other => match server {
            Some(m) => m.to_string(),
            None => format!("request failed ({})", other),
        },
    }
}

/// Pull a human message out of an error body: `message`, then `error`.
pub fn server_message(body: &serde_json::Value) -> Option<&str> {
    body.get("message").and_then(|v| v.as_str()).or_else(|| body.get("error").and_then(|v| v.as_str()))
}
