use crate::server::api;

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn to_http_string(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_code,
            self.status_text,
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

fn json_ok(body: String) -> HttpResponse {
    HttpResponse {
        status_code: 200,
        status_text: "OK",
        content_type: "application/json",
        body,
    }
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: serde_json::json!({ "status": "error", "message": message }).to_string(),
    }
}

fn from_api(result: Result<String, api::ApiError>) -> HttpResponse {
    match result {
        Ok(payload) => json_ok(payload),
        Err(api::ApiError::Parse(err)) => {
            error_response(400, "Bad Request", &format!("invalid request body: {err}"))
        }
        Err(api::ApiError::Validation(message)) => error_response(400, "Bad Request", &message),
        Err(api::ApiError::Internal(message)) => {
            error_response(500, "Internal Server Error", &message)
        }
    }
}

pub fn route_request(method: &str, path: &str, body: &str) -> HttpResponse {
    match (method, path) {
        ("GET", "/") | ("GET", "/api") => json_ok(api::service_payload()),
        ("GET", "/api/health") => from_api(api::health_payload()),
        ("GET", "/api/teams") => from_api(api::teams_payload()),
        ("GET", "/api/validate") => from_api(api::validate_payload()),
        ("POST", "/api/simulate") => from_api(api::simulate_payload(body)),
        ("POST", "/api/picklist") => from_api(api::picklist_payload(body)),
        ("POST", "/api/draft/setup") => from_api(api::draft_setup_payload(body)),
        ("POST", "/api/draft/pick") => from_api(api::draft_pick_payload(body)),
        ("POST", "/api/draft/decline") => from_api(api::draft_decline_payload(body)),
        ("POST", "/api/draft/finish") => from_api(api::draft_finish_payload(body)),
        ("POST", "/api/draft/flush") => from_api(api::draft_flush_payload(body)),
        _ => error_response(404, "Not Found", &format!("no route for {method} {path}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_route_returns_json() {
        let response = route_request("GET", "/api/health", "");
        assert_eq!(response.status_code, 200);
        assert_eq!(response.content_type, "application/json");
        let payload: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(payload["status"], "ok");
    }

    #[test]
    fn unknown_route_is_404() {
        let response = route_request("GET", "/api/nope", "");
        assert_eq!(response.status_code, 404);
    }

    #[test]
    fn malformed_simulate_body_is_400() {
        let response = route_request("POST", "/api/simulate", "{not json");
        assert_eq!(response.status_code, 400);
    }

    #[test]
    fn http_string_carries_content_length() {
        let response = json_ok("{}".to_string());
        let raw = response.to_http_string();
        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(raw.contains("Content-Length: 2\r\n"));
    }
}
