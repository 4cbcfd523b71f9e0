use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use tracing::warn;

pub const MUTATION_PATH: &str = "/activities";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Anything other than `production`/`prod` counts as development.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|raw| raw.trim().to_ascii_lowercase()) {
            Some(raw) if raw == "production" || raw == "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

/// Accepts `true`, `1` or `yes` in any case; everything else is false.
pub fn is_truthy(value: Option<&str>) -> bool {
    value
        .map(|raw| {
            let raw = raw.trim();
            raw.eq_ignore_ascii_case("true") || raw == "1" || raw.eq_ignore_ascii_case("yes")
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Passthrough,
    Blocked,
}

/// Write policy, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteGate {
    pub environment: Environment,
    pub allow_production_writes: bool,
}

impl WriteGate {
    pub fn new(environment: Environment, allow_production_writes: bool) -> Self {
        Self {
            environment,
            allow_production_writes,
        }
    }

    pub fn development() -> Self {
        Self::new(Environment::Development, false)
    }

    pub fn writes_allowed(&self) -> bool {
        self.environment != Environment::Production || self.allow_production_writes
    }

    pub fn decide(&self, method: &Method, path: &str) -> GateDecision {
        if is_mutation(method) && targets_activities(path) && !self.writes_allowed() {
            GateDecision::Blocked
        } else {
            GateDecision::Passthrough
        }
    }
}

fn is_mutation(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn targets_activities(path: &str) -> bool {
    path == MUTATION_PATH
        || path
            .strip_prefix(MUTATION_PATH)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[derive(Debug, Serialize)]
struct BlockedBody {
    error: &'static str,
    hint: &'static str,
    environment: String,
}

pub async fn write_gate(State(gate): State<WriteGate>, request: Request, next: Next) -> Response {
    if gate.decide(request.method(), request.uri().path()) == GateDecision::Blocked {
        warn!(
            method = %request.method(),
            path = request.uri().path(),
            environment = %gate.environment,
            "write blocked by gate"
        );
        let body = BlockedBody {
            error: "Writing activities is only allowed in development mode",
            hint: "Set ALLOW_PRODUCTION_WRITES=true in the server environment to enable writes in production.",
            environment: gate.environment.to_string(),
        };
        return (StatusCode::FORBIDDEN, Json(body)).into_response();
    }

    next.run(request).await
}
