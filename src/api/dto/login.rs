use serde::Deserialize;

/// Body of `POST /api/login`: the code returned by the client-side auth flow.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub code: Option<String>,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<&str, &'static str> {
        self.code
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or("Auth code is required")
    }
}
