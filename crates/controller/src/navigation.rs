//! Navigation targets the controller can leave through.

use serde::Serialize;

/// Structured payload for the error view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub status: u16,
    pub error: String,
    pub message: String,
}

impl ErrorPayload {
    /// Payload shown when no identity is stored.
    pub fn unauthorized() -> Self {
        Self {
            status: 401,
            error: "Unauthorized".to_string(),
            message: "Please login to continue.".to_string(),
        }
    }
}

/// Views reachable from the loading controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// The chat view. Entered only after the job reports `READY`.
    Chat,
    /// Out-of-band failure.
    Error(ErrorPayload),
}

/// Performs one-way view transitions on behalf of the controller.
pub trait Navigator: Send + Sync {
    fn navigate(&self, view: View);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_payload() {
        let payload = ErrorPayload::unauthorized();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], 401);
        assert_eq!(json["error"], "Unauthorized");
        assert_eq!(json["message"], "Please login to continue.");
    }
}
