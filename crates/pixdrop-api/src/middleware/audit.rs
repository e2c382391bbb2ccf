//! Security audit logging
//!
//! Structured audit entries for security-relevant events:
//! - Authentication attempts (success/failure)
//! - Stored uploads
//! - Cleanup deletions

use serde::Serialize;

/// Audit event types for categorization
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    AuthenticationSuccess,
    AuthenticationFailure,
    FileUploaded,
    FileDeleted,
}

/// Structured audit log entry
#[derive(Debug, Serialize)]
pub struct AuditLogEntry {
    /// Timestamp of the event
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Type of audit event
    pub event_type: AuditEventType,
    /// Verified subject (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Client IP address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    /// User agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Object path the event refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_path: Option<String>,
    /// Event details (JSON object)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Success or failure
    pub success: bool,
    /// Error message (if failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AuditLogEntry {
    /// Create a new audit log entry
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            event_type,
            subject: None,
            client_ip: None,
            user_agent: None,
            object_path: None,
            details: None,
            success: true,
            error_message: None,
        }
    }

    pub fn with_subject_opt(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }

    pub fn with_client_ip_opt(mut self, client_ip: Option<String>) -> Self {
        self.client_ip = client_ip;
        self
    }

    pub fn with_user_agent_opt(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_object_path(mut self, object_path: impl Into<String>) -> Self {
        self.object_path = Some(object_path.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failure
    pub fn with_failure(mut self, error_message: String) -> Self {
        self.success = false;
        self.error_message = Some(error_message);
        self
    }

    /// Log the audit entry
    ///
    /// Uses structured logging with the `audit` target for easy filtering
    pub fn log(&self) {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());

        if self.success {
            tracing::event!(
                target: "audit",
                tracing::Level::INFO,
                audit_entry = %json,
                event_type = ?self.event_type,
                subject = ?self.subject,
                object_path = ?self.object_path,
                success = self.success,
                "Security audit log"
            );
        } else {
            tracing::event!(
                target: "audit",
                tracing::Level::WARN,
                audit_entry = %json,
                event_type = ?self.event_type,
                subject = ?self.subject,
                object_path = ?self.object_path,
                success = self.success,
                error = ?self.error_message,
                "Security audit log - failure"
            );
        }
    }
}

/// Log authentication attempt
pub fn log_authentication_attempt(
    subject: Option<String>,
    client_ip: Option<String>,
    user_agent: Option<String>,
    success: bool,
    error_message: Option<String>,
) {
    let event_type = if success {
        AuditEventType::AuthenticationSuccess
    } else {
        AuditEventType::AuthenticationFailure
    };

    let mut entry = AuditLogEntry::new(event_type)
        .with_subject_opt(subject)
        .with_client_ip_opt(client_ip)
        .with_user_agent_opt(user_agent);

    if !success {
        entry = entry
            .with_failure(error_message.unwrap_or_else(|| "Authentication failed".to_string()));
    }

    entry.log();
}

/// Log a stored upload
pub fn log_file_uploaded(subject: &str, object_path: &str, size_bytes: u64, replaced: bool) {
    AuditLogEntry::new(AuditEventType::FileUploaded)
        .with_subject_opt(Some(subject.to_string()))
        .with_object_path(object_path)
        .with_details(serde_json::json!({
            "size_bytes": size_bytes,
            "replaced": replaced,
        }))
        .log();
}

/// Log a cleanup deletion
pub fn log_file_deleted(object_path: &str, record_id: Option<&str>, error: Option<String>) {
    let mut entry = AuditLogEntry::new(AuditEventType::FileDeleted).with_object_path(object_path);

    if let Some(record_id) = record_id {
        entry = entry.with_details(serde_json::json!({ "record_id": record_id }));
    }
    if let Some(error) = error {
        entry = entry.with_failure(error);
    }

    entry.log();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_entry_serializes_error_and_skips_empty_fields() {
        let entry = AuditLogEntry::new(AuditEventType::AuthenticationFailure)
            .with_failure("Missing authorization header".to_string());

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event_type"], "authentication_failure");
        assert_eq!(json["success"], false);
        assert_eq!(json["error_message"], "Missing authorization header");
        assert!(json.get("subject").is_none());
        assert!(json.get("object_path").is_none());
    }
}
