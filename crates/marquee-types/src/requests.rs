//! Client payloads accepted by the gateway.
//!
//! [`SearchRequest`] is the only message a client sends over the search
//! socket. [`AuthSettings`] carries the backend connection parameters a
//! client supplies when registering a session.

use serde::{Deserialize, Serialize};

/// One incoming search socket message.
///
/// Both fields are required and unknown fields are rejected, so a typo
/// in a client surfaces as a malformed request rather than a silent
/// fresh query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchRequest {
    /// Search text. Ignored when `next_page` is set.
    pub query: String,
    /// Advance the current query's pagination instead of starting a new query.
    #[serde(rename = "nextPage")]
    pub next_page: bool,
}

impl SearchRequest {
    /// Decode a raw socket text frame.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Connection parameters for a Db2 content database.
///
/// Decoded from the query string of `GET /register`, or from the
/// `content.shared_db2` section of the configuration file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    /// Database host name or address.
    pub hostname: String,
    /// Database name.
    pub database: String,
    /// Db2 wire protocol port.
    pub db_port: u16,
    /// Db2 REST service port.
    pub rest_port: u16,
    /// Whether to use TLS for both the database and REST connections.
    #[serde(default)]
    pub ssl: bool,
    /// Database password.
    pub password: String,
    /// Database user name.
    pub username: String,
    /// Lifetime of the REST access token, e.g. `"1h"`.
    #[serde(default = "default_expiry_time")]
    pub expiry_time: String,
}

fn default_expiry_time() -> String {
    String::from("1h")
}

impl core::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("hostname", &self.hostname)
            .field("database", &self.database)
            .field("db_port", &self.db_port)
            .field("rest_port", &self.rest_port)
            .field("ssl", &self.ssl)
            .field("password", &"<redacted>")
            .field("username", &self.username)
            .field("expiry_time", &self.expiry_time)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_query_message() {
        let req = SearchRequest::decode(r#"{"query":"matrix","nextPage":false}"#).unwrap();
        assert_eq!(req.query, "matrix");
        assert!(!req.next_page);
    }

    #[test]
    fn missing_field_is_malformed() {
        assert!(SearchRequest::decode(r#"{"query":"matrix"}"#).is_err());
        assert!(SearchRequest::decode(r#"{"nextPage":true}"#).is_err());
    }

    #[test]
    fn unknown_field_is_malformed() {
        let text = r#"{"query":"matrix","nextPage":false,"page":3}"#;
        assert!(SearchRequest::decode(text).is_err());
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(SearchRequest::decode("matrix").is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let settings = AuthSettings {
            hostname: String::from("db.local"),
            database: String::from("movies"),
            db_port: 50000,
            rest_port: 50050,
            ssl: false,
            password: String::from("hunter2"),
            username: String::from("db2inst1"),
            expiry_time: default_expiry_time(),
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("db2inst1"));
    }

    #[test]
    fn expiry_time_defaults_when_absent() {
        let json = r#"{
            "hostname": "db.local", "database": "movies", "dbPort": 50000,
            "restPort": 50050, "password": "pw", "username": "user"
        }"#;
        let settings: AuthSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.expiry_time, "1h");
        assert!(!settings.ssl);
    }
}
