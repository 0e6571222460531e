use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::net::Response;

/// A response as kept in a cache bucket. The body is stored byte-exact and
/// handed back verbatim on a hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Kept out of the metadata; backends store it on its own.
    #[serde(skip)]
    pub body: Vec<u8>,
    pub cached_at: DateTime<Utc>,
}

impl StoredResponse {
    pub fn from_response(response: Response) -> Self {
        Self {
            url: response.url,
            status: response.status,
            headers: response.headers,
            body: response.body,
            cached_at: Utc::now(),
        }
    }

    pub fn to_response(&self) -> Response {
        Response {
            url: self.url.clone(),
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}
