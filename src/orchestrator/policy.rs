//! How a failed Gateway call degrades.

use crate::feed::ActivityFeed;
use crate::gateway::GatewayError;
use crate::model::Message;

pub const CHAT_FALLBACK: &str =
    "Q/A and RAG currently not supported. Will be available in the next version";

/// Chosen at each call site and carried with the call until it settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Ambient data (registry loads, status polls): log only, state untouched.
    Background(&'static str),
    /// Operator action: feed notice `⚠️ <label> failed: <detail>`.
    Action(&'static str),
    /// Best-effort feature: fixed feed notice, raw error only logged.
    Degraded,
}

impl FailurePolicy {
    pub(crate) fn report(self, err: &GatewayError, feed: &mut ActivityFeed) {
        match self {
            FailurePolicy::Background(what) => {
                tracing::warn!(what, status = ?err.status(), error = %err, "background fetch failed");
            }
            FailurePolicy::Action(label) => {
                tracing::warn!(action = label, status = ?err.status(), error = %err, "action failed");
                feed.append(Message::assistant(format!("⚠️ {label} failed: {err}")));
            }
            FailurePolicy::Degraded => {
                tracing::warn!(status = ?err.status(), error = %err, "chat relay failed");
                feed.append(Message::assistant(CHAT_FALLBACK));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_err(message: &str) -> GatewayError {
        GatewayError::Status {
            status: 400,
            message: message.to_string(),
        }
    }

    #[test]
    fn background_failures_stay_out_of_the_feed() {
        let mut feed = ActivityFeed::default();
        FailurePolicy::Background("notebooks").report(&status_err("x"), &mut feed);
        assert!(feed.is_empty());
    }

    #[test]
    fn action_failures_carry_prefixed_detail() {
        let mut feed = ActivityFeed::default();
        FailurePolicy::Action("Summary").report(&status_err("bad log"), &mut feed);
        assert_eq!(
            feed.last().map(|m| m.content.as_str()),
            Some("⚠️ Summary failed: bad log")
        );
    }

    #[test]
    fn degraded_failures_hide_the_raw_error() {
        let mut feed = ActivityFeed::default();
        FailurePolicy::Degraded.report(&status_err("stack trace here"), &mut feed);
        let last = feed.last().map(|m| m.content.as_str());
        assert_eq!(last, Some(CHAT_FALLBACK));
    }
}
