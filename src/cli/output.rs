use serde::Serialize;

use crate::model::event::ChangeEvent;
use crate::model::schema::{CanonicalSchema, FieldPolicy};
use crate::model::value::PrefValue;
use crate::ops::notify::Notification;
use crate::ops::session::Session;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ReconcileJson<'a> {
    pub changed: bool,
    pub persisted: bool,
    pub events: &'a [ChangeEvent],
    pub notifications: &'a [Notification],
}

#[derive(Serialize)]
pub struct PolicyJson {
    pub path: String,
    pub policy: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<PrefValue>,
}

#[derive(Serialize)]
pub struct SchemaJson {
    pub defaults: PrefValue,
    pub policies: Vec<PolicyJson>,
}

pub fn reconcile_json(session: &Session) -> ReconcileJson<'_> {
    ReconcileJson {
        changed: !session.events.is_empty(),
        persisted: session.persisted,
        events: &session.events,
        notifications: &session.notifications,
    }
}

pub fn schema_json(schema: &CanonicalSchema) -> SchemaJson {
    let policies = schema
        .policies()
        .map(|(path, policy)| PolicyJson {
            path: path.to_string(),
            policy: policy.name(),
            baseline: match policy {
                FieldPolicy::PreserveIfDiverged { baseline } => Some(baseline.clone()),
                _ => None,
            },
        })
        .collect();
    SchemaJson {
        defaults: schema.default_tree(),
        policies,
    }
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

/// One line per notification, then a status line.
pub fn format_reconcile_text(session: &Session, dry_run: bool) -> String {
    let mut out = String::new();
    for n in &session.notifications {
        out.push_str(&n.message);
        out.push('\n');
    }
    let status = match (session.events.len(), session.persisted, dry_run) {
        (0, _, _) => "preferences are up to date".to_string(),
        (n, _, true) => format!("{} change(s) found (dry run, nothing written)", n),
        (n, true, false) => format!("{} change(s) applied", n),
        (n, false, false) => format!("{} change(s) found", n),
    };
    out.push_str(&status);
    out.push('\n');
    out
}

pub fn format_schema_text(schema: &CanonicalSchema) -> String {
    let mut out = String::new();
    for (key, value) in schema.defaults() {
        out.push_str(&format!("{} = {}\n", key, value));
    }
    let mut policies = schema.policies().peekable();
    if policies.peek().is_some() {
        out.push_str("\npolicies:\n");
        for (path, policy) in policies {
            out.push_str(&format!("  {}: {}\n", path, policy.name()));
        }
    }
    out
}
