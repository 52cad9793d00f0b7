use std::time::Duration;

use tracing::{info, warn};

use crate::io::lock::StoreLock;
use crate::io::recovery;
use crate::io::state_io::{self, StoredState};
use crate::io::store::{Store, StoreError};
use crate::model::event::ChangeEvent;
use crate::model::schema::CanonicalSchema;
use crate::model::value::PrefValue;
use crate::ops::notify::{self, Notification};
use crate::ops::reconcile::reconcile;

#[derive(Debug, Clone, Copy, Default)]
pub struct BootstrapOptions {
    /// Reconcile and report, but leave the store untouched.
    pub dry_run: bool,
}

/// The installed preference state for one session.
#[derive(Debug, Clone)]
pub struct Session {
    /// The live preference tree.
    pub prefs: PrefValue,
    pub events: Vec<ChangeEvent>,
    /// One per event, in event order.
    pub notifications: Vec<Notification>,
    /// Whether the reconciled tree was written back.
    pub persisted: bool,
}

/// Load the stored preferences, reconcile them against `schema`, write the
/// result back if anything structural changed, and report what changed.
///
/// The store lock is held across load and write so no other session can
/// interleave. An unparseable state file is copied to the recovery log once
/// and treated as a first run; the file itself is left as it was.
pub fn bootstrap(
    store: &Store,
    schema: &CanonicalSchema,
    options: BootstrapOptions,
) -> Result<Session, StoreError> {
    let _lock = StoreLock::acquire_default(&store.dir)?;
    let state_path = store.state_path();
    let state_file = store.config.storage.state_file.as_str();

    let persisted = match state_io::read_state(&state_path)? {
        StoredState::Absent => None,
        StoredState::Parsed(tree) => Some(tree),
        StoredState::Unparseable { raw, error } => {
            warn!(path = %state_path.display(), %error, "state file is not valid JSON, starting from defaults");
            if !options.dry_run && !recovery::unparseable_already_logged(&store.dir, &raw) {
                recovery::log_unparseable(&store.dir, state_file, &raw, &error);
            }
            None
        }
    };

    let result = reconcile(persisted, schema);

    if !options.dry_run {
        for discarded in &result.discarded {
            recovery::log_discarded(&store.dir, state_file, discarded);
        }
    }

    let persisted = result.changed() && !options.dry_run;
    if persisted {
        state_io::write_state(&state_path, &result.tree)?;
        info!(path = %state_path.display(), events = result.events.len(), "preferences migrated");
    }

    let duration = Duration::from_millis(store.config.notify.duration_ms);
    Ok(Session {
        notifications: notify::notifications(&result.events, duration),
        prefs: result.tree,
        events: result.events,
        persisted,
    })
}
