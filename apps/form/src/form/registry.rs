//! One `ApplicationForm` per visitor, keyed by the id kept in their session.
//!
//! Forms idle for longer than the configured timeout are evicted when a new
//! one is created, and the map never holds more than `capacity` forms. A form
//! with a submission in flight is never evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::form::ApplicationForm;
use crate::submit_client::Submitter;

struct Entry {
    form: Arc<ApplicationForm>,
    last_seen: Instant,
}

pub struct FormRegistry {
    forms: Mutex<HashMap<Uuid, Entry>>,
    submitter: Arc<dyn Submitter>,
    idle_timeout: Duration,
    capacity: usize,
}

impl FormRegistry {
    pub fn new(submitter: Arc<dyn Submitter>, idle_timeout: Duration, capacity: usize) -> Self {
        Self {
            forms: Mutex::new(HashMap::new()),
            submitter,
            idle_timeout,
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.forms.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The visitor's form, if one exists.
    pub fn get(&self, id: Uuid) -> Option<Arc<ApplicationForm>> {
        let mut forms = self.lock();
        let entry = forms.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(entry.form.clone())
    }

    /// The visitor's form, created empty on first use or after eviction.
    pub fn get_or_create(&self, id: Uuid) -> Arc<ApplicationForm> {
        let now = Instant::now();
        let mut forms = self.lock();
        if let Some(entry) = forms.get_mut(&id) {
            entry.last_seen = now;
            return entry.form.clone();
        }

        self.evict(&mut forms, now);

        let form = Arc::new(ApplicationForm::new(self.submitter.clone()));
        forms.insert(
            id,
            Entry {
                form: form.clone(),
                last_seen: now,
            },
        );
        form
    }

    /// Drops idle forms, then the least recently seen ones until a new form fits.
    fn evict(&self, forms: &mut HashMap<Uuid, Entry>, now: Instant) {
        let before = forms.len();

        forms.retain(|_, entry| {
            entry.form.is_submitting() || now.duration_since(entry.last_seen) < self.idle_timeout
        });

        while forms.len() >= self.capacity {
            let oldest = forms
                .iter()
                .filter(|(_, entry)| !entry.form.is_submitting())
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    forms.remove(&id);
                }
                // Every held form is busy; let the map grow past capacity.
                None => break,
            }
        }

        let evicted = before - forms.len();
        if evicted > 0 {
            debug!("Evicted {evicted} visitor forms, {} remain", forms.len());
        }
    }
}
