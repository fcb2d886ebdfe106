/*!
The registry maps every [`Pid`] of an engine to the process registered under it.

It's the only piece of shared mutable state in the runtime. All lookups, insertions and removals
go through it, and a reader always observes either the previous or the new entry of a pid.
*/

use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use log::{trace, warn};

use crate::{Pid, Process};

#[derive(Default)]
pub struct Registry {
    processes: DashMap<Pid, Arc<dyn Process>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the process under its own pid.
    ///
    /// The pid must be vacant. If another process is already registered under it, nothing is
    /// changed and `false` is returned.
    pub fn add(&self, process: Arc<dyn Process>) -> bool {
        let pid = process.pid().clone();
        match self.processes.entry(pid) {
            Entry::Occupied(entry) => {
                warn!("Process {} is already registered", entry.key());
                #[cfg(feature = "metrics")]
                metrics::increment_counter!("troupe.registry.duplicates");
                false
            }
            Entry::Vacant(entry) => {
                trace!("Process {} registered", entry.key());
                entry.insert(process);
                #[cfg(feature = "metrics")]
                metrics::gauge!("troupe.registry.size", self.processes.len() as f64);
                true
            }
        }
    }

    pub fn get(&self, pid: &Pid) -> Option<Arc<dyn Process>> {
        self.processes.get(pid).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, pid: &Pid) -> Option<Arc<dyn Process>> {
        let removed = self.processes.remove(pid).map(|(_, process)| process);
        if removed.is_some() {
            trace!("Process {} removed from registry", pid);
            #[cfg(feature = "metrics")]
            metrics::gauge!("troupe.registry.size", self.processes.len() as f64);
        }
        removed
    }

    pub fn contains(&self, pid: &Pid) -> bool {
        self.processes.contains_key(pid)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}
