//! Handle registry: opaque tokens → native objects.
//!
//! Page script only ever sees [`Handle`]s. Every entry except an application
//! instance records the handle that owns it; freeing an entry frees everything
//! it transitively owns. Application instances also carry the tab group of the
//! page that created them so a closing tab can drop them in bulk.
//!
//! All operations take the table lock for their whole duration, except the
//! native release of an application, which runs with the lock dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::{BindingError, BindingResult};
use crate::handle::{Handle, TabGroupId};
use crate::native::NativeApp;
use crate::resource::Resource;

struct HandleEntry {
    /// `None` only for application instances.
    owner: Option<Handle>,
    resource: Resource,
    tab_group: Option<TabGroupId>,
}

#[derive(Default)]
pub struct HandleRegistry {
    entries: Mutex<HashMap<Handle, HandleEntry>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<Handle, HandleEntry>> {
        // A panic while holding the lock leaves the map itself consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new application instance as a root entry.
    pub fn allocate_app(&self, app: Arc<dyn NativeApp>, tab_group: Option<TabGroupId>) -> Handle {
        let mut table = self.table();
        let handle = fresh_handle(&table);
        debug!(handle = handle.short(), tab_group = ?tab_group, "allocated app handle");
        table.insert(
            handle.clone(),
            HandleEntry {
                owner: None,
                resource: Resource::App(app),
                tab_group,
            },
        );
        handle
    }

    /// Register `resource` as owned by `owner`. The new entry joins the
    /// owner's tab group.
    pub fn allocate(&self, owner: &Handle, resource: Resource) -> BindingResult<Handle> {
        if matches!(resource, Resource::App(_)) {
            return Err(BindingError::OwnedApplication);
        }
        let mut table = self.table();
        let tab_group = table
            .get(owner)
            .ok_or(BindingError::InvalidHandle)?
            .tab_group
            .clone();
        let handle = fresh_handle(&table);
        debug!(
            handle = handle.short(),
            owner = owner.short(),
            kind = %resource.kind(),
            "allocated handle"
        );
        table.insert(
            handle.clone(),
            HandleEntry {
                owner: Some(owner.clone()),
                resource,
                tab_group,
            },
        );
        Ok(handle)
    }

    pub fn lookup(&self, handle: &Handle) -> BindingResult<Resource> {
        self.table()
            .get(handle)
            .map(|e| e.resource.clone())
            .ok_or(BindingError::InvalidHandle)
    }

    pub fn lookup_app(&self, handle: &Handle) -> BindingResult<Arc<dyn NativeApp>> {
        self.lookup(handle)?.into_app()
    }

    pub fn contains(&self, handle: &Handle) -> bool {
        self.table().contains_key(handle)
    }

    /// Direct owner of a handle; `None` for application instances.
    pub fn owner(&self, handle: &Handle) -> BindingResult<Option<Handle>> {
        self.table()
            .get(handle)
            .map(|e| e.owner.clone())
            .ok_or(BindingError::InvalidHandle)
    }

    pub fn tab_group(&self, handle: &Handle) -> BindingResult<Option<TabGroupId>> {
        self.table()
            .get(handle)
            .map(|e| e.tab_group.clone())
            .ok_or(BindingError::InvalidHandle)
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Remove `handle` and everything it transitively owns.
    ///
    /// For an application instance, the native release runs after its children
    /// are gone. If that release fails the application's own entry is put back
    /// (the children stay freed) and [`BindingError::ResourceRelease`] is
    /// returned, so a later `free` can retry.
    ///
    /// Freeing an unknown handle fails with [`BindingError::InvalidHandle`].
    pub fn free(&self, handle: &Handle) -> BindingResult<()> {
        let (entry, cascaded) = {
            let mut table = self.table();
            let entry = table.remove(handle).ok_or(BindingError::InvalidHandle)?;
            let cascaded = cascade(&mut table, handle);
            (entry, cascaded)
        };
        debug!(
            handle = handle.short(),
            kind = %entry.resource.kind(),
            cascaded,
            "freed handle"
        );

        if let Resource::App(app) = &entry.resource {
            if let Err(e) = app.release() {
                warn!(handle = handle.short(), error = %e, "native release failed, restoring app handle");
                self.table().insert(handle.clone(), entry);
                return Err(BindingError::ResourceRelease(e));
            }
        }
        Ok(())
    }

    /// Free every application instance created by the given tab, cascading
    /// to what they own. Release failures are logged and leave the failing
    /// application registered. Returns how many applications were freed.
    pub fn free_group(&self, tab_group: &TabGroupId) -> usize {
        let apps: Vec<Handle> = self
            .table()
            .iter()
            .filter(|(_, e)| e.owner.is_none() && e.tab_group.as_ref() == Some(tab_group))
            .map(|(h, _)| h.clone())
            .collect();

        let mut freed = 0;
        for app in apps {
            match self.free(&app) {
                Ok(()) => freed += 1,
                // Already gone: a concurrent free got there first.
                Err(BindingError::InvalidHandle) => {}
                Err(e) => warn!(tab_group = %tab_group, handle = app.short(), error = %e, "could not free app"),
            }
        }
        debug!(tab_group = %tab_group, freed, "freed tab group");
        freed
    }
}

fn fresh_handle(table: &HashMap<Handle, HandleEntry>) -> Handle {
    loop {
        let handle = Handle::generate();
        if !table.contains_key(&handle) {
            return handle;
        }
    }
}

/// Remove every entry transitively owned by `root`. Returns the count removed.
fn cascade(table: &mut HashMap<Handle, HandleEntry>, root: &Handle) -> usize {
    let mut frontier = vec![root.clone()];
    let mut removed = 0;
    while let Some(parent) = frontier.pop() {
        let children: Vec<Handle> = table
            .iter()
            .filter(|(_, e)| e.owner.as_ref() == Some(&parent))
            .map(|(h, _)| h.clone())
            .collect();
        for child in children {
            table.remove(&child);
            frontier.push(child);
            removed += 1;
        }
    }
    removed
}
