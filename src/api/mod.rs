//! Page-facing operations.
//!
//! Each submodule adds methods to [`SafeBinding`] for one API object exposed
//! to page script (`safeApp`, `safeCrypto`, `safeMutableData`, `safeNfs`, ...).
//! They look handles up, forward to the native library, and mint handles for
//! any native objects that come back. See [`crate::manifest`] for how each
//! method is exposed.

pub mod app;
pub mod crypto;
pub mod mutable_data;
pub mod nfs;

use crate::binding::SafeBinding;
use crate::error::BindingResult;
use crate::handle::Handle;
use crate::resource::Resource;

impl SafeBinding {
    /// `free` for every API object: drops the handle and all it owns.
    pub fn free(&self, handle: &Handle) -> BindingResult<()> {
        self.registry.free(handle)
    }

    /// Mint a handle for an object produced through `owner`.
    pub(crate) fn wrap(&self, owner: &Handle, resource: Resource) -> BindingResult<Handle> {
        self.registry.allocate(owner, resource)
    }
}
