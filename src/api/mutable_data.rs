//! `safeMutableData` and `safeMutableDataEntries`.

use std::collections::BTreeMap;

use tracing::debug;

use crate::binding::SafeBinding;
use crate::error::{BindingError, BindingResult};
use crate::handle::Handle;
use crate::native::ValueVersion;
use crate::readable::{readable, Readable};
use crate::resource::Resource;

/// The only emulation `emulateAs` knows about.
pub const NFS_EMULATION: &str = "NFS";

impl SafeBinding {
    pub async fn new_random_public(
        &self,
        app_handle: &Handle,
        type_tag: u64,
    ) -> BindingResult<Handle> {
        self.new_random_mutable_data(app_handle, type_tag, true).await
    }

    pub async fn new_random_private(
        &self,
        app_handle: &Handle,
        type_tag: u64,
    ) -> BindingResult<Handle> {
        self.new_random_mutable_data(app_handle, type_tag, false).await
    }

    /// Commit `entries` to the network. Resolves to the same handle.
    pub async fn quick_setup(
        &self,
        md_handle: &Handle,
        entries: BTreeMap<Vec<u8>, Vec<u8>>,
    ) -> BindingResult<Handle> {
        let md = self.registry.lookup(md_handle)?.into_mutable_data()?;
        md.quick_setup(entries).await?;
        Ok(md_handle.clone())
    }

    pub async fn get_name_and_tag(&self, md_handle: &Handle) -> BindingResult<(Vec<u8>, u64)> {
        let md = self.registry.lookup(md_handle)?.into_mutable_data()?;
        Ok(md.name_and_tag().await?)
    }

    pub async fn get_version(&self, md_handle: &Handle) -> BindingResult<u64> {
        let md = self.registry.lookup(md_handle)?.into_mutable_data()?;
        Ok(md.version().await?)
    }

    pub async fn md_get(&self, md_handle: &Handle, key: &[u8]) -> BindingResult<ValueVersion> {
        let md = self.registry.lookup(md_handle)?.into_mutable_data()?;
        Ok(md.get(key).await?)
    }

    pub async fn get_entries(&self, md_handle: &Handle) -> BindingResult<Handle> {
        let md = self.registry.lookup(md_handle)?.into_mutable_data()?;
        let entries = md.entries().await?;
        self.wrap(md_handle, Resource::Entries(entries))
    }

    /// View the mutable data through another interface. Only `"NFS"` is
    /// supported (case-insensitive); the emulation is owned by the data.
    pub async fn emulate_as(&self, md_handle: &Handle, emulation: &str) -> BindingResult<Handle> {
        let md = self.registry.lookup(md_handle)?.into_mutable_data()?;
        if !emulation.eq_ignore_ascii_case(NFS_EMULATION) {
            return Err(BindingError::UnsupportedEmulation(emulation.to_string()));
        }
        let nfs = md.emulate_as_nfs().await?;
        self.wrap(md_handle, Resource::Nfs(nfs))
    }

    pub async fn entries_len(&self, entries_handle: &Handle) -> BindingResult<u64> {
        let entries = self.registry.lookup(entries_handle)?.into_entries()?;
        Ok(entries.len().await?)
    }

    pub async fn entries_get(
        &self,
        entries_handle: &Handle,
        key: &[u8],
    ) -> BindingResult<ValueVersion> {
        let entries = self.registry.lookup(entries_handle)?.into_entries()?;
        Ok(entries.get(key).await?)
    }

    pub async fn entries_insert(
        &self,
        entries_handle: &Handle,
        key: &[u8],
        value: &[u8],
    ) -> BindingResult<()> {
        let entries = self.registry.lookup(entries_handle)?.into_entries()?;
        Ok(entries.insert(key, value).await?)
    }

    /// Every entry, one item each, then the end marker. A failing listing
    /// is delivered as the sequence's error item.
    pub async fn entries_for_each(
        &self,
        entries_handle: &Handle,
    ) -> BindingResult<Readable<(Vec<u8>, ValueVersion)>> {
        let entries = self.registry.lookup(entries_handle)?.into_entries()?;
        let (sink, items) = readable();
        match entries.list().await {
            Ok(list) => {
                debug!(entries = entries_handle.short(), count = list.len(), "forEach");
                for item in list {
                    sink.push(item);
                }
                sink.end();
            }
            Err(e) => sink.fail(e.into()),
        }
        Ok(items)
    }

    async fn new_random_mutable_data(
        &self,
        app_handle: &Handle,
        type_tag: u64,
        public: bool,
    ) -> BindingResult<Handle> {
        let app = self.registry.lookup_app(app_handle)?;
        let md = app.new_random_mutable_data(type_tag, public).await?;
        self.wrap(app_handle, Resource::MutableData(md))
    }
}
