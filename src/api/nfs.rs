//! `safeNfs` and `safeNfsFile`.

use crate::binding::SafeBinding;
use crate::error::BindingResult;
use crate::handle::Handle;
use crate::native::FileMetadata;
use crate::resource::Resource;

impl SafeBinding {
    /// New, not yet inserted file. Owned by the NFS emulation.
    pub async fn nfs_create(&self, nfs_handle: &Handle, content: &[u8]) -> BindingResult<Handle> {
        let nfs = self.registry.lookup(nfs_handle)?.into_nfs()?;
        let file = nfs.create(content).await?;
        self.wrap(nfs_handle, Resource::File(file))
    }

    pub async fn nfs_fetch(&self, nfs_handle: &Handle, name: &str) -> BindingResult<Handle> {
        let nfs = self.registry.lookup(nfs_handle)?.into_nfs()?;
        let file = nfs.fetch(name).await?;
        self.wrap(nfs_handle, Resource::File(file))
    }

    /// Store `file_handle` under `name`. Resolves to the file handle.
    pub async fn nfs_insert(
        &self,
        nfs_handle: &Handle,
        name: &str,
        file_handle: &Handle,
    ) -> BindingResult<Handle> {
        let nfs = self.registry.lookup(nfs_handle)?.into_nfs()?;
        let file = self.registry.lookup(file_handle)?.into_file()?;
        nfs.insert(name, file).await?;
        Ok(file_handle.clone())
    }

    pub async fn nfs_update(
        &self,
        nfs_handle: &Handle,
        name: &str,
        file_handle: &Handle,
        version: u64,
    ) -> BindingResult<Handle> {
        let nfs = self.registry.lookup(nfs_handle)?.into_nfs()?;
        let file = self.registry.lookup(file_handle)?.into_file()?;
        nfs.update(name, file, version).await?;
        Ok(file_handle.clone())
    }

    pub async fn file_size(&self, file_handle: &Handle) -> BindingResult<u64> {
        let file = self.registry.lookup(file_handle)?.into_file()?;
        Ok(file.size().await?)
    }

    pub async fn file_read(
        &self,
        file_handle: &Handle,
        position: u64,
        len: u64,
    ) -> BindingResult<Vec<u8>> {
        let file = self.registry.lookup(file_handle)?.into_file()?;
        Ok(file.read(position, len).await?)
    }

    pub async fn file_write(&self, file_handle: &Handle, content: &[u8]) -> BindingResult<()> {
        let file = self.registry.lookup(file_handle)?.into_file()?;
        Ok(file.write(content).await?)
    }

    pub async fn file_close(&self, file_handle: &Handle) -> BindingResult<()> {
        let file = self.registry.lookup(file_handle)?.into_file()?;
        Ok(file.close().await?)
    }

    pub async fn file_metadata(&self, file_handle: &Handle) -> BindingResult<FileMetadata> {
        Ok(self.registry.lookup(file_handle)?.into_file()?.metadata())
    }
}
