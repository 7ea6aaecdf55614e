//! `safeCrypto`, `safeCryptoKeyPair` and `safeCryptoKey`.

use crate::binding::SafeBinding;
use crate::error::BindingResult;
use crate::handle::Handle;
use crate::resource::Resource;

impl SafeBinding {
    pub async fn sha3_hash(&self, app_handle: &Handle, data: &[u8]) -> BindingResult<Vec<u8>> {
        let app = self.registry.lookup_app(app_handle)?;
        Ok(app.sha3_hash(data).await?)
    }

    /// The app's public signing key, as a handle owned by the app.
    pub async fn get_app_pub_sign_key(&self, app_handle: &Handle) -> BindingResult<Handle> {
        let app = self.registry.lookup_app(app_handle)?;
        let key = app.app_pub_sign_key().await?;
        self.wrap(app_handle, Resource::SignKey(key))
    }

    pub async fn generate_enc_key_pair(&self, app_handle: &Handle) -> BindingResult<Handle> {
        let app = self.registry.lookup_app(app_handle)?;
        let pair = app.generate_enc_key_pair().await?;
        self.wrap(app_handle, Resource::KeyPair(pair))
    }

    /// Owned by the key pair: freeing the pair frees this key too.
    pub async fn key_pair_get_pub_enc_key(&self, pair_handle: &Handle) -> BindingResult<Handle> {
        let pair = self.registry.lookup(pair_handle)?.into_key_pair()?;
        self.wrap(pair_handle, Resource::PubEncKey(pair.pub_enc_key()))
    }

    pub async fn key_pair_get_sec_enc_key(&self, pair_handle: &Handle) -> BindingResult<Handle> {
        let pair = self.registry.lookup(pair_handle)?.into_key_pair()?;
        self.wrap(pair_handle, Resource::SecEncKey(pair.sec_enc_key()))
    }

    pub async fn key_pair_decrypt_sealed(
        &self,
        pair_handle: &Handle,
        cipher: &[u8],
    ) -> BindingResult<Vec<u8>> {
        let pair = self.registry.lookup(pair_handle)?.into_key_pair()?;
        Ok(pair.decrypt_sealed(cipher).await?)
    }

    /// Raw bytes of a signing or encryption key.
    pub async fn key_get_raw(&self, key_handle: &Handle) -> BindingResult<Vec<u8>> {
        let key = self.registry.lookup(key_handle)?.into_key()?;
        Ok(key.raw().await?)
    }
}
