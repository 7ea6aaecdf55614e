//! The native SAFE library, seen from the binding.
//!
//! The binding never implements storage, networking or cryptography itself.
//! It forwards arguments to these traits and wraps whatever objects come back
//! into handles. An embedder provides the real implementation; tests provide
//! in-memory ones.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NativeError;

/// Result type of every native call.
pub type NativeResult<T> = Result<T, NativeError>;

/// Container name → permission names, e.g. `{"_public": ["Insert"]}`.
pub type ContainerPermissions = BTreeMap<String, Vec<String>>;

/// Information identifying the web application to the Authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub id: String,
    pub name: String,
    pub vendor: String,
    /// URL of the page that created the app; stamped by the binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitOptions {
    /// Enable the native library's own log file.
    #[serde(default)]
    pub enable_log: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthOptions {
    /// Ask the Authenticator to create the app's own container.
    #[serde(default)]
    pub own_container: bool,
}

/// One entry of an `authoriseShareMd` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareMdPermission {
    pub type_tag: u64,
    pub name: Vec<u8>,
    pub perms: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkState {
    Init,
    Connected,
    Disconnected,
}

/// Receives network state changes for one application instance.
pub type NetworkObserver = Box<dyn Fn(NetworkState) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueVersion {
    pub buf: Vec<u8>,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub data_map_name: Vec<u8>,
    pub created: String,
    pub modified: String,
    pub size: u64,
    pub version: u64,
}

/// Entry point of the native library.
#[async_trait]
pub trait NativeLibrary: Send + Sync {
    /// Create an application instance that is not yet connected to the network.
    async fn initialise_app(
        &self,
        info: AppInfo,
        options: InitOptions,
        observer: NetworkObserver,
    ) -> NativeResult<Arc<dyn NativeApp>>;
}

/// The root native context: one session with the network.
#[async_trait]
pub trait NativeApp: Send + Sync {
    /// Encode an unregistered connection request for the Authenticator.
    async fn gen_conn_uri(&self) -> NativeResult<String>;

    async fn gen_auth_uri(
        &self,
        permissions: &ContainerPermissions,
        options: &AuthOptions,
    ) -> NativeResult<String>;

    async fn gen_container_auth_uri(
        &self,
        permissions: &ContainerPermissions,
    ) -> NativeResult<String>;

    async fn gen_share_mdata_uri(&self, permissions: &[ShareMdPermission]) -> NativeResult<String>;

    /// Connect using a URI granted by the Authenticator.
    async fn login_from_uri(&self, uri: &str) -> NativeResult<()>;

    fn is_registered(&self) -> bool;

    fn network_state(&self) -> NetworkState;

    async fn can_access_container(&self, name: &str, permissions: &[String]) -> NativeResult<bool>;

    async fn refresh_containers_permissions(&self) -> NativeResult<()>;

    async fn get_containers_permissions(&self) -> NativeResult<ContainerPermissions>;

    async fn get_own_container(&self) -> NativeResult<Arc<dyn MutableData>>;

    async fn get_container(&self, name: &str) -> NativeResult<Arc<dyn MutableData>>;

    /// Resolve a `safe://` URL and return the file's content.
    async fn web_fetch(&self, url: &str) -> NativeResult<Vec<u8>>;

    async fn reconnect(&self) -> NativeResult<()>;

    async fn log_path(&self, filename: Option<&str>) -> NativeResult<String>;

    async fn new_random_mutable_data(
        &self,
        type_tag: u64,
        public: bool,
    ) -> NativeResult<Arc<dyn MutableData>>;

    async fn sha3_hash(&self, data: &[u8]) -> NativeResult<Vec<u8>>;

    async fn app_pub_sign_key(&self) -> NativeResult<Arc<dyn KeyMaterial>>;

    async fn generate_enc_key_pair(&self) -> NativeResult<Arc<dyn EncKeyPair>>;

    /// Explicitly release the native context. Called once all handles the app
    /// owns are gone. If this fails the app's handle stays live so the page
    /// can retry.
    fn release(&self) -> NativeResult<()> {
        Ok(())
    }
}

#[async_trait]
pub trait MutableData: Send + Sync {
    async fn quick_setup(&self, entries: BTreeMap<Vec<u8>, Vec<u8>>) -> NativeResult<()>;

    async fn name_and_tag(&self) -> NativeResult<(Vec<u8>, u64)>;

    async fn version(&self) -> NativeResult<u64>;

    async fn get(&self, key: &[u8]) -> NativeResult<ValueVersion>;

    async fn entries(&self) -> NativeResult<Arc<dyn Entries>>;

    async fn emulate_as_nfs(&self) -> NativeResult<Arc<dyn Nfs>>;
}

#[async_trait]
pub trait Entries: Send + Sync {
    async fn len(&self) -> NativeResult<u64>;

    async fn get(&self, key: &[u8]) -> NativeResult<ValueVersion>;

    async fn insert(&self, key: &[u8], value: &[u8]) -> NativeResult<()>;

    /// Snapshot of every entry, in key order.
    async fn list(&self) -> NativeResult<Vec<(Vec<u8>, ValueVersion)>>;
}

#[async_trait]
pub trait Nfs: Send + Sync {
    async fn create(&self, content: &[u8]) -> NativeResult<Arc<dyn NfsFile>>;

    async fn fetch(&self, name: &str) -> NativeResult<Arc<dyn NfsFile>>;

    async fn insert(&self, name: &str, file: Arc<dyn NfsFile>) -> NativeResult<()>;

    async fn update(&self, name: &str, file: Arc<dyn NfsFile>, version: u64) -> NativeResult<()>;
}

#[async_trait]
pub trait NfsFile: Send + Sync {
    async fn size(&self) -> NativeResult<u64>;

    async fn read(&self, position: u64, len: u64) -> NativeResult<Vec<u8>>;

    async fn write(&self, content: &[u8]) -> NativeResult<()>;

    async fn close(&self) -> NativeResult<()>;

    fn metadata(&self) -> FileMetadata;
}

/// A signing or encryption key.
#[async_trait]
pub trait KeyMaterial: Send + Sync {
    async fn raw(&self) -> NativeResult<Vec<u8>>;
}

#[async_trait]
pub trait EncKeyPair: Send + Sync {
    fn pub_enc_key(&self) -> Arc<dyn KeyMaterial>;

    fn sec_enc_key(&self) -> Arc<dyn KeyMaterial>;

    async fn decrypt_sealed(&self, cipher: &[u8]) -> NativeResult<Vec<u8>>;
}
