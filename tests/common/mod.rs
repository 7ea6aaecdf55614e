#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use safe_app_binding::config::{AuthSettings, BindingConfig};
use safe_app_binding::native::{
    AppInfo, AuthOptions, ContainerPermissions, EncKeyPair, Entries, FileMetadata, InitOptions,
    KeyMaterial, MutableData, NativeApp, NativeLibrary, NativeResult, NetworkObserver,
    NetworkState, Nfs, NfsFile, ShareMdPermission, ValueVersion,
};
use safe_app_binding::transport::{AuthRequestMessage, ChannelTransport};
use safe_app_binding::{
    AuthenticatorMessage, CorrelationId, NativeError, PageContext, SafeBinding, TabGroupId,
};

pub const APP_ID: &str = "net.example.test";
pub const SEALED_PREFIX: &[u8] = b"sealed:";

// -------- native fakes --------

#[derive(Default)]
pub struct FakeLibrary {
    apps: Mutex<Vec<Arc<FakeApp>>>,
}

impl FakeLibrary {
    /// The most recently initialised app.
    pub fn last_app(&self) -> Arc<FakeApp> {
        self.apps
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no app initialised")
    }
}

#[async_trait]
impl NativeLibrary for FakeLibrary {
    async fn initialise_app(
        &self,
        info: AppInfo,
        _options: InitOptions,
        observer: NetworkObserver,
    ) -> NativeResult<Arc<dyn NativeApp>> {
        if info.id.is_empty() {
            return Err(NativeError::new("app id is required"));
        }
        observer(NetworkState::Init);
        let app = Arc::new(FakeApp::new(info, observer));
        self.apps.lock().unwrap().push(Arc::clone(&app));
        Ok(app)
    }
}

pub struct FakeApp {
    pub info: AppInfo,
    observer: Mutex<Option<NetworkObserver>>,
    logins: Mutex<Vec<String>>,
    registered: AtomicBool,
    connected: AtomicBool,
    fail_release: AtomicBool,
    releases: AtomicUsize,
    own_container: Arc<FakeMutableData>,
}

impl FakeApp {
    pub fn new(info: AppInfo, observer: NetworkObserver) -> Self {
        Self {
            info,
            observer: Mutex::new(Some(observer)),
            logins: Mutex::new(Vec::new()),
            registered: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            fail_release: AtomicBool::new(false),
            releases: AtomicUsize::new(0),
            own_container: Arc::new(FakeMutableData::new(b"own".to_vec(), 15_000)),
        }
    }

    /// An app with no observer, for driving the registry directly.
    pub fn bare() -> Arc<Self> {
        Arc::new(Self::new(app_info(), Box::new(|_| {})))
    }

    pub fn logins(&self) -> Vec<String> {
        self.logins.lock().unwrap().clone()
    }

    pub fn set_fail_release(&self, fail: bool) {
        self.fail_release.store(fail, Ordering::SeqCst);
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    fn notify(&self, state: NetworkState) {
        if let Some(observer) = self.observer.lock().unwrap().as_ref() {
            observer(state);
        }
    }
}

#[async_trait]
impl NativeApp for FakeApp {
    async fn gen_conn_uri(&self) -> NativeResult<String> {
        Ok(format!("safe-auth:conn:{}", self.info.id))
    }

    async fn gen_auth_uri(
        &self,
        permissions: &ContainerPermissions,
        options: &AuthOptions,
    ) -> NativeResult<String> {
        let containers: Vec<&str> = permissions.keys().map(String::as_str).collect();
        Ok(format!(
            "safe-auth:auth:{}:{}:own={}",
            self.info.id,
            containers.join(","),
            options.own_container
        ))
    }

    async fn gen_container_auth_uri(
        &self,
        permissions: &ContainerPermissions,
    ) -> NativeResult<String> {
        let containers: Vec<&str> = permissions.keys().map(String::as_str).collect();
        Ok(format!("safe-auth:containers:{}", containers.join(",")))
    }

    async fn gen_share_mdata_uri(&self, permissions: &[ShareMdPermission]) -> NativeResult<String> {
        Ok(format!("safe-auth:share-md:{}", permissions.len()))
    }

    async fn login_from_uri(&self, uri: &str) -> NativeResult<()> {
        if !uri.starts_with("granted:") {
            return Err(NativeError::new("invalid auth uri"));
        }
        self.logins.lock().unwrap().push(uri.to_string());
        self.registered
            .store(uri.starts_with("granted:registered"), Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        self.notify(NetworkState::Connected);
        Ok(())
    }

    fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    fn network_state(&self) -> NetworkState {
        if self.connected.load(Ordering::SeqCst) {
            NetworkState::Connected
        } else {
            NetworkState::Init
        }
    }

    async fn can_access_container(&self, name: &str, permissions: &[String]) -> NativeResult<bool> {
        Ok(name == "_public" && permissions.iter().all(|p| p == "Read"))
    }

    async fn refresh_containers_permissions(&self) -> NativeResult<()> {
        Ok(())
    }

    async fn get_containers_permissions(&self) -> NativeResult<ContainerPermissions> {
        Ok(BTreeMap::from([(
            "_public".to_string(),
            vec!["Read".to_string()],
        )]))
    }

    async fn get_own_container(&self) -> NativeResult<Arc<dyn MutableData>> {
        Ok(self.own_container.clone())
    }

    async fn get_container(&self, name: &str) -> NativeResult<Arc<dyn MutableData>> {
        match name {
            "_public" => Ok(Arc::new(FakeMutableData::new(b"_public".to_vec(), 15_000))),
            _ => Err(NativeError::new(format!("no access to container {name}"))),
        }
    }

    async fn web_fetch(&self, url: &str) -> NativeResult<Vec<u8>> {
        match url.strip_prefix("safe://") {
            Some(path) => Ok(format!("<html>{path}</html>").into_bytes()),
            None => Err(NativeError::new("not a safe:// URL")),
        }
    }

    async fn reconnect(&self) -> NativeResult<()> {
        self.connected.store(true, Ordering::SeqCst);
        self.notify(NetworkState::Connected);
        Ok(())
    }

    async fn log_path(&self, filename: Option<&str>) -> NativeResult<String> {
        Ok(format!("/tmp/safe/{}", filename.unwrap_or("app.log")))
    }

    async fn new_random_mutable_data(
        &self,
        type_tag: u64,
        _public: bool,
    ) -> NativeResult<Arc<dyn MutableData>> {
        Ok(Arc::new(FakeMutableData::new(b"random".to_vec(), type_tag)))
    }

    async fn sha3_hash(&self, data: &[u8]) -> NativeResult<Vec<u8>> {
        Ok(data.iter().rev().copied().collect())
    }

    async fn app_pub_sign_key(&self) -> NativeResult<Arc<dyn KeyMaterial>> {
        Ok(Arc::new(FakeKey(b"sign-pk".to_vec())))
    }

    async fn generate_enc_key_pair(&self) -> NativeResult<Arc<dyn EncKeyPair>> {
        Ok(Arc::new(FakeKeyPair {
            public: Arc::new(FakeKey(b"enc-pk".to_vec())),
            secret: Arc::new(FakeKey(b"enc-sk".to_vec())),
        }))
    }

    fn release(&self) -> NativeResult<()> {
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(NativeError::new("release failed"));
        }
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.notify(NetworkState::Disconnected);
        // Dropping the observer ends the page's network-state readable.
        self.observer.lock().unwrap().take();
        Ok(())
    }
}

type EntryMap = Arc<Mutex<BTreeMap<Vec<u8>, ValueVersion>>>;

pub struct FakeMutableData {
    name: Vec<u8>,
    type_tag: u64,
    entries: EntryMap,
    nfs: Arc<FakeNfs>,
}

impl FakeMutableData {
    pub fn new(name: Vec<u8>, type_tag: u64) -> Self {
        Self {
            name,
            type_tag,
            entries: EntryMap::default(),
            nfs: Arc::new(FakeNfs::default()),
        }
    }
}

#[async_trait]
impl MutableData for FakeMutableData {
    async fn quick_setup(&self, entries: BTreeMap<Vec<u8>, Vec<u8>>) -> NativeResult<()> {
        let mut map = self.entries.lock().unwrap();
        for (key, buf) in entries {
            map.insert(key, ValueVersion { buf, version: 0 });
        }
        Ok(())
    }

    async fn name_and_tag(&self) -> NativeResult<(Vec<u8>, u64)> {
        Ok((self.name.clone(), self.type_tag))
    }

    async fn version(&self) -> NativeResult<u64> {
        Ok(self.entries.lock().unwrap().len() as u64)
    }

    async fn get(&self, key: &[u8]) -> NativeResult<ValueVersion> {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| NativeError::new("no such entry"))
    }

    async fn entries(&self) -> NativeResult<Arc<dyn Entries>> {
        Ok(Arc::new(FakeEntries {
            map: Arc::clone(&self.entries),
        }))
    }

    async fn emulate_as_nfs(&self) -> NativeResult<Arc<dyn Nfs>> {
        Ok(self.nfs.clone())
    }
}

pub struct FakeEntries {
    map: EntryMap,
}

#[async_trait]
impl Entries for FakeEntries {
    async fn len(&self) -> NativeResult<u64> {
        Ok(self.map.lock().unwrap().len() as u64)
    }

    async fn get(&self, key: &[u8]) -> NativeResult<ValueVersion> {
        self.map
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| NativeError::new("no such entry"))
    }

    async fn insert(&self, key: &[u8], value: &[u8]) -> NativeResult<()> {
        let mut map = self.map.lock().unwrap();
        if map.contains_key(key) {
            return Err(NativeError::new("entry exists"));
        }
        map.insert(
            key.to_vec(),
            ValueVersion {
                buf: value.to_vec(),
                version: 0,
            },
        );
        Ok(())
    }

    async fn list(&self) -> NativeResult<Vec<(Vec<u8>, ValueVersion)>> {
        Ok(self
            .map
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[derive(Default)]
pub struct FakeNfs {
    files: Mutex<HashMap<String, (Arc<dyn NfsFile>, u64)>>,
}

#[async_trait]
impl Nfs for FakeNfs {
    async fn create(&self, content: &[u8]) -> NativeResult<Arc<dyn NfsFile>> {
        Ok(Arc::new(FakeFile::new(content)))
    }

    async fn fetch(&self, name: &str) -> NativeResult<Arc<dyn NfsFile>> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .map(|(file, _)| Arc::clone(file))
            .ok_or_else(|| NativeError::new(format!("file not found: {name}")))
    }

    async fn insert(&self, name: &str, file: Arc<dyn NfsFile>) -> NativeResult<()> {
        let mut files = self.files.lock().unwrap();
        if files.contains_key(name) {
            return Err(NativeError::new("file exists"));
        }
        files.insert(name.to_string(), (file, 0));
        Ok(())
    }

    async fn update(&self, name: &str, file: Arc<dyn NfsFile>, version: u64) -> NativeResult<()> {
        let mut files = self.files.lock().unwrap();
        let current = files
            .get(name)
            .map(|(_, v)| *v)
            .ok_or_else(|| NativeError::new(format!("file not found: {name}")))?;
        if version != current + 1 {
            return Err(NativeError::new("invalid successor version"));
        }
        files.insert(name.to_string(), (file, version));
        Ok(())
    }
}

pub struct FakeFile {
    content: Mutex<Vec<u8>>,
    closed: AtomicBool,
}

impl FakeFile {
    pub fn new(content: &[u8]) -> Self {
        Self {
            content: Mutex::new(content.to_vec()),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl NfsFile for FakeFile {
    async fn size(&self) -> NativeResult<u64> {
        Ok(self.content.lock().unwrap().len() as u64)
    }

    async fn read(&self, position: u64, len: u64) -> NativeResult<Vec<u8>> {
        let content = self.content.lock().unwrap();
        let start = (position as usize).min(content.len());
        let end = if len == 0 {
            content.len()
        } else {
            (start + len as usize).min(content.len())
        };
        Ok(content[start..end].to_vec())
    }

    async fn write(&self, content: &[u8]) -> NativeResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(NativeError::new("file is closed"));
        }
        self.content.lock().unwrap().extend_from_slice(content);
        Ok(())
    }

    async fn close(&self) -> NativeResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn metadata(&self) -> FileMetadata {
        FileMetadata {
            data_map_name: b"data-map".to_vec(),
            created: "2026-01-01T00:00:00Z".to_string(),
            modified: "2026-01-01T00:00:00Z".to_string(),
            size: self.content.lock().unwrap().len() as u64,
            version: 0,
        }
    }
}

pub struct FakeKey(pub Vec<u8>);

#[async_trait]
impl KeyMaterial for FakeKey {
    async fn raw(&self) -> NativeResult<Vec<u8>> {
        Ok(self.0.clone())
    }
}

pub struct FakeKeyPair {
    public: Arc<FakeKey>,
    secret: Arc<FakeKey>,
}

#[async_trait]
impl EncKeyPair for FakeKeyPair {
    fn pub_enc_key(&self) -> Arc<dyn KeyMaterial> {
        self.public.clone()
    }

    fn sec_enc_key(&self) -> Arc<dyn KeyMaterial> {
        self.secret.clone()
    }

    async fn decrypt_sealed(&self, cipher: &[u8]) -> NativeResult<Vec<u8>> {
        cipher
            .strip_prefix(SEALED_PREFIX)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| NativeError::new("cannot open sealed box"))
    }
}

// -------- binding harness --------

pub struct Harness {
    pub binding: Arc<SafeBinding>,
    pub library: Arc<FakeLibrary>,
    /// Everything the binding sent to the Authenticator.
    pub outbound: UnboundedReceiver<AuthRequestMessage>,
}

/// Defaults, with the request timeout disabled.
pub fn test_config() -> BindingConfig {
    BindingConfig {
        auth: AuthSettings {
            timeout_secs: 0,
            ..AuthSettings::default()
        },
        ..BindingConfig::default()
    }
}

pub fn harness() -> Harness {
    harness_with(test_config())
}

pub fn harness_with(config: BindingConfig) -> Harness {
    let library = Arc::new(FakeLibrary::default());
    let (transport, outbound) = ChannelTransport::channel();
    let binding = Arc::new(SafeBinding::new(
        library.clone(),
        Arc::new(transport),
        config,
    ));
    Harness {
        binding,
        library,
        outbound,
    }
}

pub fn app_info() -> AppInfo {
    AppInfo {
        id: APP_ID.to_string(),
        name: "Test App".to_string(),
        vendor: "Example".to_string(),
        scope: None,
    }
}

pub fn page(tab: &str) -> PageContext {
    PageContext::new(TabGroupId::new(tab), format!("safe://{tab}.example/"))
}

pub fn granted(id: CorrelationId, result: &str) -> AuthenticatorMessage {
    AuthenticatorMessage::Response {
        correlation_id: id,
        result: result.to_string(),
    }
}

pub fn refused(id: CorrelationId, error: &str) -> AuthenticatorMessage {
    AuthenticatorMessage::Error {
        correlation_id: id,
        error: error.to_string(),
    }
}

/// Let spawned tasks run until `cond` holds.
pub async fn settle(mut cond: impl FnMut() -> bool) {
    for _ in 0..100 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
