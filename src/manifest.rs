//! Per-method manifest handed to the plugin host.
//!
//! The host uses it to decide how to expose each method to page script:
//! `sync` returns directly, `promise` returns a deferred result, and
//! `readable` returns a lazy sequence (see [`crate::readable`]).

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Sync,
    Promise,
    Readable,
}

/// Methods of one page-facing API object, e.g. `safeApp`.
pub type ModuleManifest = BTreeMap<&'static str, MethodKind>;

const SYNC: MethodKind = MethodKind::Sync;
const PROMISE: MethodKind = MethodKind::Promise;
const READABLE: MethodKind = MethodKind::Readable;

const SAFE_APP: &[(&str, MethodKind)] = &[
    ("initialise", READABLE),
    ("connect", PROMISE),
    ("authorise", PROMISE),
    ("connectAuthorised", PROMISE),
    ("authoriseContainer", PROMISE),
    ("authoriseShareMd", PROMISE),
    ("webFetch", PROMISE),
    ("isRegistered", PROMISE),
    ("networkState", PROMISE),
    ("canAccessContainer", PROMISE),
    ("refreshContainersPermissions", PROMISE),
    ("getContainersPermissions", PROMISE),
    ("getOwnContainer", PROMISE),
    ("getContainer", PROMISE),
    ("reconnect", PROMISE),
    ("logPath", PROMISE),
    ("free", SYNC),
];

const SAFE_CRYPTO: &[(&str, MethodKind)] = &[
    ("sha3Hash", PROMISE),
    ("getAppPubSignKey", PROMISE),
    ("generateEncKeyPair", PROMISE),
];

const SAFE_CRYPTO_KEY_PAIR: &[(&str, MethodKind)] = &[
    ("getPubEncKey", PROMISE),
    ("getSecEncKey", PROMISE),
    ("decryptSealed", PROMISE),
    ("free", SYNC),
];

const SAFE_CRYPTO_KEY: &[(&str, MethodKind)] = &[("getRaw", PROMISE), ("free", SYNC)];

const SAFE_MUTABLE_DATA: &[(&str, MethodKind)] = &[
    ("newRandomPublic", PROMISE),
    ("newRandomPrivate", PROMISE),
    ("quickSetup", PROMISE),
    ("getNameAndTag", PROMISE),
    ("getVersion", PROMISE),
    ("get", PROMISE),
    ("getEntries", PROMISE),
    ("emulateAs", PROMISE),
    ("free", SYNC),
];

const SAFE_MUTABLE_DATA_ENTRIES: &[(&str, MethodKind)] = &[
    ("len", PROMISE),
    ("get", PROMISE),
    ("insert", PROMISE),
    ("forEach", READABLE),
    ("free", SYNC),
];

const SAFE_NFS: &[(&str, MethodKind)] = &[
    ("create", PROMISE),
    ("fetch", PROMISE),
    ("insert", PROMISE),
    ("update", PROMISE),
    ("free", SYNC),
];

const SAFE_NFS_FILE: &[(&str, MethodKind)] = &[
    ("size", PROMISE),
    ("read", PROMISE),
    ("write", PROMISE),
    ("close", PROMISE),
    ("metadata", PROMISE),
    ("free", SYNC),
];

static API_MANIFEST: Lazy<BTreeMap<&'static str, ModuleManifest>> = Lazy::new(|| {
    [
        ("safeApp", SAFE_APP),
        ("safeCrypto", SAFE_CRYPTO),
        ("safeCryptoKeyPair", SAFE_CRYPTO_KEY_PAIR),
        ("safeCryptoKey", SAFE_CRYPTO_KEY),
        ("safeMutableData", SAFE_MUTABLE_DATA),
        ("safeMutableDataEntries", SAFE_MUTABLE_DATA_ENTRIES),
        ("safeNfs", SAFE_NFS),
        ("safeNfsFile", SAFE_NFS_FILE),
    ]
    .into_iter()
    .map(|(module, methods)| (module, methods.iter().copied().collect()))
    .collect()
});

/// The whole manifest, keyed by API object name.
///
/// # Examples
///
/// ```
/// use safe_app_binding::manifest::{get_api_manifest, MethodKind};
///
/// let manifest = get_api_manifest();
/// assert_eq!(manifest["safeApp"]["connect"], MethodKind::Promise);
/// assert_eq!(manifest["safeApp"]["free"], MethodKind::Sync);
/// ```
pub fn get_api_manifest() -> &'static BTreeMap<&'static str, ModuleManifest> {
    &API_MANIFEST
}

pub fn get_module_manifest(module: &str) -> Option<&'static ModuleManifest> {
    API_MANIFEST.get(module)
}

pub fn method_kind(module: &str, method: &str) -> Option<MethodKind> {
    get_module_manifest(module)?.get(method).copied()
}

/// Pretty JSON for one module, in the shape plugin hosts read:
/// `{"connect": "promise", "free": "sync", ...}`.
pub fn module_manifest_json(module: &str) -> Option<serde_json::Result<String>> {
    get_module_manifest(module).map(serde_json::to_string_pretty)
}
