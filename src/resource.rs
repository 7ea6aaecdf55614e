//! The closed set of native objects a handle can stand for.

use std::fmt;
use std::sync::Arc;

use crate::error::{BindingError, BindingResult};
use crate::native::{EncKeyPair, Entries, KeyMaterial, MutableData, NativeApp, Nfs, NfsFile};

/// A native object held by the registry.
///
/// Cloning is cheap: every variant is a shared reference to the native object.
#[derive(Clone)]
pub enum Resource {
    App(Arc<dyn NativeApp>),
    MutableData(Arc<dyn MutableData>),
    Entries(Arc<dyn Entries>),
    Nfs(Arc<dyn Nfs>),
    File(Arc<dyn NfsFile>),
    SignKey(Arc<dyn KeyMaterial>),
    PubEncKey(Arc<dyn KeyMaterial>),
    SecEncKey(Arc<dyn KeyMaterial>),
    KeyPair(Arc<dyn EncKeyPair>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    App,
    MutableData,
    Entries,
    Nfs,
    File,
    SignKey,
    PubEncKey,
    SecEncKey,
    KeyPair,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource::{}", self.kind())
    }
}

macro_rules! into_variant {
    ($($fn_name:ident => $variant:ident : $ty:ty),* $(,)?) => {
        $(
            pub fn $fn_name(self) -> BindingResult<$ty> {
                match self {
                    Resource::$variant(inner) => Ok(inner),
                    other => Err(BindingError::WrongResourceKind {
                        expected: ResourceKind::$variant,
                        found: other.kind(),
                    }),
                }
            }
        )*
    };
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::App(_) => ResourceKind::App,
            Resource::MutableData(_) => ResourceKind::MutableData,
            Resource::Entries(_) => ResourceKind::Entries,
            Resource::Nfs(_) => ResourceKind::Nfs,
            Resource::File(_) => ResourceKind::File,
            Resource::SignKey(_) => ResourceKind::SignKey,
            Resource::PubEncKey(_) => ResourceKind::PubEncKey,
            Resource::SecEncKey(_) => ResourceKind::SecEncKey,
            Resource::KeyPair(_) => ResourceKind::KeyPair,
        }
    }

    /// Any of the three key variants.
    pub fn into_key(self) -> BindingResult<Arc<dyn KeyMaterial>> {
        match self {
            Resource::SignKey(k) | Resource::PubEncKey(k) | Resource::SecEncKey(k) => Ok(k),
            other => Err(BindingError::NotAKey {
                found: other.kind(),
            }),
        }
    }

    into_variant! {
        into_app => App: Arc<dyn NativeApp>,
        into_mutable_data => MutableData: Arc<dyn MutableData>,
        into_entries => Entries: Arc<dyn Entries>,
        into_nfs => Nfs: Arc<dyn Nfs>,
        into_file => File: Arc<dyn NfsFile>,
        into_key_pair => KeyPair: Arc<dyn EncKeyPair>,
    }
}
