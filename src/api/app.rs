//! `safeApp`: application instances and authorisation.

use tracing::debug;

use crate::binding::{PageContext, SafeBinding};
use crate::error::BindingResult;
use crate::handle::Handle;
use crate::native::{
    AppInfo, AuthOptions, ContainerPermissions, InitOptions, NetworkState, ShareMdPermission,
};
use crate::queue::AuthKind;
use crate::readable::{readable, Readable};
use crate::resource::Resource;

const DEFAULT_CONTAINER_PERMISSION: &str = "Read";

impl SafeBinding {
    /// Create an application instance for the calling page, not yet connected.
    ///
    /// The page's URL becomes the app's scope and the app joins the page's
    /// tab group. The returned readable yields every network state change of
    /// the instance and ends when the instance is released.
    pub async fn initialise(
        &self,
        page: &PageContext,
        mut info: AppInfo,
        options: InitOptions,
    ) -> BindingResult<(Handle, Readable<NetworkState>)> {
        info.scope = page.url.clone();
        let (sink, states) = readable();
        let app = self
            .library
            .initialise_app(
                info,
                options,
                Box::new(move |state| {
                    sink.push(state);
                }),
            )
            .await?;
        let handle = self
            .registry
            .allocate_app(app, Some(page.tab_group.clone()));
        Ok((handle, states))
    }

    /// Ask the Authenticator for an unregistered (read-only) session and
    /// connect with it.
    pub async fn connect(&self, app_handle: &Handle) -> BindingResult<Handle> {
        let app = self.registry.lookup_app(app_handle)?;
        let conn_req = app.gen_conn_uri().await?;
        let granted = self
            .request_authorisation(app_handle, AuthKind::Unregistered, conn_req)
            .await?;
        app.login_from_uri(&granted).await?;
        debug!(app = app_handle.short(), "unregistered session created");
        Ok(app_handle.clone())
    }

    /// Ask the user, through the Authenticator, to grant `permissions`.
    /// Resolves to the granted auth URI.
    pub async fn authorise(
        &self,
        app_handle: &Handle,
        permissions: &ContainerPermissions,
        options: &AuthOptions,
    ) -> BindingResult<String> {
        let app = self.registry.lookup_app(app_handle)?;
        let auth_req = app.gen_auth_uri(permissions, options).await?;
        self.request_authorisation(app_handle, AuthKind::Registered, auth_req)
            .await
    }

    /// Create a registered session from a previously granted auth URI.
    pub async fn connect_authorised(
        &self,
        app_handle: &Handle,
        auth_uri: &str,
    ) -> BindingResult<Handle> {
        let app = self.registry.lookup_app(app_handle)?;
        app.login_from_uri(auth_uri).await?;
        Ok(app_handle.clone())
    }

    pub async fn authorise_container(
        &self,
        app_handle: &Handle,
        permissions: &ContainerPermissions,
    ) -> BindingResult<String> {
        let app = self.registry.lookup_app(app_handle)?;
        let auth_req = app.gen_container_auth_uri(permissions).await?;
        self.request_authorisation(app_handle, AuthKind::Registered, auth_req)
            .await
    }

    pub async fn authorise_share_md(
        &self,
        app_handle: &Handle,
        permissions: &[ShareMdPermission],
    ) -> BindingResult<String> {
        let app = self.registry.lookup_app(app_handle)?;
        let auth_req = app.gen_share_mdata_uri(permissions).await?;
        self.request_authorisation(app_handle, AuthKind::Registered, auth_req)
            .await
    }

    pub async fn web_fetch(&self, app_handle: &Handle, url: &str) -> BindingResult<Vec<u8>> {
        let app = self.registry.lookup_app(app_handle)?;
        Ok(app.web_fetch(url).await?)
    }

    pub async fn is_registered(&self, app_handle: &Handle) -> BindingResult<bool> {
        Ok(self.registry.lookup_app(app_handle)?.is_registered())
    }

    pub async fn network_state(&self, app_handle: &Handle) -> BindingResult<NetworkState> {
        Ok(self.registry.lookup_app(app_handle)?.network_state())
    }

    /// Defaults to checking `["Read"]`.
    pub async fn can_access_container(
        &self,
        app_handle: &Handle,
        name: &str,
        permissions: Option<&[String]>,
    ) -> BindingResult<bool> {
        let app = self.registry.lookup_app(app_handle)?;
        let default = [DEFAULT_CONTAINER_PERMISSION.to_string()];
        let permissions = permissions.unwrap_or(&default);
        Ok(app.can_access_container(name, permissions).await?)
    }

    pub async fn refresh_containers_permissions(
        &self,
        app_handle: &Handle,
    ) -> BindingResult<Handle> {
        let app = self.registry.lookup_app(app_handle)?;
        app.refresh_containers_permissions().await?;
        Ok(app_handle.clone())
    }

    pub async fn get_containers_permissions(
        &self,
        app_handle: &Handle,
    ) -> BindingResult<ContainerPermissions> {
        let app = self.registry.lookup_app(app_handle)?;
        Ok(app.get_containers_permissions().await?)
    }

    /// Handle to the app's own container, owned by the app.
    pub async fn get_own_container(&self, app_handle: &Handle) -> BindingResult<Handle> {
        let app = self.registry.lookup_app(app_handle)?;
        let md = app.get_own_container().await?;
        self.wrap(app_handle, Resource::MutableData(md))
    }

    pub async fn get_container(&self, app_handle: &Handle, name: &str) -> BindingResult<Handle> {
        let app = self.registry.lookup_app(app_handle)?;
        let md = app.get_container(name).await?;
        self.wrap(app_handle, Resource::MutableData(md))
    }

    pub async fn reconnect(&self, app_handle: &Handle) -> BindingResult<()> {
        let app = self.registry.lookup_app(app_handle)?;
        Ok(app.reconnect().await?)
    }

    pub async fn log_path(
        &self,
        app_handle: &Handle,
        filename: Option<&str>,
    ) -> BindingResult<String> {
        let app = self.registry.lookup_app(app_handle)?;
        Ok(app.log_path(filename).await?)
    }

    async fn request_authorisation(
        &self,
        app_handle: &Handle,
        kind: AuthKind,
        uri: String,
    ) -> BindingResult<String> {
        let tab_group = self.registry.tab_group(app_handle)?;
        self.queues.enqueue(kind, uri, tab_group).await
    }
}
