use axum::Router;

/// A service module that contributes HTTP routes.
///
/// The binary collects every module and nests its router under
/// `/{name}`. Routers are returned fully stated (`Router<()>`).
pub trait Module: Send + Sync {
    /// Module name, used for logging and as the route prefix.
    fn name(&self) -> &str;

    /// Return the module's routes, relative to the module prefix.
    fn routes(&self) -> Router;

    /// Mount path derived from the name.
    fn mount_path(&self) -> String {
        format!("/{}", self.name())
    }
}
