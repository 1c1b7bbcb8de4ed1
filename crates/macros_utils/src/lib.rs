//! Small declarative helpers shared by the HTTP surfaces.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web as __actix_web;

/// Generates a `routes` function registering the listed actix-web services.
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     route commands_route,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($(route $name:ident),* $(,)?) => {
        pub fn routes(cfg: &mut $crate::__actix_web::web::ServiceConfig) {
            $( cfg.service($name); )*
        }
    };
}
