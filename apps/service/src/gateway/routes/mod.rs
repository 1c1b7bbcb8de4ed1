mod commands;
mod health;

pub use commands::commands_route;
pub use health::{health_route, status_route};

macros_utils::routes! {
    route health_route,
    route status_route,
    route commands_route,
}
