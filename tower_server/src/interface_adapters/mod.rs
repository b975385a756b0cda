// Interface adapters: HTTP routes, the event stream, wire protocol and port adapters.

pub mod handlers;
pub mod http;
pub mod net;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod utils;
