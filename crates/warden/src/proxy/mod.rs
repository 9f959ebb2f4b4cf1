mod error;
pub mod forward;
pub mod pipeline;
pub mod route;
mod server;

pub use error::{ProxyError, error_response};
pub use forward::{HOP_BY_HOP_HEADERS, UpstreamResponse};
pub use pipeline::{AGENT_ID_HEADER, DEFAULT_AGENT_ID, is_completion_endpoint, rewrite_stream_flag};
pub use route::{ProviderRoute, RouteTable};
pub use server::{AppState, ProxyServer, build_client, create_router};
