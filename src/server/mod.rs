pub mod builder;
pub mod handler;
pub mod routes;

pub use builder::{serve_listener, ServerBuilder};
pub use handler::RequestHandler;
pub use routes::{dispatch, respond, Route, DEFAULT_PATH_PREFIX, MIME_JSON, MIME_TEXT_PLAIN};
