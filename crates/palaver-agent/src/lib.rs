pub mod host;
pub mod session;

pub use host::ChatHost;
pub use session::ChatSession;
