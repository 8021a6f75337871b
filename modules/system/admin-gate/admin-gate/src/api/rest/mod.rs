mod error;
mod handlers;
mod routes;

pub use handlers::PeerChain;
pub use routes::{AdminState, admin_router};
