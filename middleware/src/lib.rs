//! Middleware run around the handler chain: persistence load/write-back, logging, allowlist auth.

mod middleware;
mod persistence_middleware;

#[cfg(test)]
mod test;

pub use middleware::{AuthMiddleware, LoggingMiddleware};
pub use persistence_middleware::PersistenceMiddleware;
