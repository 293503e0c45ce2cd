//! Handlers composing the event router: tracking, persistence, reply.

mod persistence_handler;
mod reply_handler;
mod tracking_handler;

pub use persistence_handler::PersistenceHandler;
pub use reply_handler::ReplyHandler;
pub use tracking_handler::TrackingHandler;
