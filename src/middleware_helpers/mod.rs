pub mod actor;
pub mod request_id;

pub use actor::{actor_context, ActorContext};
pub use request_id::request_id_middleware;
