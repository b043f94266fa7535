pub mod bounded;
pub mod session;

pub use bounded::BoundedStore;
pub use session::{DetailsUpdate, SessionStore};
