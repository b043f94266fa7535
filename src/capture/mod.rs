pub mod correlator;
pub mod mask;
pub mod model;

pub use correlator::{attach_error, attach_response, generate_id};
pub use model::{
    AuthEvent, AuthEventType, CapturedRequest, CapturedResponse, Direction, Identified, Message,
    Payload, Session, Transport,
};
