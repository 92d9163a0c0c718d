mod cast_error;
mod probe_error;
mod request_error;

pub use cast_error::CastError;
pub use probe_error::{LoadError, ProbeError};
pub use request_error::RequestError;
