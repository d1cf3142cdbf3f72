//! Generic buffered dispatch: a bounded per-sink queue, a drain worker that
//! turns it into count/byte/time windowed batches, and the transport seam
//! each buffered sink implements.

mod batch_buffer;
mod dispatcher;
mod stats;
mod transport;

pub use batch_buffer::*;
pub use dispatcher::*;
pub use stats::*;
pub use transport::*;
