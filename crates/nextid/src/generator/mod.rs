mod atomic;
mod backoff;
mod blocking;
mod interface;
mod lock;
mod mutex;
mod state;
mod status;

pub use atomic::*;
pub(crate) use backoff::*;
pub use blocking::*;
pub use interface::*;
pub use lock::*;
pub(crate) use mutex::*;
pub use status::*;
