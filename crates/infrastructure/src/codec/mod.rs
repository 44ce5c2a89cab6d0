//! Default wire codec adapter.

mod hickory;

pub use hickory::HickoryCodec;
