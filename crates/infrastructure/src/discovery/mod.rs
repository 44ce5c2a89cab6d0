//! Name server discovery from OS state.

mod resolv_conf;

pub use resolv_conf::SystemDiscovery;
