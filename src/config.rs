//! Compile-time configuration.
//!
//! `trouble-stdio` sizes its connection table and staging buffers at compile time.
//!
//! The values are set via environment variables at build time: set the variable named
//! `TROUBLE_STDIO_<value>`. For example `TROUBLE_STDIO_CONNECTIONS_MAX=1 cargo build`.
//! You can also set them in the `[env]` section of `.cargo/config.toml`.
//!
//! Runtime parameters (device name, advertising and connection intervals) live in
//! [`StdioConfig`](crate::StdioConfig) instead.

mod raw {
    #![allow(unused)]
    include!(concat!(env!("OUT_DIR"), "/config.rs"));
}

/// Number of concurrent peer links tracked by the default connection table.
///
/// Links established while every slot is occupied are rejected.
///
/// Default: 3.
pub const CONNECTIONS_MAX: usize = raw::CONNECTIONS_MAX;

/// Capacity of the staging buffer of every connection slot.
///
/// A notification can never carry more than the negotiated ATT MTU minus the 3 byte
/// header, so the effective capacity of a slot is the smaller of the two. The default
/// matches an L2CAP MTU of 247.
///
/// Default: 244.
pub const PAYLOAD_MAX: usize = raw::PAYLOAD_MAX;

/// Depth of the [`Runner`](crate::runner::Runner) input channel.
///
/// Default: 4.
pub const INPUT_QUEUE_SIZE: usize = raw::INPUT_QUEUE_SIZE;
