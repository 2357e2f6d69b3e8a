// Purpose - external interfaces: the host audio device

pub mod host;

pub use host::{AudioHost, OutputStream};
