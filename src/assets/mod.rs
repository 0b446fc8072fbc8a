//! Static asset access: path scheme, fetchers, decoding and the frame loader.

pub mod decode;
pub mod fetch;
pub mod loader;
pub mod path;
