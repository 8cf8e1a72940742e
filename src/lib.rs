pub mod core;
mod logging;
pub mod settings;
mod utils;

pub const IS_DEBUG: bool = cfg!(debug_assertions);
pub const DEBUG_LOG: bool = cfg!(feature = "log");
