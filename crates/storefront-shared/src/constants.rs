//! Application-wide constants

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_MENU_DEPTH: usize = 5;
