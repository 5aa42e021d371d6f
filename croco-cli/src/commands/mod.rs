pub(crate) mod analyze;
pub(crate) mod config;
pub(crate) mod device;
pub(crate) mod rom;
pub(crate) mod rtc;
pub(crate) mod save;
