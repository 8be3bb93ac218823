#[cfg(feature = "native")]
pub mod runner;
pub mod view_machine;
pub mod widget;
