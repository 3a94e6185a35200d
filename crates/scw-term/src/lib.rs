//! Terminal adapter: the thread view and the console run loop.

pub mod console;
pub mod view;

pub use view::TerminalView;
