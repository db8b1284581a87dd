pub mod binder;
pub mod cache;
pub mod dispatcher;
pub mod engine;
pub mod extract;
pub mod log;
pub mod options;

pub use binder::*;
pub use cache::*;
pub use dispatcher::*;
pub use engine::*;
pub use extract::*;
pub use log::*;
pub use options::*;
