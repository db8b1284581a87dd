pub mod backend;
pub mod coordinator;
pub mod decomp;
pub mod module;
pub mod shape_key;
pub mod spec;
pub mod tensor;
pub mod value;

pub use backend::*;
pub use coordinator::*;
pub use decomp::*;
pub use module::*;
pub use shape_key::*;
pub use spec::*;
pub use tensor::*;
pub use value::*;
