mod model;
mod store;

pub use model::{builtin_programs, Program};
pub use store::ProgramStore;
