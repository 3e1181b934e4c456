pub use errors::UtilError;

pub mod assets;
pub mod package;
pub mod zip;

mod errors;
