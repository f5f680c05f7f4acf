pub mod process;

pub use process::ProcessCMD;
