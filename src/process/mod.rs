pub mod ambiguity;
pub mod cluster;
pub mod engine;
pub mod results;

pub use engine::{process_barcode_mapping, ProcessOutput};
pub use results::Results;
