pub mod dict;
pub mod schema;

pub use dict::BarcodeDicts;
pub use schema::BarcodeSchema;
