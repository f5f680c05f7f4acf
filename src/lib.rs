pub mod barcode;
pub mod command;
pub mod index;
pub mod io;
pub mod process;
