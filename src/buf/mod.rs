//! Bounds-checked buffers.
//!
//! Every access goes through a cursor that knows its limits, so a short
//! or hostile input surfaces as an error instead of an out-of-range index.

mod reader;
mod store;
mod writer;

pub use reader::Reader;
pub use store::Store;
pub use writer::Writer;
