// handlers/protected/mod.rs - Protected handlers (Basic authentication required)
//
// Every route here sits behind the shared credential gate and is mounted
// once per configured collection at /api/<collection>[/:id].

pub mod data; // Generic document CRUD, parameterized by collection

pub use data::*;
