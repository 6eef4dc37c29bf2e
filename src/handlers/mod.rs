// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth): service discovery and liveness
// Protected (Basic auth): per-collection document CRUD under /api/*
pub mod public;
pub mod protected;
