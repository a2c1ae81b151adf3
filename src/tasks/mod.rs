//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a session is open.
//!
//! # Tasks
//! - Cache GC: Drops unobserved cache entries past their retention window

mod gc;

pub use gc::spawn_gc_task;
