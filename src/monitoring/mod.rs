/*!
 * Monitoring
 * Tracing setup for processes embedding the lock core
 */

mod tracer;

pub use tracer::{init_tracing, try_init_tracing};
