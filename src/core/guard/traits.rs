/*!
 * Guard Traits
 *
 * Release contract shared by the guards handed out for a held lock facet
 */

use super::{GuardMetadata, GuardResult};

/// Ownership of one acquired facet (mutex, read or write)
///
/// The holder may release early with `release()`; otherwise dropping the
/// guard releases it.
pub trait Guard: Send {
    /// Which facet the guard holds, as it appears in trace events
    fn resource_type(&self) -> &'static str;

    /// Acquisition timestamp, used for hold-time tracing
    fn metadata(&self) -> &GuardMetadata;

    /// False once the facet has been handed back
    fn is_active(&self) -> bool;

    /// Hand the facet back to the lock
    ///
    /// A second call yields `GuardError::AlreadyReleased`. A rejected unlock
    /// from the adapter surfaces as `GuardError::Lock`.
    fn release(&mut self) -> GuardResult<()>;
}

/// Release hook invoked from `Drop`
///
/// Errors cannot propagate out of `Drop`; implementations log them with
/// `warn!` and must not panic, since the drop may run during unwinding.
pub trait GuardDrop: Guard {
    fn on_drop(&mut self);
}
