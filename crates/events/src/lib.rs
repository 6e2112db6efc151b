//! Topic-addressed progress pub/sub.
//!
//! [`ProgressChannel`] is the seam between the job pipeline and the
//! status stream relays: orchestrators publish, relays subscribe, and
//! neither side knows the other exists. The in-memory [`ProgressBus`]
//! backs single-process deployments; a networked implementation can
//! replace it without touching either side.

pub mod bus;

pub use bus::{ProgressBus, ProgressChannel, Subscription};
