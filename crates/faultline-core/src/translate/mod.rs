//! Family translators
//!
//! Each module owns one external error family: its error shape, the
//! conversion from the collaborator's native error where one exists, and a
//! pure `translate` function producing an [`ErrorCarrier`](crate::ErrorCarrier).

pub mod schema;
pub mod store;
pub mod token;
pub mod upload;
