//! Concrete anchor provider clients.
//!
//! Three structurally different REST APIs behind one [`crate::Anchor`]
//! surface. Provider-specific behavior that the common trait cannot express
//! (Brava's ToS/receiver onboarding) lives on inherent methods of the
//! concrete client, reached through the provider's variant rather than type
//! inspection.

pub mod brava;
pub mod meridian;
pub mod nopal;

pub use brava::BravaClient;
pub use meridian::MeridianClient;
pub use nopal::NopalClient;
