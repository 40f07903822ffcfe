//! Collaborators the chat core talks to.
//!
//! Each collaborator is an async trait with a simulated implementation:
//!
//! - [`auth::AuthService`] sends and verifies one-time passwords
//! - [`responder::Responder`] produces the assistant's replies
//! - [`countries::CountryDirectory`] lists dial codes for the login screen
//!
//! The simulated implementations only wait on timers, so tests drive them
//! with a paused tokio clock.

pub mod auth;
pub mod countries;
pub mod responder;

pub use auth::{AuthError, AuthService, SimulatedAuth};
pub use countries::{
    AnyCountryDirectory, CountryDirectory, CountryError, HttpCountryDirectory,
    StaticCountryDirectory, load_countries,
};
pub use responder::{Responder, SimulatedResponder};
