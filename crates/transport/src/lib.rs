//! Transport adapter for the Roots voice tutor
//!
//! Wraps the vendor's realtime event channel behind the `RealtimeTransport`
//! capability trait and performs the one-shot ephemeral-credential exchange
//! against the worker backend. A scripted `MockTransport` lives here too so
//! session behaviour can be tested without a network.

pub mod credentials;
pub mod mock;
pub mod realtime;

pub use credentials::HttpCredentialProvider;
pub use mock::{MockCredentialProvider, MockOp, MockTransport};
pub use realtime::{RealtimeClient, DEFAULT_REALTIME_URL};
