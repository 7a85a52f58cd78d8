//! Dashboard services.
//!
//! # Services
//!
//! - `session` - Session state store, the source of truth for login state
//! - `search` - Customer search with stale-response sequencing
//! - `login` - Credential verification flow and backend logout

pub mod login;
pub mod search;
pub mod session;

pub use login::{
    GoogleCredential, IdentityProvider, IdentityProviderError, LoginError, LoginFlow,
    ProvidedCredential,
};
pub use search::{
    EMPTY_TERM_MESSAGE, NO_RESULTS_MESSAGE, SearchDispatcher, SearchError, SearchOutcome,
    SearchStatus,
};
pub use session::{SessionState, SessionStore};
