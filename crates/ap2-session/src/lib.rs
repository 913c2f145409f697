//! ap2-session
//!
//! One shopper's pass through the purchase flow:
//!
//! ```text
//! landing ──search──► shortlist ──select──► checkout ──confirm──► confirmation
//!    ▲                    │                    │                       │
//!    └──────back──────────┘                    │                       │
//!    └──────cancel─────────────────────────────┘                       │
//!    └──────reset (from any page)──────────────────────────────────────┘
//! ```
//!
//! [`OrderSession`] is an explicit value, not ambient state. Reset, back and
//! cancel all reconstruct it from defaults, so nothing from an abandoned
//! attempt survives.

mod catalog;
mod error;
mod session;

pub use catalog::{load_catalog, parse_catalog};
pub use error::SessionError;
pub use session::{AssistantMessage, OrderSession, Page, SessionAction};
