// Event model and listener fan-out
//
// Wire types (raw events, drafts, filters), the signed-event view ingestion
// gates on, the envelope carried in event content, and the listener registry
// that application callbacks hang off.

// Public API - what other modules can use
pub use envelope::{is_ciphertext, Envelope, PayloadValidator, CIPHER_MARKER};
pub use filter::Filter;
pub use raw::{EventDraft, EventTemplate, RawEvent, Tag};
pub use registry::{listener, Listener, ListenerRegistry, TimedListener};
pub use signals::{is_reserved, Delivery, Signal, CONNECTED, ERROR, LEAVE, WILDCARD};
pub use signed::SignedEvent;

pub(crate) use signed::unix_now;

// Internal modules
mod envelope;
mod filter;
mod raw;
mod registry;
mod signals;
mod signed;
