//! Classification and routing engine.

pub mod classifier;
pub mod dispatcher;
pub mod router;
pub mod types;

pub use classifier::{Classifier, PatternRuleSet};
pub use dispatcher::{Delivery, DispatchReport, Dispatcher, DISPATCH_GAP};
pub use router::{route, CALLSIGN_EXCLUDED_DEVICE};
pub use types::{DispatchOrder, Event, EventKind, Notice, Profile, UNADDRESSED_DEVICE};
