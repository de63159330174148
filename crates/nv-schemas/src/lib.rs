//! Shared data model for the decision pipeline.
//!
//! Every other crate in the workspace depends on this one; this crate
//! depends on nothing internal. It owns the wire `Record` variants, the
//! `UnifiedEvent` total order, the derived `Bar`/`LevelSet`/`VixRegime`
//! types, the immutable per-bar `Snapshot`, and the `TradingDecision`
//! output schema.

pub mod bar;
pub mod decision;
pub mod event;
pub mod levels;
pub mod record;
pub mod side;
pub mod snapshot;
pub mod vix;

pub use bar::{Bar, BarFeatures, BarKey, NbcvFeatures, VvaLevels, VwapBands};
pub use decision::{
    Action, Components, Eul, LeadershipInfo, Level as DecisionLevel, Modifiers, Quality,
    TradingDecision,
};
pub use event::UnifiedEvent;
pub use levels::{LevelClass, LevelEntry, LevelName, LevelSet, StalenessClass};
pub use record::{
    AtrBarPayload, BaseBarPayload, CorrelationPayload, CumulativeDeltaPayload, DedupeKey,
    DepthLevelPayload, MenthorQLevelsPayload, NbcvPayload, ParseError, PvwapPayload, QuotePayload,
    Record, RecordHeader, RecordPayload, TradePayload, VixPointPayload, VolumeProfilePayload,
    VvaPayload, VwapPayload,
};
pub use side::Side;
pub use snapshot::{LeadershipSnap, PriorTradeOutcome, Snapshot, VolumeProfileSummary};
pub use vix::VixRegime;
