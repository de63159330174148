//! Orderflow/structure and option-level-proximity analyzers that feed the
//! fusion score (spec §4.5, §4.6).

pub mod battle_navale;
pub mod menthorq_distance;
pub mod structure;

pub use battle_navale::{BattleNavaleAnalyzer, BattleNavaleOutput, Pattern};
pub use menthorq_distance::{side_for_class, LevelAnchor, MenthorQDistanceAnalyzer, MenthorQDistanceOutput};
pub use structure::{StructureAnalyzer, StructureOutput};
