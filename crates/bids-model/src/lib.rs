pub mod enums;
pub mod layout;
pub mod mapping;
pub mod outcome;
pub mod physio;

pub use enums::{ColumnOrder, MatchStrategy};
pub use layout::ArchiveLayout;
pub use mapping::{MappingRow, MatchOutcome, SubjectFolder};
pub use outcome::{BatchReport, StepOutcome, SubjectReport, SubjectStatus};
pub use physio::{PhysioCandidate, PhysioFileOutcome, PhysioRunReport, PhysioScan};
