//! Record processing: résumé import, sanitization, suggestion curation, edit application
//! and merging back onto the original

pub mod applier;
pub mod audit;
pub mod importer;
pub mod ledger;
pub mod merger;
pub mod record;
pub mod sanitizer;
pub mod session;
pub mod suggestion;

pub use importer::{LocalPii, ResumeImporter};
pub use ledger::{Selection, SuggestionLedger};
pub use merger::{AlignmentReport, ResumeMerger};
pub use record::Record;
pub use sanitizer::PiiSanitizer;
pub use session::{TailoredOutcome, TailoringSession};
pub use suggestion::{Priority, Suggestion, SuggestionType};
