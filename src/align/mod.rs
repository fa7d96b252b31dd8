pub mod cigar;
pub mod record;
pub mod source;

// Re-export commonly used types
pub use cigar::{CigarOp, cigar_string, parse_cigar};
pub use record::{AlignmentRecord, Reference};
pub use source::{AlignmentSource, MemorySource};
