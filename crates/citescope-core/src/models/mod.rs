mod document;
mod paper;

pub use document::{CitationDocument, QueryInfo, SeedPaper};
pub use paper::{PaperRecord, SourceTag};
