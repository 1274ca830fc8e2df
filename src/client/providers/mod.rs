pub mod crossref;
pub mod google_books;
pub mod open_library;
pub mod semantic_scholar;
pub mod traits;
pub mod zotero;

pub use crossref::CrossrefProvider;
pub use google_books::GoogleBooksProvider;
pub use open_library::OpenLibraryProvider;
pub use semantic_scholar::SemanticScholarProvider;
pub use traits::{
    title_overlap_confidence, BibProvider, LookupContext, LookupQuery, ProviderError,
};
pub use zotero::ZoteroProvider;
