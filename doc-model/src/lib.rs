//! Shared domain types for the document search core: identifiers, the
//! Resource/Chunk/Category records, query intent, and search result shapes.
//! Every other crate in the workspace depends on this one; it has no
//! dependency on storage, embedding, or I/O crates.

pub mod audit;
pub mod category;
pub mod chunk;
pub mod ids;
pub mod normalize;
pub mod pagination;
pub mod query;
pub mod resource;
pub mod suggestion;

pub use audit::{AuditAction, AuditEntry};
pub use category::{seed_default_categories, Category};
pub use chunk::{Chunk, ChunkTextField};
pub use ids::{CallerId, CategoryType, ChunkId, FileId, ResourceId, TenantId};
pub use pagination::Pagination;
pub use query::{build_highlight, Highlight, MatchType, MoneyAmount, QueryIntent, SearchResult};
pub use resource::{FileType, Resource, ResourceValidationError};
pub use suggestion::{SuggestionCategory, SuggestionEntry};
