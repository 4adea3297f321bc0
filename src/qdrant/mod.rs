//! Vector store access
//!
//! [`QdrantConnector`] is the only type the tool layer talks to. It sits on a
//! [`VectorBackend`]: either a Qdrant server or the in-process [`LocalBackend`].

mod backend;
mod connector;
mod entry;
mod local;
mod remote;

pub use backend::{BackendError, PointRecord, ScoredRecord, VectorBackend};
pub use connector::{QdrantConnector, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
pub use entry::{Entry, Metadata, DOCUMENT_KEY, METADATA_KEY};
pub use local::LocalBackend;
pub use remote::QdrantBackend;
