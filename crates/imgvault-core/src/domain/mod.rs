//! Domain model (ids, records, outcomes, events, errors).

pub mod errors;
pub mod events;
pub mod ids;
pub mod image;
pub mod outcome;

pub use errors::{
    CodecError, ErrorKind, FetchError, FileError, PollError, RestoreError, StoreError,
};
pub use events::DomainEvent;
pub use ids::{ImageId, RunId};
pub use image::StoredImage;
pub use outcome::{FileFailure, FileOutcome, IngestReport};
