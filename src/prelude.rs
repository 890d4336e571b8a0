//! The prelude brings the request extension trait into scope.
//!
//! ```
//! use ranger::prelude::*;
//! ```

pub use crate::ext::RequestExt;
