//! # populator
//!
//! Writes small synthetic files that real applications open without
//! complaint: Word, Excel and PowerPoint packages, PDF, PNG, JPEG, MP3, ZIP
//! and plain text. Content comes from a pluggable [`TextSource`]; every
//! format is produced by hand from its container structure.
//!
//! ## Quick Start
//!
//! ```
//! use populator::{FileFactory, Format, validate};
//!
//! let mut factory = FileFactory::seeded(7);
//! let bytes = factory.encode_to_vec(Format::Docx)?;
//! validate::check(Format::Docx, &bytes)?;
//! # Ok::<(), populator::Error>(())
//! ```
//!
//! ## Filling folders
//!
//! ```no_run
//! use std::path::Path;
//! use populator::{FileFactory, PopulateConfig, populate, target_folders, user_directories};
//!
//! let config = PopulateConfig::default();
//! let mut factory = FileFactory::from_entropy();
//! for user in user_directories(Path::new("C:\\Users"), &config)? {
//!     let dirs = target_folders(&user, &config)?;
//!     let stats = populate(&mut factory, &dirs, &config);
//!     println!("{} files, {} failures", stats.files, stats.failures);
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod encode;
pub mod error;
pub mod factory;
pub mod format;
pub mod lorem;
pub mod populate;
pub mod validate;

pub use error::{Error, ErrorKind, Result};
pub use factory::FileFactory;
pub use format::Format;
pub use lorem::{FixedText, LoremIpsum, TextSource};
pub use populate::{
    PopulateConfig, PopulateStats, populate, populate_dir, target_folders, user_directories,
};
