//! Cache restore for Oxide CI (S3/R2 compatible).

mod cancel;
pub mod downloader;
pub mod keys;
pub mod resolver;
pub mod restore;
pub mod s3;

pub use downloader::{DownloadReport, RetryingDownloader, default_transfer_options, download};
pub use keys::{parse_key_list, truncate_key, validate_keys};
pub use resolver::{KeyResolver, resolve};
pub use restore::{CacheRestorer, restore_from_store};
pub use s3::{S3Settings, S3Store};
