/*!
Download/upload adapters.
*/

pub mod download;
pub mod upload;

pub use download::{DownloadAdapter, DownloadMessage, FileStat, OutboundSink};
pub use upload::UploadAdapter;
