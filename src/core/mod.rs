pub mod download;
pub mod filename;
pub mod playback;
pub mod saver;
pub mod search;
