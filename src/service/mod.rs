pub mod converse_service;
pub mod recording_service;
