pub mod face_filter;
pub mod status_cache;
