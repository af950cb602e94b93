pub mod api_routes;
pub mod recording_routes;
pub mod ws_routes;
