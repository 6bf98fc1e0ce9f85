pub mod request_params;
pub mod trade;
