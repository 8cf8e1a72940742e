pub mod io_wifi;
pub mod regions;
pub mod wifi;
