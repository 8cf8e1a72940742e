pub mod cpu_regs;
pub mod cycle_manager;
pub mod emu;
pub mod memory;
pub mod wifi;
pub mod wifi_buf;
pub mod wifi_link;
