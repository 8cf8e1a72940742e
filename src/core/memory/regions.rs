use static_assertions::const_assert;

pub const WIFI_IO_OFFSET: u32 = 0x04800000;
pub const WIFI_RAM_OFFSET: u32 = 0x04804000;
pub const WIFI_IO_OFFSET2: u32 = 0x04808000;
pub const WIFI_REGION_SIZE: u32 = 64 * 1024;

pub const WIFI_RAM_SIZE: u32 = 8 * 1024;
pub const WIFI_IO_SIZE: u32 = 4 * 1024;

const_assert!(WIFI_RAM_SIZE.is_power_of_two());
const_assert!(WIFI_IO_SIZE.is_power_of_two());
