use crate::core::memory::regions;
use crate::utils;
use crate::utils::HeapMemU8;

pub struct WifiRam {
    pub mem: HeapMemU8<{ regions::WIFI_RAM_SIZE as usize }>,
}

impl WifiRam {
    pub fn new() -> Self {
        WifiRam { mem: HeapMemU8::new() }
    }

    pub fn read16(&self, addr_offset: u32) -> u16 {
        utils::read_u16_le(self.mem.as_slice(), (addr_offset & (regions::WIFI_RAM_SIZE - 2)) as usize)
    }

    pub fn write16(&mut self, addr_offset: u32, value: u16) {
        utils::write_u16_le(self.mem.as_mut_slice(), (addr_offset & (regions::WIFI_RAM_SIZE - 2)) as usize, value);
    }
}

impl Default for WifiRam {
    fn default() -> Self {
        WifiRam::new()
    }
}
