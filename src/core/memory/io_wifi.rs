use crate::core::emu::Emu;
use crate::core::memory::regions;
use crate::core::wifi::{PaketType, WIFI_ID};
use crate::logging::debug_println;

impl Emu {
    /// 16 bit read of the wifi register at `addr_offset` from the start of an I/O mirror.
    pub fn wifi_io_read16(&mut self, addr_offset: u32) -> u16 {
        match addr_offset & (regions::WIFI_IO_SIZE - 2) {
            0x000 => WIFI_ID,
            0x006 => self.wifi_get_w_mode_wep(),
            0x008 => self.wifi_get_w_txstat_cnt(),
            0x010 => self.wifi_get_w_irf(),
            0x012 => self.wifi_get_w_ie(),
            0x018 => self.wifi_get_w_macaddr(0),
            0x01A => self.wifi_get_w_macaddr(1),
            0x01C => self.wifi_get_w_macaddr(2),
            0x020 => self.wifi_get_w_bssid(0),
            0x022 => self.wifi_get_w_bssid(1),
            0x024 => self.wifi_get_w_bssid(2),
            0x02A => self.wifi_get_w_aid_full(),
            0x030 => self.wifi_get_w_rxcnt(),
            0x03C => self.wifi_get_w_powerstate(),
            0x040 => self.wifi_get_w_powerforce(),
            0x050 => self.wifi_get_w_rxbuf_begin(),
            0x052 => self.wifi_get_w_rxbuf_end(),
            0x054 => self.wifi_get_w_rxbuf_wrcsr(),
            0x056 => self.wifi_get_w_rxbuf_wr_addr(),
            0x058 => self.wifi_get_w_rxbuf_rd_addr(),
            0x05A => self.wifi_get_w_rxbuf_readcsr(),
            0x05C => self.wifi_get_w_rxbuf_count(),
            0x060 => self.wifi_get_w_rxbuf_rd_data(),
            0x062 => self.wifi_get_w_rxbuf_gap(),
            0x064 => self.wifi_get_w_rxbuf_gapdisp(),
            0x068 => self.wifi_get_w_txbuf_wr_addr(),
            0x06C => self.wifi_get_w_txbuf_count(),
            0x074 => self.wifi_get_w_txbuf_gap(),
            0x076 => self.wifi_get_w_txbuf_gapdisp(),
            0x080 => self.wifi_get_w_txbuf_loc(PaketType::BeaconFrame),
            0x08C => self.wifi_get_w_beacon_int(),
            0x090 => self.wifi_get_w_txbuf_loc(PaketType::CmdFrame),
            0x0A0 => self.wifi_get_w_txbuf_loc(PaketType::Loc1Frame),
            0x0A4 => self.wifi_get_w_txbuf_loc(PaketType::Loc2Frame),
            0x0A8 => self.wifi_get_w_txbuf_loc(PaketType::Loc3Frame),
            0x0B0 => self.wifi_get_w_txreq_read(),
            0x0E8 => self.wifi_get_w_us_countcnt(),
            0x0EA => self.wifi_get_w_us_comparecnt(),
            0x0F0 => self.wifi_get_w_us_compare(0),
            0x0F2 => self.wifi_get_w_us_compare(1),
            0x0F4 => self.wifi_get_w_us_compare(2),
            0x0F6 => self.wifi_get_w_us_compare(3),
            0x0F8 => self.wifi_get_w_us_count(0),
            0x0FA => self.wifi_get_w_us_count(1),
            0x0FC => self.wifi_get_w_us_count(2),
            0x0FE => self.wifi_get_w_us_count(3),
            0x110 => self.wifi_get_w_pre_beacon(),
            0x11C => self.wifi_get_w_beacon_count(),
            0x120 => self.wifi_get_w_config(0),
            0x122 => self.wifi_get_w_config(1),
            0x124 => self.wifi_get_w_config(2),
            0x128 => self.wifi_get_w_config(3),
            0x130 => self.wifi_get_w_config(4),
            0x132 => self.wifi_get_w_config(5),
            0x134 => self.wifi_get_w_post_beacon(),
            0x140 => self.wifi_get_w_config(6),
            0x142 => self.wifi_get_w_config(7),
            0x144 => self.wifi_get_w_config(8),
            0x146 => self.wifi_get_w_config(9),
            0x148 => self.wifi_get_w_config(10),
            0x14A => self.wifi_get_w_config(11),
            0x14C => self.wifi_get_w_config(12),
            0x150 => self.wifi_get_w_config(13),
            0x154 => self.wifi_get_w_config(14),
            0x15A => self.wifi_get_w_bb_write(),
            0x15C => self.wifi_get_w_bb_read(),
            offset => {
                debug_println!("unknown wifi io read {offset:x}");
                0
            }
        }
    }

    pub fn wifi_io_write16(&mut self, addr_offset: u32, mask: u16, value: u16) {
        match addr_offset & (regions::WIFI_IO_SIZE - 2) {
            0x006 => self.wifi_set_w_mode_wep(mask, value),
            0x008 => self.wifi_set_w_txstat_cnt(mask, value),
            0x010 => self.wifi_set_w_irf(mask, value),
            0x012 => self.wifi_set_w_ie(mask, value),
            0x018 => self.wifi_set_w_macaddr(0, mask, value),
            0x01A => self.wifi_set_w_macaddr(1, mask, value),
            0x01C => self.wifi_set_w_macaddr(2, mask, value),
            0x020 => self.wifi_set_w_bssid(0, mask, value),
            0x022 => self.wifi_set_w_bssid(1, mask, value),
            0x024 => self.wifi_set_w_bssid(2, mask, value),
            0x02A => self.wifi_set_w_aid_full(mask, value),
            0x030 => self.wifi_set_w_rxcnt(mask, value),
            0x03C => self.wifi_set_w_powerstate(mask, value),
            0x040 => self.wifi_set_w_powerforce(mask, value),
            0x050 => self.wifi_set_w_rxbuf_begin(mask, value),
            0x052 => self.wifi_set_w_rxbuf_end(mask, value),
            0x056 => self.wifi_set_w_rxbuf_wr_addr(mask, value),
            0x058 => self.wifi_set_w_rxbuf_rd_addr(mask, value),
            0x05A => self.wifi_set_w_rxbuf_readcsr(mask, value),
            0x05C => self.wifi_set_w_rxbuf_count(mask, value),
            0x062 => self.wifi_set_w_rxbuf_gap(mask, value),
            0x064 => self.wifi_set_w_rxbuf_gapdisp(mask, value),
            0x068 => self.wifi_set_w_txbuf_wr_addr(mask, value),
            0x06C => self.wifi_set_w_txbuf_count(mask, value),
            0x070 => self.wifi_set_w_txbuf_wr_data(mask, value),
            0x074 => self.wifi_set_w_txbuf_gap(mask, value),
            0x076 => self.wifi_set_w_txbuf_gapdisp(mask, value),
            0x080 => self.wifi_set_w_txbuf_loc(PaketType::BeaconFrame, mask, value),
            0x08C => self.wifi_set_w_beacon_int(mask, value),
            0x090 => self.wifi_set_w_txbuf_loc(PaketType::CmdFrame, mask, value),
            0x0A0 => self.wifi_set_w_txbuf_loc(PaketType::Loc1Frame, mask, value),
            0x0A4 => self.wifi_set_w_txbuf_loc(PaketType::Loc2Frame, mask, value),
            0x0A8 => self.wifi_set_w_txbuf_loc(PaketType::Loc3Frame, mask, value),
            0x0AC => self.wifi_set_w_txreq_reset(mask, value),
            0x0AE => self.wifi_set_w_txreq_set(mask, value),
            0x0E8 => self.wifi_set_w_us_countcnt(mask, value),
            0x0EA => self.wifi_set_w_us_comparecnt(mask, value),
            0x0F0 => self.wifi_set_w_us_compare(0, mask, value),
            0x0F2 => self.wifi_set_w_us_compare(1, mask, value),
            0x0F4 => self.wifi_set_w_us_compare(2, mask, value),
            0x0F6 => self.wifi_set_w_us_compare(3, mask, value),
            0x0F8 => self.wifi_set_w_us_count(0, mask, value),
            0x0FA => self.wifi_set_w_us_count(1, mask, value),
            0x0FC => self.wifi_set_w_us_count(2, mask, value),
            0x0FE => self.wifi_set_w_us_count(3, mask, value),
            0x110 => self.wifi_set_w_pre_beacon(mask, value),
            0x11C => self.wifi_set_w_beacon_count(mask, value),
            0x120 => self.wifi_set_w_config(0, mask, value),
            0x122 => self.wifi_set_w_config(1, mask, value),
            0x124 => self.wifi_set_w_config(2, mask, value),
            0x128 => self.wifi_set_w_config(3, mask, value),
            0x130 => self.wifi_set_w_config(4, mask, value),
            0x132 => self.wifi_set_w_config(5, mask, value),
            0x134 => self.wifi_set_w_post_beacon(mask, value),
            0x140 => self.wifi_set_w_config(6, mask, value),
            0x142 => self.wifi_set_w_config(7, mask, value),
            0x144 => self.wifi_set_w_config(8, mask, value),
            0x146 => self.wifi_set_w_config(9, mask, value),
            0x148 => self.wifi_set_w_config(10, mask, value),
            0x14A => self.wifi_set_w_config(11, mask, value),
            0x14C => self.wifi_set_w_config(12, mask, value),
            0x150 => self.wifi_set_w_config(13, mask, value),
            0x154 => self.wifi_set_w_config(14, mask, value),
            0x158 => self.wifi_set_w_bb_cnt(mask, value),
            0x15A => self.wifi_set_w_bb_write(mask, value),
            0x21C => self.wifi_set_w_irf_set(mask, value),
            offset => debug_println!("unknown wifi io write {offset:x} {value:x}"),
        }
    }

    pub fn wifi_ram_read16(&self, addr_offset: u32) -> u16 {
        self.wifi_ram.read16(addr_offset)
    }

    pub fn wifi_ram_write16(&mut self, addr_offset: u32, mask: u16, value: u16) {
        let old = self.wifi_ram.read16(addr_offset);
        self.wifi_ram.write16(addr_offset, (old & !mask) | (value & mask));
    }

    /// Decodes an ARM7 bus address inside the wifi region. Quarters 0 and 3 of each 32 KiB
    /// half hit the registers, quarter 2 hits ram, quarter 1 is open.
    pub fn wifi_bus_read16(&mut self, addr: u32) -> u16 {
        let addr_offset = addr.wrapping_sub(regions::WIFI_IO_OFFSET) & (regions::WIFI_REGION_SIZE - 1);
        match (addr_offset >> 13) & 3 {
            0 | 3 => self.wifi_io_read16(addr_offset),
            2 => self.wifi_ram_read16(addr_offset),
            _ => 0,
        }
    }

    pub fn wifi_bus_write16(&mut self, addr: u32, value: u16) {
        let addr_offset = addr.wrapping_sub(regions::WIFI_IO_OFFSET) & (regions::WIFI_REGION_SIZE - 1);
        match (addr_offset >> 13) & 3 {
            0 | 3 => self.wifi_io_write16(addr_offset, 0xFFFF, value),
            2 => self.wifi_ram_write16(addr_offset, 0xFFFF, value),
            _ => debug_println!("wifi write to open bus {addr:x}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::emu::Emu;
    use crate::core::memory::regions;
    use crate::core::wifi::{PaketType, WIFI_ID};
    use crate::core::wifi_link::WifiHub;
    use crate::settings::DEFAULT_SETTINGS;
    use pretty_assertions::assert_eq;

    #[test]
    fn chip_id_in_both_mirrors() {
        let hub = WifiHub::new();
        let mut emu = Emu::new(&hub, DEFAULT_SETTINGS.clone());
        assert_eq!(emu.wifi_bus_read16(regions::WIFI_IO_OFFSET), WIFI_ID);
        assert_eq!(emu.wifi_bus_read16(regions::WIFI_IO_OFFSET2), WIFI_ID);
        assert_eq!(emu.wifi_bus_read16(regions::WIFI_IO_OFFSET + 0x2000), 0);
    }

    #[test]
    fn registers_and_ram_are_mapped() {
        let hub = WifiHub::new();
        let mut emu = Emu::new(&hub, DEFAULT_SETTINGS.clone());

        emu.wifi_bus_write16(regions::WIFI_IO_OFFSET2 + 0x0A0, 0x8123);
        assert_eq!(emu.wifi_get_w_txbuf_loc(PaketType::Loc1Frame), 0x8123);
        emu.wifi_bus_write16(regions::WIFI_IO_OFFSET2 + 0x02A, 0xFFFF);
        assert_eq!(emu.wifi_bus_read16(regions::WIFI_IO_OFFSET2 + 0x02A), 0x07FF);
        assert_eq!(emu.wifi_bus_read16(regions::WIFI_IO_OFFSET2 + 0x120), 0x0048);

        emu.wifi_bus_write16(regions::WIFI_RAM_OFFSET + 0x10, 0xCAFE);
        assert_eq!(emu.wifi_ram.read16(0x10), 0xCAFE);
        assert_eq!(emu.wifi_bus_read16(regions::WIFI_RAM_OFFSET + 0x10), 0xCAFE);
    }

    #[test]
    fn tx_data_port_writes_through_to_ram() {
        let hub = WifiHub::new();
        let mut emu = Emu::new(&hub, DEFAULT_SETTINGS.clone());
        emu.wifi_io_write16(0x068, 0xFFFF, 0x0200);
        emu.wifi_io_write16(0x070, 0xFFFF, 0x1234);
        emu.wifi_io_write16(0x070, 0xFFFF, 0x5678);
        assert_eq!(emu.wifi_bus_read16(regions::WIFI_RAM_OFFSET + 0x200), 0x1234);
        assert_eq!(emu.wifi_bus_read16(regions::WIFI_RAM_OFFSET + 0x202), 0x5678);
        assert_eq!(emu.wifi_io_read16(0x068), 0x0204);
    }

    #[test]
    fn unknown_offsets_read_zero() {
        let hub = WifiHub::new();
        let mut emu = Emu::new(&hub, DEFAULT_SETTINGS.clone());
        emu.wifi_io_write16(0x300, 0xFFFF, 0x1234);
        assert_eq!(emu.wifi_io_read16(0x300), 0);
    }
}
