use crate::core::cpu_regs::InterruptFlag;
use crate::core::cycle_manager::EventType;
use crate::core::emu::Emu;
use crate::core::wifi_buf::WifiBuf;
use crate::core::wifi_link::{Packet, StationId, WifiHub, WifiLink};
use crate::logging::debug_println;
use crate::utils::align_up;
use bilge::prelude::*;
use paste::paste;
use static_assertions::const_assert_eq;
use std::mem;
use std::sync::Arc;

pub const WIFI_ID: u16 = 0x1440;

pub const ARM7_CLOCK: u64 = 33_513_982;
/// One service tick is one beacon time unit.
pub const US_PER_TICK: u64 = 1024;
pub const TICK_CYCLES: u32 = (ARM7_CLOCK * US_PER_TICK / 1_000_000) as u32;

pub const TX_HEADER_SIZE: usize = 12;
pub const RX_HEADER_SIZE: usize = 12;
pub const FCS_SIZE: usize = 4;
const RX_RSSI: u16 = 0x0010;

const_assert_eq!(TX_HEADER_SIZE % 4, 0);
const_assert_eq!(RX_HEADER_SIZE % 4, 0);

#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WifiIrq {
    RxComplete = 0,
    TxComplete = 1,
    RxEventIncrement = 2,
    TxErrorIncrement = 3,
    RxEventHalfOverflow = 4,
    TxErrorHalfOverflow = 5,
    RxStart = 6,
    TxStart = 7,
    TxbufCountExpired = 8,
    RxbufCountExpired = 9,
    RfWakeup = 11,
    MultiplayCmdDone = 12,
    PostBeacon = 13,
    Beacon = 14,
    PreBeacon = 15,
}

impl WifiIrq {
    pub const fn bit(self) -> u16 {
        1 << self as u8
    }
}

#[bitsize(16)]
#[derive(FromBits)]
struct WBBCnt {
    index: u8,
    not_used: u4,
    direction: u4,
}

#[bitsize(16)]
#[derive(Copy, Clone, FromBits)]
struct WTxbufLoc {
    addr: u12,
    ieee_seq: bool,
    not_used: u2,
    enable: bool,
}

#[bitsize(16)]
#[derive(FromBits)]
struct WPowerforce {
    value: bool,
    not_used: u14,
    enable: bool,
}

#[bitsize(16)]
#[derive(FromBits)]
struct WUsCompareCnt {
    enable: bool,
    force_beacon: bool,
    not_used: u14,
}

#[bitsize(16)]
#[derive(FromBits)]
struct TxHeaderLength {
    len: u14,
    not_used: u2,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PaketType {
    Loc1Frame = 0,
    CmdFrame = 1,
    Loc2Frame = 2,
    Loc3Frame = 3,
    BeaconFrame = 4,
}

impl From<u8> for PaketType {
    fn from(value: u8) -> Self {
        debug_assert!(value <= PaketType::BeaconFrame as u8);
        unsafe { mem::transmute(value) }
    }
}

pub struct Wifi {
    pub w_mode_wep: u16,
    pub w_txstat_cnt: u16,
    pub w_irf: u16,
    pub w_ie: u16,
    pub w_macaddr: [u16; 3],
    pub w_bssid: [u16; 3],
    pub w_aid_full: u16,
    pub w_rxcnt: u16,
    pub w_powerstate: u16,
    pub w_powerforce: u16,
    pub rx: WifiBuf,
    pub tx: WifiBuf,
    pub w_txbuf_loc: [u16; 5],
    pub w_beacon_int: u16,
    pub w_txreq_read: u16,
    pub w_us_countcnt: u16,
    pub w_us_comparecnt: u16,
    pub w_us_compare: u64,
    pub w_us_count: u64,
    pub w_pre_beacon: u16,
    pub w_beacon_count: u16,
    pub w_post_beacon: u16,
    pub w_bb_write: u16,
    pub w_bb_read: u16,
    bb_registers: [u8; 0x100],
    pub w_config: [u16; 15],
    scheduled: bool,
    pub rx_frames: u32,
    pub tx_frames: u32,
    pub link: WifiLink,
}

impl Wifi {
    pub fn new(hub: &Arc<WifiHub>) -> Self {
        let mut bb_registers = [0; 0x100];
        bb_registers[0x00] = 0x6D;
        bb_registers[0x5D] = 0x01;
        bb_registers[0x64] = 0xFF;
        Wifi {
            w_mode_wep: 0,
            w_txstat_cnt: 0,
            w_irf: 0,
            w_ie: 0,
            w_macaddr: [0; 3],
            w_bssid: [0; 3],
            w_aid_full: 0,
            w_rxcnt: 0,
            w_powerstate: 0x200,
            w_powerforce: 0,
            rx: WifiBuf::new(),
            tx: WifiBuf::new(),
            w_txbuf_loc: [0; 5],
            w_beacon_int: 0,
            w_txreq_read: 0x10,
            w_us_countcnt: 0,
            w_us_comparecnt: 0,
            w_us_compare: 0,
            w_us_count: 0,
            w_pre_beacon: 0,
            w_beacon_count: 0,
            w_post_beacon: 0,
            w_bb_write: 0,
            w_bb_read: 0,
            bb_registers,
            w_config: [0x0048, 0x4840, 0x0000, 0x0000, 0x0142, 0x8064, 0x0000, 0x2443, 0x0042, 0x0016, 0x0016, 0x0016, 0x162C, 0x0204, 0x0058],
            scheduled: false,
            rx_frames: 0,
            tx_frames: 0,
            link: WifiLink::new(hub),
        }
    }
}

macro_rules! wifi_reg {
    (indexed $name:ident, $field:ident, $mask:expr) => {
        paste! {
            impl Emu {
                pub fn [<wifi_get_w_ $name>](&self, index: usize) -> u16 {
                    self.wifi.$field[index]
                }

                pub fn [<wifi_set_w_ $name>](&mut self, index: usize, mut mask: u16, value: u16) {
                    mask &= $mask;
                    self.wifi.$field[index] = (self.wifi.$field[index] & !mask) | (value & mask);
                }
            }
        }
    };
    ($name:ident, $($field:ident).+, $mask:expr) => {
        paste! {
            impl Emu {
                pub fn [<wifi_get_w_ $name>](&self) -> u16 {
                    self.wifi.$($field).+
                }

                pub fn [<wifi_set_w_ $name>](&mut self, mut mask: u16, value: u16) {
                    mask &= $mask;
                    self.wifi.$($field).+ = (self.wifi.$($field).+ & !mask) | (value & mask);
                }
            }
        }
    };
}

wifi_reg!(mode_wep, w_mode_wep, 0xFFFF);
wifi_reg!(txstat_cnt, w_txstat_cnt, 0xF000);
wifi_reg!(indexed macaddr, w_macaddr, 0xFFFF);
wifi_reg!(indexed bssid, w_bssid, 0xFFFF);
wifi_reg!(aid_full, w_aid_full, 0x07FF);
wifi_reg!(rxbuf_begin, rx.begin, 0xFFFF);
wifi_reg!(rxbuf_end, rx.end, 0xFFFF);
wifi_reg!(rxbuf_wr_addr, rx.wr_addr, 0x0FFF);
wifi_reg!(rxbuf_rd_addr, rx.rd_addr, 0x1FFE);
wifi_reg!(rxbuf_readcsr, rx.read_csr, 0x0FFF);
wifi_reg!(rxbuf_count, rx.count, 0x0FFF);
wifi_reg!(rxbuf_gap, rx.gap, 0x1FFE);
wifi_reg!(rxbuf_gapdisp, rx.gap_disp, 0x0FFF);
wifi_reg!(txbuf_wr_addr, tx.wr_csr, 0x1FFE);
wifi_reg!(txbuf_count, tx.count, 0x0FFF);
wifi_reg!(txbuf_gap, tx.gap, 0x1FFE);
wifi_reg!(txbuf_gapdisp, tx.gap_disp, 0x0FFF);
wifi_reg!(us_countcnt, w_us_countcnt, 0x0001);
wifi_reg!(pre_beacon, w_pre_beacon, 0xFFFF);
wifi_reg!(beacon_count, w_beacon_count, 0xFFFF);
wifi_reg!(post_beacon, w_post_beacon, 0xFFFF);
wifi_reg!(bb_write, w_bb_write, 0xFFFF);

impl Emu {
    pub fn wifi_get_w_irf(&self) -> u16 {
        self.wifi.w_irf
    }

    pub fn wifi_get_w_ie(&self) -> u16 {
        self.wifi.w_ie
    }

    pub fn wifi_get_w_rxcnt(&self) -> u16 {
        self.wifi.w_rxcnt
    }

    pub fn wifi_get_w_powerstate(&self) -> u16 {
        self.wifi.w_powerstate
    }

    pub fn wifi_get_w_powerforce(&self) -> u16 {
        self.wifi.w_powerforce
    }

    pub fn wifi_get_w_rxbuf_wrcsr(&self) -> u16 {
        self.wifi.rx.wr_csr >> 1
    }

    pub fn wifi_get_w_rxbuf_rd_data(&mut self) -> u16 {
        let value = self.wifi_ram.read16(self.wifi.rx.rd_addr as u32);
        self.wifi.rx.rd_addr = self.wifi.rx.advance(self.wifi.rx.rd_addr);
        if self.wifi.rx.consume() {
            self.wifi_send_interrupt(WifiIrq::RxbufCountExpired);
        }
        value
    }

    pub fn wifi_get_w_txbuf_loc(&self, paket_type: PaketType) -> u16 {
        self.wifi.w_txbuf_loc[paket_type as usize]
    }

    pub fn wifi_get_w_beacon_int(&self) -> u16 {
        self.wifi.w_beacon_int
    }

    pub fn wifi_get_w_txreq_read(&self) -> u16 {
        self.wifi.w_txreq_read
    }

    pub fn wifi_get_w_us_comparecnt(&self) -> u16 {
        self.wifi.w_us_comparecnt
    }

    pub fn wifi_get_w_us_compare(&self, index: usize) -> u16 {
        (self.wifi.w_us_compare >> (index * 16)) as u16
    }

    pub fn wifi_get_w_us_count(&self, index: usize) -> u16 {
        (self.wifi.w_us_count >> (index * 16)) as u16
    }

    pub fn wifi_get_w_config(&self, index: usize) -> u16 {
        self.wifi.w_config[index]
    }

    pub fn wifi_get_w_bb_read(&self) -> u16 {
        self.wifi.w_bb_read
    }

    pub fn wifi_set_w_irf(&mut self, mask: u16, value: u16) {
        self.wifi.w_irf &= !(value & mask);
    }

    pub fn wifi_set_w_ie(&mut self, mut mask: u16, value: u16) {
        mask &= 0xFBFF;
        if self.wifi.w_ie & self.wifi.w_irf == 0 && value & mask & self.wifi.w_irf != 0 {
            self.cpu_send_interrupt(InterruptFlag::Wifi);
        }
        self.wifi.w_ie = (self.wifi.w_ie & !mask) | (value & mask);
    }

    pub fn wifi_set_w_rxcnt(&mut self, mut mask: u16, value: u16) {
        let latch = value & mask & 0x1 != 0;
        mask &= 0xFF0E;
        self.wifi.w_rxcnt = (self.wifi.w_rxcnt & !mask) | (value & mask);

        if latch {
            self.wifi.rx.wr_csr = self.wifi.rx.wr_addr << 1;
            debug_println!("wifi rx write cursor latched at {:x}", self.wifi.rx.wr_csr);
        }
    }

    pub fn wifi_set_w_powerstate(&mut self, mut mask: u16, value: u16) {
        mask &= 0x0003;
        self.wifi.w_powerstate = (self.wifi.w_powerstate & !mask) | (value & mask);

        if self.wifi.w_powerstate & 0x2 != 0 {
            self.wifi.w_powerstate &= !(1 << 9);
        }
    }

    pub fn wifi_set_w_powerforce(&mut self, mut mask: u16, value: u16) {
        mask &= 0x8001;
        self.wifi.w_powerforce = (self.wifi.w_powerforce & !mask) | (value & mask);

        let powerforce = WPowerforce::from(self.wifi.w_powerforce);
        if powerforce.enable() {
            self.wifi.w_powerstate = (self.wifi.w_powerstate & !(1 << 9)) | ((powerforce.value() as u16) << 9);
        }
    }

    pub fn wifi_set_w_txbuf_wr_data(&mut self, mask: u16, value: u16) {
        let addr = self.wifi.tx.wr_csr;
        let old = self.wifi_ram.read16(addr as u32);
        self.wifi_ram.write16(addr as u32, (old & !mask) | (value & mask));

        self.wifi.tx.wr_csr = self.wifi.tx.advance(addr);
        if self.wifi.tx.consume() {
            self.wifi_send_interrupt(WifiIrq::TxbufCountExpired);
        }
    }

    pub fn wifi_set_w_txbuf_loc(&mut self, paket_type: PaketType, mask: u16, value: u16) {
        let index = paket_type as usize;
        self.wifi.w_txbuf_loc[index] = (self.wifi.w_txbuf_loc[index] & !mask) | (value & mask);

        if paket_type != PaketType::BeaconFrame && WTxbufLoc::from(self.wifi.w_txbuf_loc[index]).enable() && self.wifi.w_txreq_read & (1 << index) != 0 {
            self.wifi_transfer(paket_type);
        }
    }

    pub fn wifi_set_w_beacon_int(&mut self, mut mask: u16, value: u16) {
        mask &= 0x03FF;
        self.wifi.w_beacon_int = (self.wifi.w_beacon_int & !mask) | (value & mask);

        self.wifi.w_beacon_count = self.wifi.w_beacon_int;
    }

    pub fn wifi_set_w_txreq_reset(&mut self, mut mask: u16, value: u16) {
        mask &= 0x000F;
        self.wifi.w_txreq_read &= !(value & mask);
    }

    pub fn wifi_set_w_txreq_set(&mut self, mut mask: u16, value: u16) {
        mask &= 0x000F;
        let raised = value & mask & !self.wifi.w_txreq_read;
        self.wifi.w_txreq_read |= value & mask;

        for i in 0..4 {
            if raised & (1 << i) != 0 && WTxbufLoc::from(self.wifi.w_txbuf_loc[i]).enable() {
                self.wifi_transfer(PaketType::from(i as u8));
            }
        }
    }

    pub fn wifi_set_w_us_comparecnt(&mut self, mut mask: u16, value: u16) {
        let cnt = WUsCompareCnt::from(value & mask);
        mask &= 0x0001;
        self.wifi.w_us_comparecnt = (self.wifi.w_us_comparecnt & !mask) | (value & mask);

        if cnt.force_beacon() {
            debug_println!("wifi forced beacon");
            self.wifi_beacon_event();
        }
    }

    pub fn wifi_set_w_us_compare(&mut self, index: usize, mut mask: u16, value: u16) {
        let shift = 16 * index;
        mask &= if index != 0 { 0xFFFF } else { 0xFC00 };
        self.wifi.w_us_compare = (self.wifi.w_us_compare & !((mask as u64) << shift)) | (((value & mask) as u64) << shift);
    }

    pub fn wifi_set_w_us_count(&mut self, index: usize, mask: u16, value: u16) {
        let shift = 16 * index;
        self.wifi.w_us_count = (self.wifi.w_us_count & !((mask as u64) << shift)) | (((value & mask) as u64) << shift);
    }

    pub fn wifi_set_w_config(&mut self, index: usize, mut mask: u16, value: u16) {
        const MASKS: [u16; 15] = [0x81FF, 0xFFFF, 0xFFFF, 0xFFFF, 0x0FFF, 0x8FFF, 0xFFFF, 0xFFFF, 0x00FF, 0x00FF, 0x00FF, 0x00FF, 0xFFFF, 0xFF3F, 0x7A7F];

        mask &= MASKS[index];
        self.wifi.w_config[index] = (self.wifi.w_config[index] & !mask) | (value & mask);
    }

    pub fn wifi_set_w_bb_cnt(&mut self, mask: u16, value: u16) {
        let cnt = WBBCnt::from(value & mask);
        let index = cnt.index();
        match u8::from(cnt.direction()) {
            5 => {
                if matches!(index, 0x01..=0x0C | 0x13..=0x15 | 0x1B..=0x26 | 0x28..=0x4C | 0x4E..=0x5C | 0x62..=0x63 | 0x65 | 0x67..=0x68) {
                    self.wifi.bb_registers[index as usize] = self.wifi.w_bb_write as u8;
                } else {
                    debug_println!("wifi write to read only baseband register {index:x}");
                }
            }
            6 => self.wifi.w_bb_read = self.wifi.bb_registers[index as usize] as u16,
            _ => {}
        }
    }

    pub fn wifi_set_w_irf_set(&mut self, mut mask: u16, value: u16) {
        mask &= 0xFBFF;
        if self.wifi.w_ie & self.wifi.w_irf == 0 && self.wifi.w_ie & value & mask != 0 {
            self.cpu_send_interrupt(InterruptFlag::Wifi);
        }
        self.wifi.w_irf |= value & mask;
    }

    pub fn wifi_send_interrupt(&mut self, irq: WifiIrq) {
        if self.wifi.w_ie & self.wifi.w_irf == 0 && self.wifi.w_ie & irq.bit() != 0 {
            debug_println!("wifi assert interrupt {irq:?}");
            self.cpu_send_interrupt(InterruptFlag::Wifi);
        }
        self.wifi.w_irf |= irq.bit();
    }

    fn wifi_read_tx_frame(&self, addr: u16) -> Packet {
        let len = TxHeaderLength::from(self.wifi_ram.read16(self.wifi.tx.wrap(addr + 0x0A) as u32));
        let size = align_up((TX_HEADER_SIZE + u16::from(len.len()) as usize) as u32, 2) as usize;
        let mut packet = Vec::with_capacity(size / 2);
        let mut cursor = addr;
        for _ in 0..size / 2 {
            packet.push(self.wifi_ram.read16(cursor as u32));
            cursor = self.wifi.tx.advance_write(cursor);
        }
        packet
    }

    fn wifi_transfer(&mut self, paket_type: PaketType) {
        let index = paket_type as usize;
        let mut loc = WTxbufLoc::from(self.wifi.w_txbuf_loc[index]);
        let addr = u16::from(loc.addr()) << 1;

        let packet = self.wifi_read_tx_frame(addr);
        let delivered = self.wifi.link.broadcast(&packet);
        debug_println!("wifi transfer {paket_type:?} from {addr:x}, {} halfwords to {delivered} peers", packet.len());
        self.wifi.tx_frames += 1;

        self.wifi_ram.write16(addr as u32, 0x0001);
        if paket_type != PaketType::BeaconFrame {
            loc.set_enable(false);
            self.wifi.w_txbuf_loc[index] = u16::from(loc);
            self.wifi.w_txreq_read &= !(1 << index);
        }
        self.wifi_send_interrupt(WifiIrq::TxComplete);
    }

    fn wifi_receive(&mut self, packet: &[u16]) -> bool {
        const TX_HEADER_HALFWORDS: usize = TX_HEADER_SIZE / 2;

        if packet.len() < TX_HEADER_HALFWORDS {
            debug_println!("wifi dropping runt frame of {} halfwords", packet.len());
            return false;
        }

        let rate = packet[4] & 0xFF;
        let len = u16::from(TxHeaderLength::from(packet[5]).len()) as usize;
        let body_len = len.saturating_sub(FCS_SIZE);
        let body = &packet[TX_HEADER_HALFWORDS..];
        let body = &body[..body.len().min(body_len.div_ceil(2))];
        let kind = match body.first() {
            Some(frame_control) if frame_control & 0x00FC == 0x0080 => 1,
            _ => 0,
        };

        let header: [u16; RX_HEADER_SIZE / 2] = [0x8000 | kind, 0, 0x0040, rate, body_len as u16, RX_RSSI];
        for value in header.iter().chain(body) {
            self.wifi_ram.write16(self.wifi.rx.wr_csr as u32, *value);
            self.wifi.rx.wr_csr = self.wifi.rx.advance_write(self.wifi.rx.wr_csr);
        }
        self.wifi.rx.align_write();
        true
    }

    pub fn wifi_process_packets(&mut self) {
        let packets = self.wifi.link.take_packets();
        if packets.is_empty() {
            return;
        }

        if self.wifi.w_rxcnt & (1 << 15) == 0 {
            debug_println!("wifi rx disabled, dropping {} frames", packets.len());
            return;
        }

        let mut received = 0;
        for packet in &packets {
            if self.wifi_receive(packet) {
                received += 1;
            }
        }
        debug_println!("wifi received {received} frames, rx write cursor at {:x}", self.wifi.rx.wr_csr);
        if received != 0 {
            self.wifi.rx_frames += received;
            self.wifi_send_interrupt(WifiIrq::RxComplete);
        }
    }

    fn wifi_beacon_event(&mut self) {
        self.wifi_send_interrupt(WifiIrq::Beacon);
        self.wifi.w_beacon_count = self.wifi.w_beacon_int;
        if WTxbufLoc::from(self.wifi.w_txbuf_loc[PaketType::BeaconFrame as usize]).enable() {
            self.wifi_transfer(PaketType::BeaconFrame);
        }
    }

    pub fn wifi_count_ms(&mut self) {
        self.wifi_process_packets();

        if self.wifi.w_us_countcnt & 0x1 != 0 {
            let compare_mode = self.wifi.w_us_comparecnt & 0x1 != 0;

            let prev_count = self.wifi.w_us_count;
            self.wifi.w_us_count = prev_count.wrapping_add(US_PER_TICK);
            let until_compare = self.wifi.w_us_compare.wrapping_sub(prev_count);
            if compare_mode && until_compare != 0 && until_compare <= US_PER_TICK {
                self.wifi_beacon_event();
                self.wifi.w_us_compare = self.wifi.w_us_compare.wrapping_add(self.wifi.w_beacon_int as u64 * US_PER_TICK);
            }

            if self.wifi.w_beacon_count != 0 {
                self.wifi.w_beacon_count -= 1;
                if self.wifi.w_beacon_count == 0 && !compare_mode {
                    self.wifi_beacon_event();
                }
            }

            if self.wifi.w_pre_beacon != 0 && self.wifi.w_beacon_count == self.wifi.w_pre_beacon >> 10 {
                self.wifi_send_interrupt(WifiIrq::PreBeacon);
            }

            if self.wifi.w_post_beacon != 0 {
                self.wifi.w_post_beacon -= 1;
                if self.wifi.w_post_beacon == 0 {
                    self.wifi_send_interrupt(WifiIrq::PostBeacon);
                }
            }
        }

        self.wifi.scheduled = false;
    }

    pub fn wifi_should_schedule(&self) -> bool {
        (self.wifi.link.has_connections() || self.wifi.w_us_countcnt != 0) && !self.wifi.scheduled
    }

    pub fn wifi_schedule_init(&mut self) {
        self.cm.schedule(TICK_CYCLES, EventType::WifiCountMs);
        self.wifi.scheduled = true;
    }

    pub fn wifi_station_id(&self) -> StationId {
        self.wifi.link.id()
    }

    pub fn wifi_add_connection(&self, peer: StationId) {
        self.wifi.link.add_connection(peer);
    }

    pub fn wifi_rem_connection(&self, peer: StationId) {
        self.wifi.link.rem_connection(peer);
    }
}
