use crate::core::cycle_manager::ImmEventType;
use crate::core::emu::Emu;
use crate::logging::debug_println;
use std::fmt::{Debug, Formatter};
use std::mem;

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum InterruptFlag {
    LcdVBlank = 0,
    LcdHBlank = 1,
    LcdVCounterMatch = 2,
    Timer0Overflow = 3,
    Timer1Overflow = 4,
    Timer2Overflow = 5,
    Timer3Overflow = 6,
    Rtc = 7,
    Dma0 = 8,
    Dma1 = 9,
    Dma2 = 10,
    Dma3 = 11,
    Keypad = 12,
    GbaSlot = 13,
    Unused14 = 14,
    Unused15 = 15,
    IpcSync = 16,
    IpcSendFifoEmpty = 17,
    IpcRecvFifoNotEmpty = 18,
    NdsSlotTransferCompletion = 19,
    NdsSlotIreqMc = 20,
    GeometryCmdFifo = 21,
    ScreensUnfolding = 22,
    SpiBus = 23,
    Wifi = 24,
}

impl From<u8> for InterruptFlag {
    fn from(value: u8) -> Self {
        debug_assert!(value <= InterruptFlag::Wifi as u8);
        unsafe { mem::transmute(value) }
    }
}

pub struct InterruptFlags(pub u32);

impl Debug for InterruptFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug_set = f.debug_set();
        for i in 0..=InterruptFlag::Wifi as u8 {
            if self.0 & (1 << i) != 0 {
                let flag = InterruptFlag::from(i);
                debug_set.entry(&flag);
            }
        }
        debug_set.finish()
    }
}

/// Interrupt controller of the ARM7, the cpu the wifi block is wired to.
#[derive(Default)]
pub struct CpuRegs {
    pub ime: u8,
    pub ie: u32,
    pub irf: u32,
    halt: u8,
    pub interrupts_taken: u32,
}

impl CpuRegs {
    pub fn new() -> Self {
        CpuRegs::default()
    }
}

impl Emu {
    pub fn cpu_set_ime(&mut self, value: u8) {
        self.cpu.ime = value & 0x1;
        self.cpu_check_for_interrupt();
    }

    pub fn cpu_set_ie(&mut self, mut mask: u32, value: u32) {
        mask &= 0x01FF3FFF;
        let regs = &mut self.cpu;
        regs.ie = (regs.ie & !mask) | (value & mask);
        debug_println!("set ie {:x} {:?}", regs.ie, InterruptFlags(regs.ie));
        self.cpu_check_for_interrupt();
    }

    pub fn cpu_check_for_interrupt(&mut self) {
        if self.cpu.ime != 0 && (self.cpu.ie & self.cpu.irf) != 0 {
            self.cm.schedule_imm(ImmEventType::CpuInterrupt);
        }
    }

    pub fn cpu_set_irf(&mut self, mask: u32, value: u32) {
        debug_println!("set irf {:?}", InterruptFlags(value & mask));
        self.cpu.irf &= !(value & mask);
    }

    #[cfg(test)]
    pub(crate) fn cpu_halt(&mut self, bit: u8) {
        debug_println!("halt with bit {bit}");
        self.cpu.halt |= 1 << bit;
    }

    pub fn cpu_unhalt(&mut self, bit: u8) {
        debug_println!("unhalt with bit {bit}");
        self.cpu.halt &= !(1 << bit);
    }

    #[cfg(test)]
    pub(crate) fn cpu_is_halted(&self) -> bool {
        self.cpu.halt != 0
    }

    #[inline(never)]
    pub fn cpu_send_interrupt(&mut self, flag: InterruptFlag) {
        let regs = &mut self.cpu;
        regs.irf |= 1 << flag as u8;
        debug_println!("send interrupt {flag:?} {:?} {:?} {:x}", InterruptFlags(regs.ie), InterruptFlags(regs.irf), regs.ime);
        if (regs.ie & regs.irf) != 0 {
            if regs.ime != 0 {
                debug_println!("schedule send interrupt {flag:?}");
                self.cm.schedule_imm(ImmEventType::CpuInterrupt);
            } else {
                debug_println!("unhalt send interrupt {flag:?}");
                self.cpu_unhalt(0);
            }
        }
    }

    pub fn cpu_on_interrupt_event(&mut self) {
        let regs = &self.cpu;
        if regs.ime != 0 && (regs.ie & regs.irf) != 0 {
            debug_println!("interrupt {:?}", InterruptFlags(regs.ie & regs.irf));
            self.cpu.interrupts_taken += 1;
            self.cpu_unhalt(0);
        } else {
            debug_println!("can't interrupt {:x} {:?}", regs.ime, InterruptFlags(regs.ie & regs.irf));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::wifi_link::WifiHub;
    use crate::settings::DEFAULT_SETTINGS;

    #[test]
    fn interrupt_flags_debug_lists_set_bits() {
        let flags = InterruptFlags((1 << InterruptFlag::Wifi as u8) | (1 << InterruptFlag::Rtc as u8));
        assert_eq!(format!("{flags:?}"), "{Rtc, Wifi}");
    }

    #[test]
    fn wifi_interrupt_is_delivered_when_enabled() {
        let hub = WifiHub::new();
        let mut emu = Emu::new(&hub, DEFAULT_SETTINGS.clone());
        emu.cpu_set_ime(1);
        emu.cpu_set_ie(0xFFFFFFFF, 1 << InterruptFlag::Wifi as u8);
        emu.cpu_send_interrupt(InterruptFlag::Wifi);
        emu.cm_check_events();
        assert_eq!(emu.cpu.interrupts_taken, 1);

        emu.cpu_set_irf(0xFFFFFFFF, 1 << InterruptFlag::Wifi as u8);
        assert_eq!(emu.cpu.irf, 0);
    }

    #[test]
    fn pending_interrupt_wakes_halted_cpu() {
        let hub = WifiHub::new();
        let mut emu = Emu::new(&hub, DEFAULT_SETTINGS.clone());
        emu.cpu_set_ie(0xFFFFFFFF, 1 << InterruptFlag::Wifi as u8);
        emu.cpu_halt(0);
        assert!(emu.cpu_is_halted());
        emu.cpu_send_interrupt(InterruptFlag::Wifi);
        assert!(!emu.cpu_is_halted());
        emu.cm_check_events();
        assert_eq!(emu.cpu.interrupts_taken, 0);
    }
}
