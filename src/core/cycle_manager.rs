use crate::core::cycle_manager::EventType::Overflow;
use crate::core::cycle_manager::ImmEventType::CpuInterrupt;
use crate::core::emu::Emu;
use std::cmp::max;

#[repr(u8)]
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum ImmEventType {
    CpuInterrupt = 0,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum EventType {
    WifiCountMs = 0,
    Overflow = 1,
}

pub struct CycleManager {
    cycle_count: u32,
    events: [u32; Overflow as usize + 1],
    next_event_cycle: u32,
    active_events: u32,
    active_imm_events: u32,
}

impl CycleManager {
    pub fn new() -> Self {
        let mut cm = CycleManager {
            cycle_count: 0,
            events: [0; Overflow as usize + 1],
            next_event_cycle: u32::MAX,
            active_events: 0,
            active_imm_events: 0,
        };
        cm.schedule(0x7FFFFFFF, Overflow);
        cm
    }

    pub fn add_cycles(&mut self, cycle_count: u32) {
        self.cycle_count += cycle_count;
    }

    pub fn get_cycles(&self) -> u32 {
        self.cycle_count
    }

    #[cfg(test)]
    pub(crate) fn is_scheduled(&self, event_type: EventType) -> bool {
        self.active_events & (1 << (31 - event_type as u8)) != 0
    }

    pub fn cycles_until_next_event(&self) -> u32 {
        self.next_event_cycle.saturating_sub(self.cycle_count)
    }

    pub fn schedule_imm(&mut self, event_type: ImmEventType) {
        self.active_imm_events |= 1 << (31 - event_type as u8);
    }

    pub fn schedule(&mut self, in_cycles: u32, event_type: EventType) {
        let mut in_cycles = max(in_cycles, 1);
        if u32::MAX - in_cycles < self.cycle_count {
            in_cycles = u32::MAX - self.cycle_count;
        }
        let event_cycle = self.cycle_count + in_cycles;
        self.events[event_type as usize] = event_cycle;
        self.active_events |= 1 << (31 - event_type as u8);
        if event_cycle < self.next_event_cycle {
            self.next_event_cycle = event_cycle;
        }
    }
}

impl Default for CycleManager {
    fn default() -> Self {
        CycleManager::new()
    }
}

impl Emu {
    pub fn cm_check_events(&mut self) -> bool {
        const IMM_LUT: [fn(&mut Emu); CpuInterrupt as usize + 1] = [Emu::cpu_on_interrupt_event];

        const LUT: [fn(&mut Emu); Overflow as usize + 1] = [Emu::wifi_count_ms, Emu::cm_on_overflow_event];

        let mut active_imm_events = self.cm.active_imm_events;
        self.cm.active_imm_events = 0;
        let mut offset = 0;
        while active_imm_events != 0 {
            let zeros = active_imm_events.leading_zeros();
            let event_index = (zeros + offset) as usize;

            IMM_LUT[event_index](self);

            active_imm_events = active_imm_events.checked_shl(zeros + 1).unwrap_or(0);
            offset += zeros + 1;
        }

        if self.cm.cycle_count < self.cm.next_event_cycle {
            return false;
        }

        let mut active_events = self.cm.active_events;
        self.cm.next_event_cycle = u32::MAX;
        let mut offset = 0;

        while active_events != 0 {
            let zeros = active_events.leading_zeros();
            let event_index = (zeros + offset) as usize;

            let event_cycle = self.cm.events[event_index];
            if event_cycle <= self.cm.cycle_count {
                self.cm.active_events &= !(1 << (31 - event_index));
                LUT[event_index](self);
            } else if event_cycle < self.cm.next_event_cycle {
                self.cm.next_event_cycle = event_cycle;
            }

            active_events = active_events.checked_shl(zeros + 1).unwrap_or(0);
            offset += zeros + 1;
        }
        true
    }

    fn cm_on_overflow_event(&mut self) {
        for i in 0..self.cm.events.len() {
            if self.cm.active_events & (1 << (31 - i)) != 0 {
                self.cm.events[i] -= self.cm.cycle_count;
            }
        }
        self.cm.next_event_cycle = self.cm.next_event_cycle.saturating_sub(self.cm.cycle_count);
        self.cm.cycle_count = 0;
        self.cm.schedule(0x7FFFFFFF, Overflow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::wifi_link::WifiHub;
    use crate::settings::DEFAULT_SETTINGS;

    #[test]
    fn schedule_clamps_to_at_least_one_cycle() {
        let mut cm = CycleManager::new();
        cm.schedule(0, EventType::WifiCountMs);
        assert_eq!(cm.cycles_until_next_event(), 1);
        assert!(cm.is_scheduled(EventType::WifiCountMs));
    }

    #[test]
    fn events_fire_once_their_cycle_is_reached() {
        let hub = WifiHub::new();
        let mut emu = Emu::new(&hub, DEFAULT_SETTINGS.clone());
        emu.wifi_schedule_init();
        assert!(emu.cm.is_scheduled(EventType::WifiCountMs));

        let until = emu.cm.cycles_until_next_event();
        emu.cm.add_cycles(until - 1);
        assert!(!emu.cm_check_events());
        assert!(emu.cm.is_scheduled(EventType::WifiCountMs));

        emu.cm.add_cycles(1);
        assert!(emu.cm_check_events());
        assert!(!emu.cm.is_scheduled(EventType::WifiCountMs));
        assert!(emu.cm.is_scheduled(Overflow));
    }

    #[test]
    fn overflow_rebases_pending_events() {
        let hub = WifiHub::new();
        let mut emu = Emu::new(&hub, DEFAULT_SETTINGS.clone());
        emu.cm.add_cycles(0x7FFFFFFF - 10);
        emu.cm.schedule(100, EventType::WifiCountMs);
        emu.cm.add_cycles(10);
        assert!(emu.cm_check_events());
        assert_eq!(emu.cm.get_cycles(), 0);
        assert_eq!(emu.cm.cycles_until_next_event(), 90);
    }
}
