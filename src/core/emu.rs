use crate::core::cpu_regs::CpuRegs;
use crate::core::cycle_manager::CycleManager;
use crate::core::memory::wifi::WifiRam;
use crate::core::wifi::{Wifi, TICK_CYCLES};
use crate::core::wifi_link::WifiHub;
use crate::logging::debug_println;
use crate::settings::Settings;
use std::cmp::min;
use std::sync::Arc;

pub struct Emu {
    pub cm: CycleManager,
    pub cpu: CpuRegs,
    pub wifi: Wifi,
    pub wifi_ram: WifiRam,
    pub settings: Settings,
}

impl Emu {
    pub fn new(hub: &Arc<WifiHub>, settings: Settings) -> Self {
        Emu {
            cm: CycleManager::new(),
            cpu: CpuRegs::new(),
            wifi: Wifi::new(hub),
            wifi_ram: WifiRam::new(),
            settings,
        }
    }

    /// Connects to every other console on the hub, if local wireless is enabled.
    pub fn wifi_join(&self) -> usize {
        if !self.settings.local_wireless() {
            debug_println!("local wireless disabled, staying offline");
            return 0;
        }

        let own_id = self.wifi_station_id();
        let mut joined = 0;
        for id in self.wifi.link.hub().station_ids() {
            if id != own_id {
                self.wifi_add_connection(id);
                joined += 1;
            }
        }
        joined
    }

    pub fn run_cycles(&mut self, cycles: u32) {
        let mut remaining = cycles;
        while remaining > 0 {
            if self.wifi_should_schedule() {
                self.wifi_schedule_init();
            }

            let step = min(self.cm.cycles_until_next_event().max(1), remaining);
            self.cm.add_cycles(step);
            self.cm_check_events();
            remaining -= step;
        }
    }

    pub fn run_ticks(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.run_cycles(TICK_CYCLES);
        }
    }
}
