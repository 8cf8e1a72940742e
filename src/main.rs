use dswifi::core::cpu_regs::InterruptFlag;
use dswifi::core::emu::Emu;
use dswifi::core::memory::regions::{WIFI_IO_OFFSET2, WIFI_RAM_OFFSET};
use dswifi::core::wifi::{WifiIrq, TX_HEADER_SIZE};
use dswifi::core::wifi_link::WifiHub;
use dswifi::settings::{Settings, SettingsConfig, DEFAULT_SETTINGS};
use dswifi::IS_DEBUG;
use std::env;
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;

const SESSION_TICKS: u32 = 1000;
const BEACON_ADDR: u16 = 0x0400;
const BEACON_LEN: u16 = 40;
const RX_BEGIN: u16 = 0x1000;
const RX_END: u16 = 0x2000;

fn io_write(emu: &mut Emu, offset: u32, value: u16) {
    emu.wifi_bus_write16(WIFI_IO_OFFSET2 + offset, value);
}

fn io_read(emu: &mut Emu, offset: u32) -> u16 {
    emu.wifi_bus_read16(WIFI_IO_OFFSET2 + offset)
}

fn beacon_frame(mac: [u16; 3], interval: u16) -> Vec<u16> {
    let mut frame = vec![0, 0, 0, 0, 0x14, BEACON_LEN];
    // frame control, duration, destination
    frame.extend([0x0080, 0x0000, 0xFFFF, 0xFFFF, 0xFFFF]);
    // source, bssid, sequence
    frame.extend(mac);
    frame.extend(mac);
    frame.push(0);
    // timestamp, interval, capabilities
    frame.extend([0; 4]);
    frame.extend([interval, 0x0021]);
    frame.resize((TX_HEADER_SIZE + BEACON_LEN as usize) / 2, 0);
    frame
}

fn setup_console(emu: &mut Emu, index: usize) {
    let mac = [0x0900, 0x00BF, (index as u16) << 8];
    for (i, value) in mac.iter().enumerate() {
        io_write(emu, 0x018 + i as u32 * 2, *value);
    }

    let interval = emu.settings.beacon_interval().tu();
    for (i, value) in beacon_frame(mac, interval).into_iter().enumerate() {
        emu.wifi_bus_write16(WIFI_RAM_OFFSET + BEACON_ADDR as u32 + i as u32 * 2, value);
    }
    io_write(emu, 0x080, 0x8000 | (BEACON_ADDR >> 1));
    io_write(emu, 0x08C, interval);

    io_write(emu, 0x050, RX_BEGIN);
    io_write(emu, 0x052, RX_END);
    io_write(emu, 0x056, RX_BEGIN >> 1);
    io_write(emu, 0x030, 0x8001);

    io_write(emu, 0x012, WifiIrq::RxComplete.bit() | WifiIrq::Beacon.bit());
    emu.cpu_set_ime(1);
    emu.cpu_set_ie(0xFFFFFFFF, 1 << InterruptFlag::Wifi as u8);

    io_write(emu, 0x0E8, 1);
}

fn run_console(emu: &mut Emu, ticks: u32) {
    for _ in 0..ticks {
        emu.run_ticks(1);
        let irf = io_read(emu, 0x010);
        if irf != 0 {
            io_write(emu, 0x010, irf);
            emu.cpu_set_irf(0xFFFFFFFF, 1 << InterruptFlag::Wifi as u8);
        }
    }
}

fn load_settings() -> Settings {
    match env::args().nth(1) {
        Some(path) => SettingsConfig::new(PathBuf::from(path)).settings,
        None => DEFAULT_SETTINGS.clone(),
    }
}

pub fn main() {
    if IS_DEBUG {
        env::set_var("RUST_BACKTRACE", "full");
    }

    let settings = load_settings();
    for setting in settings.get_all() {
        println!("{}: {} ({})", setting.title, setting.value, setting.description);
    }

    let consoles = settings.session_size().consoles();
    let hub = WifiHub::new();
    let barrier = Arc::new(Barrier::new(consoles));

    let handles: Vec<_> = (0..consoles)
        .map(|i| {
            let hub = hub.clone();
            let barrier = barrier.clone();
            let settings = settings.clone();
            thread::Builder::new()
                .name(format!("console {i}"))
                .spawn(move || {
                    let mut emu = Emu::new(&hub, settings);
                    setup_console(&mut emu, i);

                    barrier.wait();
                    let peers = emu.wifi_join();
                    barrier.wait();

                    run_console(&mut emu, SESSION_TICKS);
                    barrier.wait();
                    run_console(&mut emu, 1);

                    println!(
                        "console {i}: {peers} peers, sent {} beacons, received {} frames, {} interrupts",
                        emu.wifi.tx_frames, emu.wifi.rx_frames, emu.cpu.interrupts_taken
                    );
                })
                .unwrap()
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
