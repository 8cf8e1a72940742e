macro_rules! debug_println {
    ($($args:tt)*) => {
        if crate::DEBUG_LOG {
            let log = format!($($args)*);
            let current_thread = std::thread::current();
            let thread_name = current_thread.name().unwrap_or("unnamed");
            let now = chrono::Local::now();
            println!("[{}][{}] {}", now.format("%H:%M:%S%.3f"), thread_name, log);
        }
    };
}
pub(crate) use debug_println;
