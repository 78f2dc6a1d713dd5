use env_logger::{Builder, Env};
use log::LevelFilter;
use sysinfo::{get_current_pid, ProcessExt, System, SystemExt};

pub const LOG_ENV: &str = "CRIME_LOG";

pub fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the global logger. `CRIME_LOG` overrides the verbosity flag.
pub fn init_logging(verbose: u8) {
    let env = Env::new().filter(LOG_ENV);
    Builder::new()
        .filter(Some("crime_analytics"), level_for(verbose))
        .parse_env(env)
        .init();
}

/// Resident memory of this process in bytes, or 0 when it cannot be read.
pub fn monitor_memory() -> u64 {
    let pid = match get_current_pid() {
        Ok(pid) => pid,
        Err(_) => return 0,
    };
    let mut system = System::new();
    system.refresh_process(pid);
    system.process(pid).map(|p| p.memory()).unwrap_or(0)
}
