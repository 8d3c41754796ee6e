//! `sysinfo`-backed process resource sampler

use sysinfo::{Pid, ProcessExt, System, SystemExt};
use tracing::warn;

use crate::application::metrics::ResourceSampler;

pub struct SysinfoSampler {
    system: System,
    pid: Option<Pid>,
    cores: usize,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("Process resource sampling disabled: {}", e);
                None
            }
        };
        let mut system = System::new();
        if let Some(pid) = pid {
            // Establish the CPU baseline for the first reading.
            system.refresh_process(pid);
        }
        Self {
            system,
            pid,
            cores: num_cpus::get().max(1),
        }
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSampler for SysinfoSampler {
    fn cpu_percent(&mut self) -> f64 {
        let Some(pid) = self.pid else { return 0.0 };
        if !self.system.refresh_process(pid) {
            return 0.0;
        }
        self.system
            .process(pid)
            .map(|p| p.cpu_usage() as f64)
            .unwrap_or(0.0)
    }

    fn memory_bytes(&mut self) -> u64 {
        let Some(pid) = self.pid else { return 0 };
        self.system.refresh_process(pid);
        self.system.process(pid).map(|p| p.memory()).unwrap_or(0)
    }

    fn core_count(&self) -> usize {
        self.cores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_own_process() {
        let mut sampler = SysinfoSampler::new();
        assert!(sampler.core_count() >= 1);
        assert!(sampler.cpu_percent() >= 0.0);
        assert!(sampler.memory_bytes() > 0);
    }
}
