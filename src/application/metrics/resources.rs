//! Process resource sampling port
//!
//! The production implementation is
//! [`SysinfoSampler`](crate::infrastructure::resources::SysinfoSampler).

/// Source of process CPU and resident-memory readings.
pub trait ResourceSampler: Send {
    /// CPU used by this process since the previous call, in percent of a
    /// single core (may exceed 100 on multi-core hosts).
    fn cpu_percent(&mut self) -> f64;

    /// Resident set size in bytes.
    fn memory_bytes(&mut self) -> u64;

    /// Logical core count used to normalise [`cpu_percent`](Self::cpu_percent).
    fn core_count(&self) -> usize {
        num_cpus::get()
    }
}

/// Sampler that always reports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSampler;

impl ResourceSampler for NullSampler {
    fn cpu_percent(&mut self) -> f64 {
        0.0
    }

    fn memory_bytes(&mut self) -> u64 {
        0
    }

    fn core_count(&self) -> usize {
        1
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedSampler {
    pub cpu: f64,
    pub memory: u64,
    pub cores: usize,
}

#[cfg(test)]
impl ResourceSampler for FixedSampler {
    fn cpu_percent(&mut self) -> f64 {
        self.cpu
    }

    fn memory_bytes(&mut self) -> u64 {
        self.memory
    }

    fn core_count(&self) -> usize {
        self.cores
    }
}
