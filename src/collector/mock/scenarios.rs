//! Pre-built mock filesystem scenarios for testing.

use super::filesystem::MockFs;

impl MockFs {
    /// A lightly loaded four-core machine with 16 GB of memory.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
",
        );
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );
        fs
    }

    /// A machine that has nearly run out of memory.
    pub fn memory_pressure_system() -> Self {
        let mut fs = Self::typical_system();
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:          100000 kB
MemAvailable:     327680 kB
Buffers:           10000 kB
Cached:           200000 kB
SwapTotal:       4096000 kB
SwapFree:         100000 kB
",
        );
        fs
    }
}

#[cfg(test)]
mod tests {
    use crate::collector::procfs::memory_percent;
    use crate::collector::procfs::parser::parse_meminfo;
    use crate::collector::FileSystem;
    use crate::collector::mock::MockFs;
    use std::path::Path;

    fn memory_of(fs: &MockFs) -> f64 {
        let content = fs.read_to_string(Path::new("/proc/meminfo")).unwrap();
        memory_percent(&parse_meminfo(&content).unwrap())
    }

    #[test]
    fn test_scenarios_memory_levels() {
        assert_eq!(memory_of(&MockFs::typical_system()), 26.8);
        assert_eq!(memory_of(&MockFs::memory_pressure_system()), 98.0);
    }
}
