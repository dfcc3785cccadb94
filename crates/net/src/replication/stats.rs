use std::time::{Duration, Instant};

const REFRESH_INTERVAL: Duration = Duration::from_millis(1000);

/// Read/write throughput of an endpoint, refreshed once per second from
/// accumulators that reset each interval.
#[derive(Debug)]
pub struct NetStats {
    bytes_out_per_sec: u64,
    bytes_in_per_sec: u64,
    acc_out: u64,
    acc_in: u64,
    last_refresh: Instant,
}

impl NetStats {
    pub fn new() -> Self {
        Self {
            bytes_out_per_sec: 0,
            bytes_in_per_sec: 0,
            acc_out: 0,
            acc_in: 0,
            last_refresh: Instant::now(),
        }
    }

    pub fn add_out(&mut self, bytes: usize) {
        self.acc_out += bytes as u64;
    }

    pub fn add_in(&mut self, bytes: usize) {
        self.acc_in += bytes as u64;
    }

    /// Rolls the accumulators into per-second rates once the interval has
    /// elapsed; a no-op in between.
    pub fn refresh(&mut self) {
        let elapsed = self.last_refresh.elapsed();
        if elapsed < REFRESH_INTERVAL {
            return;
        }
        let secs = elapsed.as_secs_f64();
        self.bytes_out_per_sec = (self.acc_out as f64 / secs) as u64;
        self.bytes_in_per_sec = (self.acc_in as f64 / secs) as u64;
        self.acc_out = 0;
        self.acc_in = 0;
        self.last_refresh = Instant::now();
    }

    pub fn bytes_out_per_sec(&self) -> u64 {
        self.bytes_out_per_sec
    }

    pub fn bytes_in_per_sec(&self) -> u64 {
        self.bytes_in_per_sec
    }
}

impl Default for NetStats {
    fn default() -> Self {
        Self::new()
    }
}
