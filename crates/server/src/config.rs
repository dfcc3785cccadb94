#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub tick_rate: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: tether::DEFAULT_PORT,
            tick_rate: 30,
        }
    }
}
