use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    // log level for http tracing
    pub log_level: tracing::Level,
    // body limit for direct gateway uploads
    pub max_body_size: usize,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, log_level: tracing::Level, max_body_size: usize) -> Self {
        Self {
            listen_addr,
            log_level,
            max_body_size,
        }
    }
}
