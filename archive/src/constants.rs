use bincode::config::Config;

// Fixed-width integers keep the buffer's encoded size independent of its contents
pub fn bincode_config() -> impl Config {
    bincode::config::legacy()
}
