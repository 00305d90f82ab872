use anyhow::Result;
use seashell::{Config, Shell};

fn main() -> Result<()> {
    let config = Config::from_env();
    env_logger::Builder::new()
        .parse_filters(&config.log_filter)
        .init();
    Shell::new(config).run()
}
