mod config;
mod world;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use config::ServerConfig;
use tether::{listen, TransportKind};
use world::World;

#[derive(Parser)]
#[command(name = "tether-server")]
#[command(about = "Replication server")]
struct Args {
    #[arg(short, long, default_value_t = tether::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value_t = 30)]
    tick_rate: u32,

    #[arg(long, help = "Exit after this many seconds (runs forever by default)")]
    run_secs: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        port: args.port,
        tick_rate: args.tick_rate,
    };

    let listener = listen(TransportKind::Tcp, config.port)
        .with_context(|| format!("failed to listen on port {}", config.port))?;
    let server = tether::ReplicationServer::new(listener);
    let mut world = World::new(server);

    log::info!("server listening on port {}", config.port);

    let tick_duration = Duration::from_secs_f64(1.0 / config.tick_rate as f64);
    let dt = tick_duration.as_secs_f32();
    let started = Instant::now();
    let mut last_report = Instant::now();

    loop {
        let tick_start = Instant::now();
        world.tick(dt);

        if last_report.elapsed() >= Duration::from_secs(5) {
            let stats = world.stats();
            log::info!(
                "{} client(s), tx {} B/s, rx {} B/s",
                world.client_count(),
                stats.bytes_out_per_sec(),
                stats.bytes_in_per_sec()
            );
            last_report = Instant::now();
        }

        if let Some(limit) = args.run_secs {
            if started.elapsed() >= Duration::from_secs(limit) {
                log::info!("run time limit reached, shutting down");
                break;
            }
        }

        if let Some(remaining) = tick_duration.checked_sub(tick_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    Ok(())
}
