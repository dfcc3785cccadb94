use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use tether::sample::sample_registry;
use tether::{connect, Buttons, NetEvent, ReplicationClient, TransportKind};

#[derive(Parser)]
#[command(name = "tether-client")]
#[command(about = "Replication client")]
struct Args {
    #[arg(short, long, default_value = tether::LOCALHOST)]
    address: String,

    #[arg(short, long, default_value_t = tether::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value_t = 30)]
    tick_rate: u32,

    #[arg(long, help = "Request shutdown after this many seconds")]
    quit_after: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let socket = connect(TransportKind::Tcp, args.port, &args.address)
        .with_context(|| format!("failed to connect to {}:{}", args.address, args.port))?;
    let mut client = ReplicationClient::new(socket, sample_registry());

    log::info!("connected to {}:{}", args.address, args.port);

    let tick_duration = Duration::from_secs_f64(1.0 / args.tick_rate as f64);
    let started = Instant::now();
    let mut last_ping = Instant::now();
    let mut tick: u64 = 0;

    loop {
        let tick_start = Instant::now();
        tick += 1;

        // Scripted input: steady forward motion, a chat ping every 2 seconds.
        client.push_event(NetEvent::Input {
            buttons: Buttons::FORWARD,
            axis_x: 0.0,
            axis_y: 0.0,
        });
        if last_ping.elapsed() >= Duration::from_secs(2) {
            client.push_event(NetEvent::Text(format!("ping at tick {tick}")));
            last_ping = Instant::now();
        }

        if let Some(limit) = args.quit_after {
            if started.elapsed() >= Duration::from_secs(limit) {
                client.push_event(NetEvent::Quit);
            }
        }

        client.sync();

        for (object_id, _object) in client.take_spawned() {
            log::info!("object {object_id:#x} entered the replicated set");
        }
        for object_id in client.take_despawned() {
            log::info!("object {object_id:#x} left the replicated set");
        }

        if client.quit_requested() {
            log::info!("local quit, closing");
            break;
        }
        if !client.is_connected() {
            log::info!("server gone, closing");
            break;
        }

        if let Some(remaining) = tick_duration.checked_sub(tick_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    Ok(())
}
