// CLI entry point for the tether relay.
//
// Starts a standalone relay that sync clients connect to. The relay keeps
// room membership and forwards object frames — it holds no object state.
// See `server.rs` for the networking architecture and `room.rs` for the
// roster.
//
// Usage:
//   relay [OPTIONS]
//     --bind <ADDR>          Bind address (default: 0.0.0.0)
//     --port <PORT>          Listen port (default: 3000)
//     --max-clients <N>      Max simultaneous clients (default: 64)
//
// Diagnostics go through env_logger; set RUST_LOG=debug for frame-level
// detail.

use tether_relay::server::{RelayConfig, start_relay};

fn main() {
    env_logger::init();
    let config = parse_args();

    let (_handle, addr) = match start_relay(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to start relay: {e}");
            std::process::exit(1);
        }
    };

    println!("Relay listening on {addr}");
    println!("Press Ctrl+C to stop.");

    // The process exits on SIGINT/SIGTERM by default, which tears the
    // relay threads down with it; park the main thread until then.
    loop {
        std::thread::sleep(std::time::Duration::from_secs(3600));
    }
}

/// Parse command-line arguments into a `RelayConfig`. Uses simple
/// `std::env::args()` matching — no CLI crate dependency.
fn parse_args() -> RelayConfig {
    let mut config = RelayConfig::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                i += 1;
                config.bind = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--bind requires an address");
                    std::process::exit(1);
                });
            }
            "--port" => {
                i += 1;
                config.port = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--port requires a valid port number");
                    std::process::exit(1);
                });
            }
            "--max-clients" => {
                i += 1;
                config.max_clients =
                    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--max-clients requires a valid number");
                        std::process::exit(1);
                    });
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config
}

fn print_usage() {
    println!("Usage: relay [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --bind <ADDR>          Bind address (default: 0.0.0.0)");
    println!("  --port <PORT>          Listen port (default: 3000)");
    println!("  --max-clients <N>      Max simultaneous clients (default: 64)");
    println!("  --help, -h             Show this help");
}
