//! Command-line configuration for the server binary.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "xiangqi-server", about = "Authoritative Xiangqi game server")]
pub struct Config {
    /// Address and port to listen on.
    #[arg(long, env = "XIANGQI_BIND_ADDR", default_value = "0.0.0.0:8767")]
    pub bind_addr: String,
}
