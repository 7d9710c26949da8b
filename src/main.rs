mod app;
mod brew;
mod config;
mod input;
mod layout;
mod render;

use anyhow::Result;
use clap::Parser;
use config::Settings;

#[derive(Parser, Debug)]
#[command(name = "brewmatic", about = "A hot drinks machine for your terminal")]
struct Args {
    /// target frames per second
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// plain white-on-black output (no RGB colors)
    #[arg(long, default_value_t = false)]
    no_color: bool,

    /// blocky ASCII machine instead of braille pixels
    #[arg(long, default_value_t = false)]
    ascii: bool,

    /// seed for the steam animation
    #[arg(long, default_value_t = 0xC0FFEE)]
    seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    app::run(Settings {
        fps_cap: args.fps,
        enable_color: !args.no_color,
        enable_braille: !args.ascii,
        seed: args.seed,
    })
}
