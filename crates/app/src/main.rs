//! Entry point for DiscoParty.
//! Logging + command-line flags, then hands off to the platform loop.

use std::path::PathBuf;

use anyhow::Result;
use platform::WindowConfig;
use renderer::RenderConfig;

fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{}', falling back to auto.", other);
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_flag(args: &[String], name: &str) -> bool {
    // --name[=on|off], default off
    for arg in args {
        if arg == name {
            return true;
        }
        if let Some(val) = arg.strip_prefix(name).and_then(|v| v.strip_prefix('=')) {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_assets_arg(args: &[String]) -> PathBuf {
    args.iter()
        .rev()
        .find_map(|arg| arg.strip_prefix("--assets="))
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets"))
}

fn parse_size_args(args: &[String]) -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                } else {
                    log::warn!("Ignoring malformed --size='{}'", v);
                }
            } else {
                log::warn!("Ignoring --size='{}' (expected WIDTHxHEIGHT)", v);
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            match v.parse::<u32>() {
                Ok(pw) => w = Some(pw),
                Err(_) => log::warn!("Ignoring malformed --width='{}'", v),
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            match v.parse::<u32>() {
                Ok(ph) => h = Some(ph),
                Err(_) => log::warn!("Ignoring malformed --height='{}'", v),
            }
        }
    }

    let ww = w.unwrap_or(1024).max(1);
    let hh = h.unwrap_or(768).max(1);
    (ww, hh)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let backends = parse_backend_arg(&args);
    let (width, height) = parse_size_args(&args);
    let assets_dir = parse_assets_arg(&args);
    let fallback_textures = parse_flag(&args, "--fallback-textures");
    log::info!(
        "Starting DiscoParty. Backend: {:?}, window_size={}x{}, assets={:?}, fallback_textures={}",
        backends,
        width,
        height,
        assets_dir,
        fallback_textures
    );

    let window_config = WindowConfig {
        width,
        height,
        ..WindowConfig::default()
    };
    let render_config = RenderConfig {
        backends,
        assets_dir,
        fallback_textures,
    };
    platform::run_with_renderer(window_config, render_config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
