use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("gimbalctl {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: gimbalctl");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("GIMBALCTL_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("transport: udp");
    println!(
        "frame_limits: dynamic_payload={} legacy_text={}",
        gimbalctl_frame::MAX_DYNAMIC_PAYLOAD,
        gimbalctl_frame::MAX_LEGACY_TEXT
    );

    Ok(SUCCESS)
}
