use vidlink_frame::{CHUNK_SIZE, MAX_FRAME_LEN};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("vidlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: vidlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("VIDLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("VIDLINK_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("max_frame_bytes: {MAX_FRAME_LEN}");
    println!("io_chunk_bytes: {CHUNK_SIZE}");

    Ok(SUCCESS)
}
