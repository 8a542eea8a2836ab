use std::env;
use std::path::PathBuf;

/// Point Windows builds at a vcpkg FFmpeg when `FFMPEG_DIR` is missing.
/// Other platforms rely on pkg-config through `ffmpeg-sys-next`.
fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let windows = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "windows");
    if !windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        println!(
            "cargo:warning=subgif needs FFmpeg with an H.264 or MPEG-4 encoder; set FFMPEG_DIR to its install prefix."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let prefix = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if prefix.join("include").join("libavcodec").is_dir() {
        println!(
            "cargo:warning=Using vcpkg FFmpeg found at {}; set FFMPEG_DIR to silence this.",
            prefix.display()
        );
    } else {
        println!(
            "cargo:warning=VCPKG_ROOT is set but {} holds no FFmpeg headers.",
            prefix.display()
        );
    }
}
