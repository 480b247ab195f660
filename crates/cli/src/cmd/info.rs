use anyhow::Result;

use bismuth_lib::platform::{TargetPlatform, Toolchain};

use crate::output::print_stat;

pub fn cmd_info() -> Result<()> {
  println!("System:");
  match TargetPlatform::current() {
    Some(host) => {
      print_stat("Platform", host.platform.as_str());
      print_stat("Arch", host.arch.as_str());
      print_stat("Triple", &host.triple());
    }
    None => println!("Could not detect platform."),
  }
  let toolchain = Toolchain::from_env()?.unwrap_or_else(Toolchain::host_default);
  print_stat("Toolchain", &format!("{} ({})", toolchain, toolchain.compiler()));
  Ok(())
}
