//! `fifu stop` – ask the running download to stop.

use anyhow::Result;

#[cfg(unix)]
pub async fn run_stop() -> Result<()> {
    let path = fifu_core::control::default_control_socket_path()?;
    if crate::cli::control_socket::send_stop(&path).await? {
        println!("Stop requested.");
    } else {
        println!("No download run in progress.");
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn run_stop() -> Result<()> {
    anyhow::bail!("fifu stop needs unix sockets; press Ctrl-C in the running terminal instead")
}
