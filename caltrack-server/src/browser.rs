//! Open the default browser on the local UI after startup

use std::time::Duration;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Delay before opening the browser, giving the listener time to come up
pub const OPEN_DELAY: Duration = Duration::from_secs(2);

/// Spawn a task that opens `url` in the default browser after `delay`
pub fn spawn_open_browser(url: String, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        match open_command(&url).status().await {
            Ok(status) if status.success() => info!("Opened browser at {}", url),
            Ok(status) => warn!("Browser launcher exited with {} for {}", status, url),
            Err(e) => warn!("Could not open browser at {}: {}", url, e),
        }
    })
}

/// Platform command that hands a URL to the default browser
fn open_command(url: &str) -> Command {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };
    command.arg(url);
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_last_argument() {
        let command = open_command("http://127.0.0.1:5000");
        let args: Vec<_> = command.as_std().get_args().collect();
        assert_eq!(args.last().and_then(|a| a.to_str()), Some("http://127.0.0.1:5000"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_uses_xdg_open() {
        let command = open_command("http://127.0.0.1:5000");
        assert_eq!(command.as_std().get_program(), "xdg-open");
    }
}
