//! Runs the server binary as a child process against a scratch database.

use reqwest::Client;
use std::net::{Ipv4Addr, TcpListener};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, timeout};

pub struct ServerProcess {
    pub base_url: String,
    child: Child,
    _data_dir: TempDir,
}

impl ServerProcess {
    pub async fn start(app_env: &str, allow_production_writes: Option<&str>) -> Self {
        let port = free_port();
        let data_dir = tempfile::tempdir().expect("scratch data dir");

        let mut command = Command::new(env!("CARGO_BIN_EXE_toddler_activities"));
        command
            .env("PORT", port.to_string())
            .env("APP_DATABASE_PATH", data_dir.path().join("activities.db"))
            .env("APP_ENV", app_env)
            .env_remove("ALLOW_PRODUCTION_WRITES")
            .env("RUST_LOG", "info")
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(value) = allow_production_writes {
            command.env("ALLOW_PRODUCTION_WRITES", value);
        }

        let server = Self {
            base_url: format!("http://127.0.0.1:{port}"),
            child: command.spawn().expect("spawn server binary"),
            _data_dir: data_dir,
        };
        server.wait_ready().await;
        server
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    async fn wait_ready(&self) {
        let client = Client::new();
        let url = format!("{}/env-check", self.base_url);
        let poll = async {
            loop {
                let up = client
                    .get(&url)
                    .send()
                    .await
                    .is_ok_and(|resp| resp.status().is_success());
                if up {
                    return;
                }
                sleep(Duration::from_millis(100)).await;
            }
        };
        timeout(Duration::from_secs(5), poll)
            .await
            .expect("server did not become ready");
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_port() -> u16 {
    TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("free local port")
}

/// Sends SIGTERM to `pid` when the test binary exits. Only the first call
/// registers; later pids are left to their `Drop`.
#[cfg(unix)]
pub fn terminate_at_exit(pid: u32) {
    use std::sync::OnceLock;

    static PID: OnceLock<libc::pid_t> = OnceLock::new();

    extern "C" fn terminate() {
        if let Some(&pid) = PID.get() {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }

    if PID.set(pid as libc::pid_t).is_ok() {
        unsafe {
            libc::atexit(terminate);
        }
    }
}
